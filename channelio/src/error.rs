use core::fmt;

/// Terminal error of a [`Scope`](crate::Scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeError {
    /// The scope, or one of its ancestors, was cancelled explicitly.
    Canceled,
    /// The scope's deadline, or one inherited from an ancestor, has passed.
    DeadlineExceeded,
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::Canceled => write!(f, "scope canceled"),
            ScopeError::DeadlineExceeded => write!(f, "scope deadline exceeded"),
        }
    }
}

impl std::error::Error for ScopeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Canceled,
    DeadlineExceeded,
    Capability,
}

/// Why a pump stopped.
///
/// Pumps have no success outcome: they run until their scope is done or the
/// capability they drive fails. Capability errors are carried as-is.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// The scope became done first.
    Scope(ScopeError),
    /// `emit` or `receive` failed.
    Capability(E),
}

impl<E> Error<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Scope(ScopeError::Canceled) => ErrorKind::Canceled,
            Error::Scope(ScopeError::DeadlineExceeded) => ErrorKind::DeadlineExceeded,
            Error::Capability(_) => ErrorKind::Capability,
        }
    }

    /// Returns true if the pump stopped because its scope was done.
    pub fn is_scope(&self) -> bool {
        matches!(self, Error::Scope(_))
    }

    pub fn scope_error(&self) -> Option<ScopeError> {
        match self {
            Error::Scope(cause) => Some(*cause),
            Error::Capability(_) => None,
        }
    }

    /// Unwraps the capability error, if that is what stopped the pump.
    pub fn into_capability(self) -> Option<E> {
        match self {
            Error::Capability(err) => Some(err),
            Error::Scope(_) => None,
        }
    }

    pub fn map_capability<F, T>(self, f: F) -> Error<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            Error::Scope(cause) => Error::Scope(cause),
            Error::Capability(err) => Error::Capability(f(err)),
        }
    }
}

impl<E> From<ScopeError> for Error<E> {
    fn from(cause: ScopeError) -> Self {
        Error::Scope(cause)
    }
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Scope(cause) => write!(f, "{}", cause),
            Error::Capability(err) => write!(f, "{}", err),
        }
    }
}

impl<E> std::error::Error for Error<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Scope(cause) => Some(cause),
            Error::Capability(err) => Some(err),
        }
    }
}

/// Collapses a pump error into an `std::io::Error`, keeping the scope cause
/// distinguishable by kind.
impl From<Error<std::io::Error>> for std::io::Error {
    fn from(err: Error<std::io::Error>) -> std::io::Error {
        match err {
            Error::Scope(ScopeError::Canceled) => {
                std::io::Error::new(std::io::ErrorKind::Interrupted, ScopeError::Canceled)
            }
            Error::Scope(ScopeError::DeadlineExceeded) => {
                std::io::Error::new(std::io::ErrorKind::TimedOut, ScopeError::DeadlineExceeded)
            }
            Error::Capability(err) => err,
        }
    }
}
