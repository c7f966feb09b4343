//! Cancellation scopes.
//!
//! A [`Scope`] is a one-shot done-signal with a terminal error. Scopes form a
//! tree: a child becomes done when it is cancelled itself, when its deadline
//! passes, or when any ancestor becomes done. Cancelling a child never
//! affects its parent.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ScopeError;

/// Shared cancellation scope.
///
/// Clones observe the same signal.
#[derive(Debug, Clone)]
pub struct Scope {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    token: CancellationToken,
    cause: OnceLock<ScopeError>,
    /// Earliest deadline along the ancestor chain.
    deadline: Option<Instant>,
    parent: Option<Scope>,
}

impl Scope {
    /// Creates a root scope that is done only once cancelled.
    pub fn new() -> Self {
        Scope {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                cause: OnceLock::new(),
                deadline: None,
                parent: None,
            }),
        }
    }

    fn derive(&self, deadline: Option<Instant>) -> Scope {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(inherited), Some(own)) => Some(inherited.min(own)),
            (inherited, own) => inherited.or(own),
        };

        Scope {
            inner: Arc::new(Inner {
                token: self.inner.token.child_token(),
                cause: OnceLock::new(),
                deadline,
                parent: Some(self.clone()),
            }),
        }
    }

    /// Derives a child scope that can be cancelled independently.
    pub fn child(&self) -> Scope {
        self.derive(None)
    }

    /// Derives a child scope that is done at `deadline` at the latest.
    pub fn with_deadline(&self, deadline: Instant) -> Scope {
        self.derive(Some(deadline))
    }

    /// Derives a child scope that is done after `timeout` at the latest.
    pub fn with_timeout(&self, timeout: Duration) -> Scope {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns the effective deadline, inherited ones included.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Cancels this scope and all of its descendants.
    ///
    /// Idempotent. A scope that is already done keeps its first cause.
    pub fn cancel(&self) {
        self.finish(ScopeError::Canceled);
    }

    fn finish(&self, cause: ScopeError) {
        let cause = self.err().unwrap_or(cause);
        let _ = self.inner.cause.set(cause);
        self.inner.token.cancel();
    }

    /// Returns the terminal error once the scope is done, `None` before.
    pub fn err(&self) -> Option<ScopeError> {
        if let Some(cause) = self.inner.cause.get() {
            return Some(*cause);
        }

        if self.inner.token.is_cancelled() {
            // Either our own cause landed concurrently, or an ancestor did it.
            let cause = self
                .inner
                .cause
                .get()
                .copied()
                .or_else(|| self.inner.parent.as_ref().and_then(Scope::err))
                .unwrap_or(ScopeError::Canceled);
            return Some(cause);
        }

        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ScopeError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Waits until the scope is done.
    ///
    /// Cancel safe. Any number of tasks may wait concurrently.
    pub async fn done(&self) {
        match self.inner.deadline {
            None => self.inner.token.cancelled().await,
            Some(deadline) => {
                tokio::select! {
                    _ = self.inner.token.cancelled() => {}
                    _ = time::sleep_until(deadline) => self.finish(ScopeError::DeadlineExceeded),
                }
            }
        }
    }

    /// Waits until the scope is done and returns its terminal error.
    pub async fn done_err(&self) -> ScopeError {
        self.done().await;
        self.err().unwrap_or(ScopeError::Canceled)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_scope_is_live() {
        let scope = Scope::new();
        assert!(!scope.is_done());
        assert_eq!(scope.err(), None);
        assert_eq!(scope.deadline(), None);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let scope = Scope::new();
        scope.cancel();
        scope.cancel();
        scope.done().await;
        assert_eq!(scope.err(), Some(ScopeError::Canceled));
    }

    #[tokio::test]
    async fn test_clones_share_signal() {
        let scope = Scope::new();
        let waiter = scope.clone();
        let handle = tokio::spawn(async move { waiter.done_err().await });

        scope.cancel();
        assert_eq!(handle.await.unwrap(), ScopeError::Canceled);
    }

    #[test]
    fn test_child_does_not_cancel_parent() {
        let parent = Scope::new();
        let child = parent.child();

        child.cancel();
        assert_eq!(child.err(), Some(ScopeError::Canceled));
        assert!(!parent.is_done());
    }

    #[test]
    fn test_parent_cancels_descendants() {
        let parent = Scope::new();
        let child = parent.child();
        let grandchild = child.child();

        parent.cancel();
        assert_eq!(child.err(), Some(ScopeError::Canceled));
        assert_eq!(grandchild.err(), Some(ScopeError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let scope = Scope::new().with_timeout(Duration::from_secs(5));
        assert!(!scope.is_done());

        scope.done().await;
        assert_eq!(scope.err(), Some(ScopeError::DeadlineExceeded));

        // The deadline already fired: a late cancel keeps the first cause.
        scope.cancel();
        assert_eq!(scope.err(), Some(ScopeError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_inherits_deadline() {
        let parent = Scope::new().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let grandchild = child.child();
        assert_eq!(grandchild.done_err().await, ScopeError::DeadlineExceeded);
        assert_eq!(child.err(), Some(ScopeError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_deadline_reaches_waiting_child() {
        let parent = Scope::new().with_timeout(Duration::from_secs(1));
        let child = parent.child();

        parent.done().await;
        assert_eq!(child.err(), Some(ScopeError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_deadline() {
        let scope = Scope::new().with_timeout(Duration::from_secs(10));
        scope.cancel();
        assert_eq!(scope.done_err().await, ScopeError::Canceled);
    }
}
