use std::panic;
use std::sync::Arc;

use log::{debug, trace};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::{run_emitter, run_receiver};
use crate::capability::Transmitter;
use crate::error::{Error, ScopeError};
use crate::scope::Scope;

/// Combines [`run_emitter`] and [`run_receiver`] over one transmitter.
///
/// Both pumps run as separate tasks under a child of `scope`. The call
/// returns the outcome of whichever pump stops first:
/// - `scope` is done, with the scope error;
/// - `emit` fails, with that error;
/// - `receive` fails, with that error.
///
/// The other pump is then cancelled and awaited, and its outcome discarded:
/// once the call returns, neither pump is running anymore.
///
/// The caller may close `outbound` to indicate that no more values are to be
/// emitted; the call still blocks until `scope` is done or receiving fails.
/// The call takes ownership of `inbound` and closes it.
///
/// It is the caller's responsibility to ensure that `transmitter` returns
/// promptly from `receive` once `scope` is done.
///
/// # Panics
///
/// If a pump panics, the panic is resumed on the caller after the other pump
/// has stopped.
pub async fn run_transmitter<V, E, T>(
    scope: &Scope,
    transmitter: Arc<T>,
    outbound: mpsc::Receiver<V>,
    inbound: mpsc::Sender<V>,
) -> Error<E>
where
    T: Transmitter<V, E> + Send + Sync + 'static,
    V: Send + 'static,
    E: Send + 'static,
{
    // Ending one side must stop the other without touching the caller's scope.
    let scope = scope.child();

    // Holds both outcomes, so neither task blocks on reporting its result.
    let mut results = JoinSet::new();

    results.spawn({
        let scope = scope.clone();
        let transmitter = Arc::clone(&transmitter);
        async move { run_emitter(&scope, &*transmitter, outbound).await }
    });

    results.spawn({
        let scope = scope.clone();
        async move { run_receiver(&scope, &*transmitter, inbound).await }
    });

    let mut outcome = None;
    let mut panicked = None;

    while let Some(joined) = results.join_next().await {
        // Idempotent: only the first pass unblocks the remaining pump.
        scope.cancel();

        match joined {
            Ok(err) if outcome.is_none() => {
                debug!("Transmitter pump finished first: {:?}", err.kind());
                outcome = Some(err);
            }
            Ok(err) => trace!("Discarding second transmitter outcome: {:?}", err.kind()),
            Err(join_err) => {
                if join_err.is_panic() {
                    panicked.get_or_insert(join_err.into_panic());
                }
            }
        }
    }

    if let Some(payload) = panicked {
        panic::resume_unwind(payload);
    }

    // Only reachable without an outcome if the runtime shut the tasks down.
    outcome.unwrap_or(Error::Scope(ScopeError::Canceled))
}
