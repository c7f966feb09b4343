use log::{debug, trace};
use tokio::sync::mpsc;

use crate::capability::Emitter;
use crate::error::Error;
use crate::scope::Scope;

/// Reads all the values from `values` and pushes them through `emitter`.
///
/// Returns only when either:
/// - `scope` is done, with the scope error;
/// - `emit` fails, with that error.
///
/// Closing `values` only means there is nothing more to emit: the call keeps
/// blocking until `scope` is done. The caller bounds the lifetime of the call
/// through the scope alone.
pub async fn run_emitter<V, E>(
    scope: &Scope,
    emitter: &E,
    mut values: mpsc::Receiver<V>,
) -> Error<E::Error>
where
    E: Emitter<V>,
{
    debug!("Emit pump started");
    let mut drained = false;

    loop {
        // An empty channel must not keep us from seeing the scope end.
        tokio::select! {
            biased;
            cause = scope.done_err() => {
                debug!("Emit pump stopped: {}", cause);
                return Error::Scope(cause);
            }
            value = values.recv(), if !drained => match value {
                Some(value) => {
                    trace!("Emitting value");
                    if let Err(err) = emitter.emit(value).await {
                        debug!("Emit pump stopped: emit failed");
                        return Error::Capability(err);
                    }
                }
                None => {
                    debug!("Emit pump source closed, waiting for scope");
                    drained = true;
                }
            },
        }
    }
}
