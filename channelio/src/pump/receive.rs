use log::{debug, trace};
use tokio::sync::mpsc;

use crate::capability::Receiver;
use crate::error::Error;
use crate::scope::Scope;

/// Continuously reads values from `receiver` and pushes them to `values`.
///
/// Returns only when either:
/// - `scope` is done, with the scope error;
/// - `receive` fails, with that error.
///
/// The call takes ownership of `values` and closes it on every exit path, so
/// the consumer sees the end of the stream once the call returns. Callers
/// must not keep other clones of the sender around if they rely on that.
///
/// A value received while the consumer is not keeping up is dropped if the
/// scope ends before it could be delivered.
///
/// It is the caller's responsibility to ensure that `receiver` returns
/// promptly once `scope` is done: a pending `receive` is never interrupted.
pub async fn run_receiver<V, R>(
    scope: &Scope,
    receiver: &R,
    values: mpsc::Sender<V>,
) -> Error<R::Error>
where
    R: Receiver<V>,
{
    debug!("Receive pump started");

    loop {
        if let Some(cause) = scope.err() {
            debug!("Receive pump stopped: {}", cause);
            return Error::Scope(cause);
        }

        let value = match receiver.receive().await {
            Ok(value) => value,
            Err(err) => {
                debug!("Receive pump stopped: receive failed");
                return Error::Capability(err);
            }
        };
        trace!("Received value");

        // The consumer may not be reading: keep an eye on the scope.
        tokio::select! {
            biased;
            cause = scope.done_err() => {
                debug!("Receive pump stopped: {}", cause);
                return Error::Scope(cause);
            }
            sent = values.send(value) => {
                if sent.is_err() {
                    debug!("Receive pump consumer gone, waiting for scope");
                    return Error::Scope(scope.done_err().await);
                }
            }
        }
    }
}
