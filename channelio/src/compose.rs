use std::future::Future;

use crate::capability::{Emitter, Receiver};

/// An [`Emitter`] and a [`Receiver`] aggregated into one transmitter.
///
/// `emit` goes to the emitter, `receive` goes to the receiver. Nothing is
/// added in between: no locking, no buffering, no error translation.
#[derive(Debug, Clone, Default)]
pub struct Composed<E, R> {
    emitter: E,
    receiver: R,
}

/// Composes an [`Emitter`] and a [`Receiver`] into a
/// [`Transmitter`](crate::Transmitter).
pub fn compose<E, R>(emitter: E, receiver: R) -> Composed<E, R> {
    Composed { emitter, receiver }
}

impl<E, R> Composed<E, R> {
    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    pub fn into_parts(self) -> (E, R) {
        (self.emitter, self.receiver)
    }
}

impl<V, E: Emitter<V>, R> Emitter<V> for Composed<E, R> {
    type Error = E::Error;

    fn emit(&self, value: V) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.emitter.emit(value)
    }
}

impl<V, E, R: Receiver<V>> Receiver<V> for Composed<E, R> {
    type Error = R::Error;

    fn receive(&self) -> impl Future<Output = Result<V, Self::Error>> + Send {
        self.receiver.receive()
    }
}
