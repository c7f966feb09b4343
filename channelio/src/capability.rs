//! Single-value capabilities.
//!
//! An [`Emitter`] sends one value at a time, a [`Receiver`] produces one value
//! at a time. Both take `&self`: a [`Transmitter`] is driven from two tasks at
//! once, one that only emits and one that only receives, so implementations
//! keep whatever state they need behind their own synchronisation.

use std::future::Future;
use std::sync::Arc;

/// A type that is able to encode or send a value.
pub trait Emitter<V> {
    type Error;

    /// Emits one value.
    fn emit(&self, value: V) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A type that is able to decode or receive a value.
///
/// Implementations used with a pump must return promptly once the caller's
/// [`Scope`](crate::Scope) is done; the pumps never interrupt a pending
/// `receive`.
pub trait Receiver<V> {
    type Error;

    /// Receives one value.
    fn receive(&self) -> impl Future<Output = Result<V, Self::Error>> + Send;
}

/// A type that acts both as an [`Emitter`] and a [`Receiver`] with a single
/// error type.
///
/// Implemented for every such type; see [`compose`](crate::compose) to build
/// one out of two independent halves.
pub trait Transmitter<V, E>: Emitter<V, Error = E> + Receiver<V, Error = E> {}

impl<V, E, T> Transmitter<V, E> for T where T: Emitter<V, Error = E> + Receiver<V, Error = E> + ?Sized
{}

impl<V, T: Emitter<V> + ?Sized> Emitter<V> for &T {
    type Error = T::Error;

    fn emit(&self, value: V) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).emit(value)
    }
}

impl<V, T: Emitter<V> + ?Sized> Emitter<V> for Box<T> {
    type Error = T::Error;

    fn emit(&self, value: V) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).emit(value)
    }
}

impl<V, T: Emitter<V> + ?Sized> Emitter<V> for Arc<T> {
    type Error = T::Error;

    fn emit(&self, value: V) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).emit(value)
    }
}

impl<V, T: Receiver<V> + ?Sized> Receiver<V> for &T {
    type Error = T::Error;

    fn receive(&self) -> impl Future<Output = Result<V, Self::Error>> + Send {
        (**self).receive()
    }
}

impl<V, T: Receiver<V> + ?Sized> Receiver<V> for Box<T> {
    type Error = T::Error;

    fn receive(&self) -> impl Future<Output = Result<V, Self::Error>> + Send {
        (**self).receive()
    }
}

impl<V, T: Receiver<V> + ?Sized> Receiver<V> for Arc<T> {
    type Error = T::Error;

    fn receive(&self) -> impl Future<Output = Result<V, Self::Error>> + Send {
        (**self).receive()
    }
}
