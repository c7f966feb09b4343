//! Pumps moving values between channels and capabilities.
//!
//! - [`run_emitter`] drains a channel into an [`Emitter`](crate::Emitter).
//! - [`run_receiver`] fills a channel from a [`Receiver`](crate::Receiver)
//!   and closes it on exit.
//! - [`run_transmitter`] runs both against a
//!   [`Transmitter`](crate::Transmitter) and returns once both have stopped.
//!
//! None of the pumps ever succeeds: each runs until its [`Scope`](crate::Scope)
//! is done or the capability fails, and returns the reason.

mod duplex;
mod emit;
mod receive;

#[cfg(test)]
pub(crate) mod testing;

pub use duplex::run_transmitter;
pub use emit::run_emitter;
pub use receive::run_receiver;
