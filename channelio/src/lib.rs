//! # channelio - Channel pumps for single-value capabilities
//!
//! channelio adapts "emit one value" / "receive one value" capabilities into
//! channel-based pipelines with cooperative cancellation:
//!
//! - **Emit pump**: drains a channel into an [`Emitter`]
//! - **Receive pump**: fills a channel from a [`Receiver`], closing it on exit
//! - **Duplex pump**: runs both directions of a [`Transmitter`] and only
//!   returns once both have stopped
//! - **Scopes**: cancellation and deadlines shared by every pump of a call
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   mpsc    ┌────────────┐         ┌─────────────────┐
//! │   outbound   │ ────────► │ emit pump  │ ──────► │                 │
//! │   values     │           └────────────┘  emit   │                 │
//! └──────────────┘                                  │   Transmitter   │
//! ┌──────────────┐   mpsc    ┌────────────┐         │                 │
//! │   inbound    │ ◄──────── │receive pump│ ◄────── │                 │
//! │   values     │           └────────────┘ receive └─────────────────┘
//! └──────────────┘
//!          both pumps observe one child Scope of the caller's
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use channelio::{compose, run_transmitter, Scope};
//! use tokio::sync::mpsc;
//!
//! let scope = Scope::new().with_timeout(Duration::from_secs(30));
//! let (out_tx, out_rx) = mpsc::channel(16);
//! let (in_tx, mut in_rx) = mpsc::channel(16);
//!
//! let transmitter = Arc::new(compose(encoder, decoder));
//! let err = run_transmitter(&scope, transmitter, out_rx, in_tx).await;
//! ```

#![deny(unsafe_code)]

pub mod capability;
pub mod compose;
pub mod error;
pub mod pump;
pub mod scope;

// Re-export commonly used types
pub use capability::{Emitter, Receiver, Transmitter};
pub use compose::{Composed, compose};
pub use error::{Error, ErrorKind, ScopeError};
pub use pump::{run_emitter, run_receiver, run_transmitter};
pub use scope::Scope;

/// Default capacity for channels created by callers that have no better idea.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;
