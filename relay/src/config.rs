use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use channelio::{DEFAULT_CHANNEL_CAPACITY, Scope};

/// Longest line accepted from a peer, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Where to listen or connect.
#[derive(Debug, Clone)]
pub enum Target {
    Unix(PathBuf),
    Tcp(SocketAddr),
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Capacity of the outbound and inbound line channels.
    pub buffer: usize,
    pub max_line_length: usize,
    /// Upper bound on a session's lifetime.
    pub timeout: Option<Duration>,
}

impl RelayConfig {
    pub fn new() -> Self {
        Self {
            buffer: DEFAULT_CHANNEL_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            timeout: None,
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        // mpsc channels panic on a zero capacity.
        self.buffer = buffer.max(1);
        self
    }

    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Derives the scope a single session runs under.
    pub fn session_scope(&self, parent: &Scope) -> Scope {
        match self.timeout {
            Some(timeout) => parent.with_timeout(timeout),
            None => parent.child(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::new()
    }
}
