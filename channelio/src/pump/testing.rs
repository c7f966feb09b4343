//! Capability doubles shared by the pump tests.

use core::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::capability::{Emitter, Receiver};
use crate::scope::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure(pub &'static str);

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.0)
    }
}

impl std::error::Error for Failure {}

/// Records every emitted value. Fails on the `fail_at`-th call, counting
/// from 1.
#[derive(Debug)]
pub struct RecordingEmitter<V> {
    emitted: Mutex<Vec<V>>,
    calls: AtomicUsize,
    fail_at: Option<usize>,
}

impl<V: Clone> RecordingEmitter<V> {
    pub fn new() -> Self {
        RecordingEmitter {
            emitted: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_at: None,
        }
    }

    pub fn failing_at(n: usize) -> Self {
        RecordingEmitter {
            fail_at: Some(n),
            ..Self::new()
        }
    }

    pub fn emitted(&self) -> Vec<V> {
        self.emitted.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<V: Send> Emitter<V> for RecordingEmitter<V> {
    type Error = Failure;

    async fn emit(&self, value: V) -> Result<(), Failure> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at == Some(n) {
            return Err(Failure("emit"));
        }
        self.emitted.lock().unwrap().push(value);
        Ok(())
    }
}

/// Yields 1, 2, 3, ... Fails on the `fail_at`-th call, counting from 1.
#[derive(Debug, Default)]
pub struct CountingReceiver {
    calls: AtomicUsize,
    fail_at: Option<usize>,
}

impl CountingReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(n: usize) -> Self {
        CountingReceiver {
            calls: AtomicUsize::new(0),
            fail_at: Some(n),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Receiver<u32> for CountingReceiver {
    type Error = Failure;

    async fn receive(&self) -> Result<u32, Failure> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at == Some(n) {
            return Err(Failure("receive"));
        }
        Ok(n as u32)
    }
}

/// Blocks until its scope is done, then takes `linger` more to give up.
#[derive(Debug)]
pub struct StallingReceiver {
    scope: Scope,
    linger: Duration,
}

impl StallingReceiver {
    pub fn new(scope: Scope, linger: Duration) -> Self {
        StallingReceiver { scope, linger }
    }
}

impl Receiver<u32> for StallingReceiver {
    type Error = Failure;

    async fn receive(&self) -> Result<u32, Failure> {
        self.scope.done().await;
        tokio::time::sleep(self.linger).await;
        Err(Failure("receive"))
    }
}

/// Lets every runnable task make progress. Needs a paused clock.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
