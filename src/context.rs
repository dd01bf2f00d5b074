//! Cooperative cancellation and deadlines for adapter operations.
//!
//! Every public operation has a `_ctx` variant taking an [`OpContext`]. The
//! context is checked before each statement and between the steps of a
//! multi-row batch; a failed check inside a transaction makes the operation
//! return early, which rolls the transaction back. Cancellation is
//! cooperative: a statement already running is never interrupted mid-flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{AdapterError, Result};

/// Cancellation token shared between a caller and a running operation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Execution context governing how long an operation may keep issuing
/// statements against the backing store.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: Option<CancelToken>,
    deadline: Option<Instant>,
}

impl OpContext {
    /// A context that never cancels and carries no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancel(token: CancelToken) -> Self {
        Self {
            cancel: Some(token),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: None,
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn and_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Errors when the caller has cancelled or the deadline has passed.
    pub(crate) fn check(&self) -> Result<()> {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(AdapterError::Cancelled("cancelled by caller".into()));
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(AdapterError::Cancelled("deadline exceeded".into()));
            }
        }
        Ok(())
    }
}
