//! Cooperative cancellation for reconcile passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::errors::ReconcileError;

/// Token handed to every suspension point in a reconcile pass.
///
/// Cancellation is cooperative and idempotent: only the first reason is
/// kept. A token may also carry the deadline the pass inherited from its
/// scheduler; an expired deadline reads as cancellation.
#[derive(Default)]
pub struct CancellationToken {
    /// Whether cancellation has been requested.
    cancelled: AtomicBool,
    /// The reason for cancellation (first one wins).
    reason: RwLock<Option<String>>,
    /// Deadline inherited from the scheduler, if any.
    deadline: RwLock<Option<Instant>>,
}

impl CancellationToken {
    /// Creates a token with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that expires `timeout` from now.
    #[must_use]
    pub fn with_deadline(timeout: Duration) -> Self {
        let token = Self::new();
        *token.deadline.write() = Some(Instant::now() + timeout);
        token
    }

    /// Requests cancellation with a reason.
    ///
    /// Idempotent - only the first reason is kept.
    pub fn cancel(&self, reason: impl Into<String>) {
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *self.reason.write() = Some(reason.into());
        }
    }

    /// Returns whether the pass should stop: explicitly cancelled or past
    /// its deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        let expired = matches!(*self.deadline.read(), Some(deadline) if Instant::now() >= deadline);
        if expired {
            self.cancel("pass deadline exceeded");
        }
        expired
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Errors out when the token is cancelled.
    ///
    /// Called before every suspension point so a cancelled pass aborts
    /// without writing status.
    pub fn ensure_active(&self) -> Result<(), ReconcileError> {
        if self.is_cancelled() {
            Err(ReconcileError::Cancelled(
                self.reason().unwrap_or_else(|| "cancelled".to_string()),
            ))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.cancelled.load(Ordering::SeqCst))
            .field("reason", &self.reason())
            .finish()
    }
}
