//! Cooperative cancellation for remote traversals.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// How often a blocked wait looks at the flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A shared abort flag.
///
/// Clones observe the same flag. Once set it stays set; create a fresh
/// flag for the next attempt.
///
/// # Example
///
/// ```
/// use flatkit::CancelFlag;
///
/// let flag = CancelFlag::new();
/// let handle = flag.clone();
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the flag has been set.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether `other` is a clone of this flag.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }

    /// Fail with [`Error::OperationAborted`](crate::Error::OperationAborted) if set.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            return Err(crate::Error::OperationAborted);
        }
        Ok(())
    }

    /// Wait for a result from a worker, giving up as soon as the flag is set.
    ///
    /// The worker is abandoned on cancel; whatever it sends later is dropped.
    ///
    /// # Errors
    ///
    /// `OperationAborted` when the flag is set before a result arrives, or
    /// `Http` when the worker goes away without sending one.
    pub fn wait_for<T>(&self, results: &Receiver<crate::Result<T>>) -> crate::Result<T> {
        loop {
            self.check()?;
            match results.recv_timeout(POLL_INTERVAL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(crate::Error::http("request worker exited without a response"));
                }
            }
        }
    }
}
