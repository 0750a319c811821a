use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ContextError;

/// Deadline and cancellation state passed to every store operation.
///
/// Stores consult the context once, before issuing a statement. A statement
/// that has already been handed to the storage engine runs to completion.
/// Clones share the same cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl OpContext {
    /// A context with no deadline that is never cancelled unless asked to.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Ok(())` while the context still permits work.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_always_live() {
        let ctx = OpContext::background();
        assert!(ctx.deadline().is_none());
        assert_eq!(ctx.check(), Ok(()));
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = OpContext::background();
        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
    }

    #[test]
    fn expired_deadline_fails_check() {
        let ctx = OpContext::with_deadline(Instant::now());
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
    }

    #[test]
    fn future_deadline_passes_check() {
        let ctx = OpContext::with_timeout(Duration::from_secs(3600));
        assert_eq!(ctx.check(), Ok(()));
    }

    #[test]
    fn unrepresentable_timeout_has_no_deadline() {
        let ctx = OpContext::with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert_eq!(ctx.check(), Ok(()));
    }

    #[test]
    fn cancellation_wins_over_deadline() {
        let ctx = OpContext::with_deadline(Instant::now());
        ctx.cancel();
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
    }
}
