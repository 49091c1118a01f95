use crate::domain::ports::{StoreError, StoreResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Per-call context handed to every engine entry point.
///
/// Carries the caller's deadline. Each store call is bounded by it; a call
/// that outlives the deadline is abandoned and reported as
/// [`StoreError::DeadlineExceeded`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context without a deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Runs a store call under this context's deadline.
    pub async fn run<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match self.deadline {
            None => call.await,
            Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::DeadlineExceeded),
            },
        }
    }
}
