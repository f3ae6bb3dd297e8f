//! Retry policy for optimistic-concurrency conflicts.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{Error, Result};
use crate::metrics;

/// How often and how fast a conflicting attempt is repeated.
///
/// The default retries until the operation succeeds, fails with another
/// error, or the cancellation token fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Give up after this many attempts. `None` retries forever.
    pub max_attempts: Option<NonZeroU32>,

    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Unbounded retries without delay.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// At most `attempts` attempts.
    pub fn bounded(attempts: NonZeroU32) -> Self {
        Self {
            max_attempts: Some(attempts),
            ..Self::default()
        }
    }

    /// Same policy with a pause between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run `attempt` until it stops returning [`Error::Conflict`].
    pub async fn run<T, F, Fut>(
        &self,
        op: &'static str,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            attempts = attempts.saturating_add(1);
            metrics::record_attempt(op);

            match attempt().await {
                Err(Error::Conflict) => {
                    metrics::record_conflict(op);

                    if let Some(max) = self.max_attempts {
                        if attempts >= max.get() {
                            warn!(op, attempts, "giving up after repeated conflicts");
                            return Err(Error::RetriesExhausted { attempts });
                        }
                    }

                    warn!(op, attempts, "remote zone changed during update, retrying");

                    if !self.delay.is_zero() {
                        tokio::select! {
                            biased;

                            _ = cancel.cancelled() => return Err(Error::Cancelled),
                            _ = tokio::time::sleep(self.delay) => {}
                        }
                    }
                }
                result => return result,
            }
        }
    }
}
