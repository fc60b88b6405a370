//! Post-publish verification polling
//!
//! Registries are eventually consistent: a tag read straight after a publish
//! can still show the previous version. The poller waits an initial
//! propagation delay, then queries. With the default of one attempt that is
//! the whole story; extra attempts back off exponentially and are only made
//! while the query reports "not yet". Errors from the query are never
//! retried.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Floor for the delay between re-polls, so a zero propagation delay
/// does not turn into back-to-back queries
pub const MIN_BACKOFF: Duration = Duration::from_secs(1);

/// Options for verification polling
#[derive(Debug, Clone, PartialEq)]
pub struct PollOptions {
    /// Total number of queries, including the first
    pub max_attempts: u32,
    /// Delay before the first query
    pub initial_delay: Duration,
    /// Upper bound for the delay between later queries
    pub max_delay: Duration,
    /// Backoff multiplier applied after each extra query
    pub backoff_multiplier: f64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// Result of a single verification query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
    /// The registry shows what we expect
    Ready(T),
    /// The registry does not (yet) show what we expect
    Pending(T),
}

impl<T> Poll<T> {
    pub fn into_inner(self) -> T {
        match self {
            Poll::Ready(value) | Poll::Pending(value) => value,
        }
    }
}

/// Runs a verification query until it is ready or attempts run out
///
/// # Examples
///
/// ```no_run
/// use release_publisher::core::{Poll, PollOptions, VerificationPoller};
///
/// # async fn example() -> anyhow::Result<()> {
/// let poller = VerificationPoller::new(PollOptions::default());
/// let seen = poller
///     .poll(|| async { Ok::<_, anyhow::Error>(Poll::Ready("18.2.0")) })
///     .await?;
/// assert_eq!(seen, Poll::Ready("18.2.0"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VerificationPoller {
    options: PollOptions,
}

impl VerificationPoller {
    pub fn new(options: PollOptions) -> Self {
        Self { options }
    }

    /// Poll `query` and return its last answer
    ///
    /// A `Pending` answer is returned once attempts are exhausted; the
    /// caller decides what a stale registry means.
    pub async fn poll<F, Fut, T, E>(&self, mut query: F) -> Result<Poll<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Poll<T>, E>>,
    {
        let attempts = self.options.max_attempts.max(1);
        let mut delay = self.options.initial_delay;

        sleep(delay).await;

        let mut attempt = 1;
        loop {
            let answer = query().await?;
            if matches!(answer, Poll::Ready(_)) || attempt >= attempts {
                return Ok(answer);
            }

            delay = self.next_delay(delay);
            tracing::debug!(attempt, ?delay, "registry not updated yet, polling again");
            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Backoff step; grows from at least [`MIN_BACKOFF`] and saturates at `max_delay`
    fn next_delay(&self, delay: Duration) -> Duration {
        let seed = delay.max(MIN_BACKOFF).as_secs_f64();
        Duration::try_from_secs_f64(seed * self.options.backoff_multiplier)
            .unwrap_or(self.options.max_delay)
            .min(self.options.max_delay)
    }
}
