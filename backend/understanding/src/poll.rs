//! Bounded polling of asynchronous remote jobs.
//!
//! Exponential backoff between checks, capped per-check delay, a maximum
//! number of checks and a hard wall-clock deadline. Running out of either
//! budget yields `BridgeError::PollTimeout`.

use std::future::Future;
use std::time::Duration;

use lensbridge_core::{BridgeError, BridgeResult};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            multiplier: 2,
            max_attempts: 30,
            timeout: Duration::from_secs(30),
        }
    }
}

impl PollPolicy {
    /// Delay after the `retry`-th pending check (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.multiplier
            .checked_pow(retry)
            .map(|factor| self.initial_delay.saturating_mul(factor))
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Result of one check.
#[derive(Debug)]
pub enum PollOutcome<T> {
    Ready(T),
    Pending,
}

/// Check until `Ready`, an error, or the policy budget runs out. The check
/// receives the 1-based attempt number.
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, mut check: F) -> BridgeResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = BridgeResult<PollOutcome<T>>>,
{
    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut attempts = 0;

    loop {
        attempts += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, check(attempts)).await {
            Ok(Ok(PollOutcome::Ready(value))) => return Ok(value),
            Ok(Ok(PollOutcome::Pending)) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(BridgeError::PollTimeout { attempts, elapsed: started.elapsed() });
            }
        }

        if attempts >= policy.max_attempts {
            return Err(BridgeError::PollTimeout { attempts, elapsed: started.elapsed() });
        }
        let delay = policy.delay_for(attempts - 1);
        if Instant::now() + delay >= deadline {
            return Err(BridgeError::PollTimeout { attempts, elapsed: started.elapsed() });
        }
        debug!(attempt = attempts, delay_ms = delay.as_millis() as u64, "Job pending; backing off");
        tokio::time::sleep(delay).await;
    }
}
