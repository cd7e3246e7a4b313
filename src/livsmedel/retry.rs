//! Retry policy for upstream calls, independent of the transport.

use std::future::Future;
use std::time::Duration;

use super::provider::UpstreamError;

/// Exponential backoff: retry `n` waits `2^n * base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Retries after the first attempt
  pub max_retries: u32,
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      base_delay: Duration::from_millis(1000),
    }
  }
}

impl RetryPolicy {
  /// Policy that never waits between attempts.
  pub fn immediate(max_retries: u32) -> Self {
    Self {
      max_retries,
      base_delay: Duration::ZERO,
    }
  }

  /// Delay before retry number `attempt` (1-based).
  pub fn backoff(&self, attempt: u32) -> Duration {
    self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
  }

  /// Run `op` until it succeeds, fails permanently, or retries run out.
  pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, UpstreamError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
  {
    let mut attempt = 0;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(err) if err.is_transient() && attempt < self.max_retries => {
          attempt += 1;
          let delay = self.backoff(attempt);
          tracing::warn!(
            "Retry {}/{} after {}ms for {}: {}",
            attempt,
            self.max_retries,
            delay.as_millis(),
            label,
            err
          );
          tokio::time::sleep(delay).await;
        }
        Err(err) => return Err(err),
      }
    }
  }
}
