// ── Delivery pipeline ──
//
// Ships one batch per cycle to a metric sink. Attempts are bounded and
// spaced by a fixed delay; an exhausted batch is dropped, never spooled.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::metrics::MetricSample;

/// Destination for metric batches.
pub trait MetricSink: Send + Sync {
    /// Deliver the whole batch. Partial acceptance is not modelled.
    fn deliver(&self, samples: &[MetricSample]) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Bounded retry with a constant delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(3),
        }
    }
}

/// Outcome of a delivered batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub samples: usize,
    pub attempts: u32,
}

/// Retrying wrapper around a [`MetricSink`].
pub struct Delivery<M> {
    sink: M,
    policy: RetryPolicy,
}

impl<M: MetricSink> Delivery<M> {
    pub fn new(sink: M, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    pub fn sink(&self) -> &M {
        &self.sink
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Deliver `batch`, retrying per the policy.
    ///
    /// An empty batch succeeds without touching the sink.
    pub async fn deliver(&self, batch: &[MetricSample]) -> Result<DeliveryReport, CoreError> {
        if batch.is_empty() {
            debug!("empty batch, nothing to deliver");
            return Ok(DeliveryReport {
                samples: 0,
                attempts: 0,
            });
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.sink.deliver(batch).await {
                Ok(()) => {
                    debug!(samples = batch.len(), attempt, "batch delivered");
                    return Ok(DeliveryReport {
                        samples: batch.len(),
                        attempts: attempt,
                    });
                }
                Err(e) if attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        "delivery attempt failed, retrying in {:?}",
                        self.policy.delay,
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
                Err(e) => {
                    return Err(CoreError::Delivery {
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
