//! Retrying bulk writer
//!
//! A bulk request is all or nothing: any transport failure, error status or
//! rejected item fails the attempt and the whole body is sent again.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::Metrics;
use crate::core::error::{IndexError, IndexerError};
use crate::core::traits::DocumentIndex;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub enum WriteOutcome {
    Written { attempts: u32 },
    /// Every attempt failed; the batch was not written
    Exhausted { attempts: u32, last_error: IndexerError },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }
}

#[derive(Clone)]
pub struct BulkWriter {
    index: Arc<dyn DocumentIndex>,
    max_retries: u32,
    backoff: Duration,
    metrics: Arc<Metrics>,
}

impl BulkWriter {
    pub fn new(index: Arc<dyn DocumentIndex>, max_retries: u32, backoff: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            index,
            max_retries,
            backoff,
            metrics,
        }
    }

    /// Send `body` holding `documents` documents, up to `1 + max_retries` times
    pub async fn write(&self, body: Bytes, documents: usize) -> WriteOutcome {
        if body.is_empty() {
            return WriteOutcome::Written { attempts: 0 };
        }

        let attempts = self.max_retries.saturating_add(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            if attempt > 1 {
                self.metrics.bulk_retries.inc();
                tokio::time::sleep(self.delay(attempt - 1)).await;
            }
            self.metrics.bulk_requests.inc();

            // Bytes clones share the buffer
            match self.index.bulk(body.clone()).await {
                Ok(outcome) if outcome.is_success() => {
                    self.metrics.documents_written.inc_by(documents as u64);
                    debug!("Wrote {} documents in {} attempt(s)", documents, attempt);
                    return WriteOutcome::Written { attempts: attempt };
                }
                Ok(outcome) => {
                    let reason = outcome.first_error.unwrap_or_else(|| "errors flag set".to_string());
                    warn!(
                        "Bulk attempt {}/{} rejected {} of {} items: {}",
                        attempt, attempts, outcome.failed_items, outcome.items, reason
                    );
                    last_error = Some(IndexerError::Index(IndexError::BulkRejected {
                        failed: outcome.failed_items,
                        total: outcome.items,
                        reason,
                    }));
                }
                Err(e) => {
                    warn!("Bulk attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = Some(e);
                }
            }
        }

        self.metrics.bulk_failures.inc();
        WriteOutcome::Exhausted {
            attempts,
            last_error: last_error.unwrap_or_else(|| IndexerError::Other(anyhow::anyhow!("no bulk attempt made"))),
        }
    }

    /// Exponential backoff for the `retry`th retry, capped
    fn delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}
