//! Hand-off of stale-user findings to a downstream action system

use async_trait::async_trait;
use tracing::info;

use super::types::{StaleUserRecord, UnusedCredentialsError};

/// Accepts a batch of stale-user records for follow-up
#[async_trait]
pub trait ActionQueue: Send + Sync {
    async fn submit(&self, records: &[StaleUserRecord]) -> Result<(), UnusedCredentialsError>;
}

/// Placeholder queue that only logs what it would enqueue
pub struct LoggingActionQueue;

impl LoggingActionQueue {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggingActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionQueue for LoggingActionQueue {
    async fn submit(&self, records: &[StaleUserRecord]) -> Result<(), UnusedCredentialsError> {
        if records.is_empty() {
            info!("No stale users to enqueue");
            return Ok(());
        }

        info!(
            count = records.len(),
            "Would enqueue stale users for follow-up; no action queue is configured"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::unused_credentials::DaysStale;

    #[tokio::test]
    async fn test_logging_queue_accepts_any_batch() {
        let queue = LoggingActionQueue::new();

        assert!(queue.submit(&[]).await.is_ok());
        assert!(queue
            .submit(&[StaleUserRecord::new("alice", "A1", DaysStale::Never)])
            .await
            .is_ok());
    }
}
