use common::aws::sqs::{AdaptiveQueue, Message};
use tokio::sync::mpsc;

/// Handles the messages received by a queue's polling workers, deleting each one once it has
/// been processed.
pub struct ProcessingService {
    queue: AdaptiveQueue,
}

impl ProcessingService {
    pub fn new(queue: AdaptiveQueue) -> ProcessingService {
        ProcessingService { queue }
    }

    /// Runs until every polling worker feeding `inbound` has stopped.
    pub async fn run(&self, mut inbound: mpsc::Receiver<Message>) -> anyhow::Result<()> {
        let queue_name = self.queue.queue_name().to_owned();

        while let Some(message) = inbound.recv().await {
            tracing::info!(
                queue = %queue_name,
                message_id = message.message_id().unwrap_or("unknown"),
                body = message.body().unwrap_or_default(),
                "Processing message"
            );

            match self.queue.delete_message(&message).await {
                Ok(()) => {
                    metrics::counter!("MessagesDeleted", "queue" => queue_name.clone())
                        .increment(1);
                }
                Err(err) => {
                    // The message becomes visible again once its visibility timeout expires
                    metrics::counter!("DeleteErrors", "queue" => queue_name.clone()).increment(1);
                    tracing::error!("Failed to delete message from {}: {:?}", queue_name, err);
                }
            }
        }

        tracing::info!(queue = %queue_name, "All polling workers stopped");

        Ok(())
    }
}
