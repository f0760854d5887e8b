use std::time::Duration;

use aws_sdk_sqs::types::Message;

use super::{
    client::{SqsClient, MAX_WAIT_TIME},
    error::SqsError,
};
use crate::adaptive_polling::AdaptivePollingController;

/// The queue name is the last path segment of an SQS queue URL, e.g. `orders` in
/// `https://sqs.eu-west-1.amazonaws.com/123456789012/orders`.
pub fn queue_name_from_url(queue_url: &str) -> &str {
    queue_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(queue_url)
}

/// A single SQS queue whose long-poll wait time is picked by an
/// [`AdaptivePollingController`].
///
/// Clones share the same controller, so a queue can be handed to several workers and they
/// will all learn from each other's polls.
#[derive(Clone)]
pub struct AdaptiveQueue {
    client: SqsClient,
    queue_url: String,
    controller: AdaptivePollingController,
}

impl AdaptiveQueue {
    pub fn new(
        client: SqsClient,
        queue_url: impl Into<String>,
        controller: AdaptivePollingController,
    ) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            controller,
        }
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    pub fn queue_name(&self) -> &str {
        queue_name_from_url(&self.queue_url)
    }

    pub fn controller(&self) -> &AdaptivePollingController {
        &self.controller
    }

    /// Poll the queue using the controller's current wait time, then feed the number of
    /// received messages back into the controller. Returns the messages along with the wait
    /// time that was sent to SQS.
    ///
    /// Failed polls are not observed, an error says nothing about the queue's volume.
    pub async fn receive_messages(
        &self,
        max_messages: i32,
        message_attribute_names: &[String],
    ) -> Result<(Vec<Message>, Duration), SqsError> {
        let wait_time = self.controller.next_wait_time().min(MAX_WAIT_TIME);

        tracing::trace!(
            queue_url = %self.queue_url,
            wait_time_seconds = wait_time.as_secs(),
            "Receiving messages"
        );

        let messages = self
            .client
            .receive_messages(
                &self.queue_url,
                max_messages,
                wait_time,
                self.controller.config().visibility_timeout(),
                message_attribute_names,
            )
            .await?;

        self.controller.observe(messages.len());

        Ok((messages, wait_time))
    }

    pub async fn delete_message(&self, message: &Message) -> Result<(), SqsError> {
        let receipt_handle = message
            .receipt_handle()
            .ok_or_else(|| SqsError::MissingReceiptHandle(self.queue_url.clone()))?;

        self.client
            .delete_message(&self.queue_url, receipt_handle)
            .await
    }
}
