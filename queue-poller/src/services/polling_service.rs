use std::time::{Duration, Instant};

use common::aws::sqs::{AdaptiveQueue, Message};
use tokio::sync::mpsc;
use tokio::time::sleep;

/// How long a worker waits after a failed receive before polling again.
const ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Consecutive failed receives after which the worker gives up and the poller shuts down.
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// One worker long-polling a queue and passing received messages on for processing.
pub struct PollingService {
    queue: AdaptiveQueue,
    worker_id: usize,
    max_messages: i32,
    message_attribute_names: Vec<String>,
}

impl PollingService {
    pub fn new(
        queue: AdaptiveQueue,
        worker_id: usize,
        max_messages: i32,
        message_attribute_names: Vec<String>,
    ) -> PollingService {
        PollingService {
            queue,
            worker_id,
            max_messages,
            message_attribute_names,
        }
    }

    pub async fn run(&self, outbound: mpsc::Sender<Message>) -> anyhow::Result<()> {
        let queue_name = self.queue.queue_name().to_owned();

        tracing::info!(
            queue = %queue_name,
            worker_id = self.worker_id,
            adaptive_polling = self.queue.controller().is_enabled(),
            "Started polling worker"
        );

        let mut error_count = 0;

        loop {
            let started = Instant::now();

            let received = self
                .queue
                .receive_messages(self.max_messages, &self.message_attribute_names)
                .await;

            metrics::histogram!("PollDurationSeconds", "queue" => queue_name.clone())
                .record(started.elapsed().as_secs_f64());

            match received {
                Ok((messages, wait_time)) => {
                    error_count = 0;

                    let num_messages = messages.len();
                    let controller = self.queue.controller();

                    metrics::counter!("MessagesReceived", "queue" => queue_name.clone())
                        .increment(num_messages as u64);
                    metrics::histogram!("PollWaitTimeSeconds", "queue" => queue_name.clone())
                        .record(wait_time.as_secs_f64());
                    metrics::gauge!("MessageVolumeAverage", "queue" => queue_name.clone())
                        .set(controller.average());

                    if num_messages > 0 {
                        tracing::info!(
                            queue = %queue_name,
                            worker_id = self.worker_id,
                            num_messages,
                            wait_time_seconds = wait_time.as_secs(),
                            volume_class = %controller.volume_class(),
                            "Received messages"
                        );
                    } else {
                        tracing::debug!(
                            queue = %queue_name,
                            worker_id = self.worker_id,
                            wait_time_seconds = wait_time.as_secs(),
                            "Queue was empty"
                        );
                    }

                    for message in messages {
                        if outbound.send(message).await.is_err() {
                            anyhow::bail!("Processing channel for queue {queue_name} closed");
                        }
                    }
                }
                Err(err) => {
                    error_count += 1;

                    metrics::counter!("ReceiveErrors", "queue" => queue_name.clone()).increment(1);

                    tracing::error!(
                        "Error receiving messages from {}: {:?}, error count: {}",
                        queue_name,
                        err,
                        error_count
                    );

                    if error_count >= MAX_CONSECUTIVE_ERRORS {
                        anyhow::bail!(
                            "Polling {queue_name} failed {error_count} times in a row: {err}"
                        );
                    }

                    sleep(ERROR_PAUSE).await;
                }
            }
        }
    }
}
