mod adaptive_queue;
mod client;
mod error;

pub use adaptive_queue::{queue_name_from_url, AdaptiveQueue};
pub use client::{SqsClient, DEFAULT_MAX_MESSAGES, MAX_MESSAGES_PER_RECEIVE, MAX_WAIT_TIME};
pub use error::SqsError;

pub use aws_sdk_sqs::types::Message;
