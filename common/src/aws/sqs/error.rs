use aws_sdk_sqs::{
    config::http::HttpResponse,
    error::SdkError,
    operation::{
        delete_message::DeleteMessageError, get_queue_attributes::GetQueueAttributesError,
        receive_message::ReceiveMessageError,
    },
};
use thiserror::Error;

pub type SqsReceiveMessageError = SdkError<ReceiveMessageError, HttpResponse>;
pub type SqsDeleteMessageError = SdkError<DeleteMessageError, HttpResponse>;
pub type SqsGetQueueAttributesError = SdkError<GetQueueAttributesError, HttpResponse>;

/// Error variants for the SQS client
#[derive(Error, Debug)]
pub enum SqsError {
    #[error("Failed to receive messages")]
    Receive(#[from] SqsReceiveMessageError),
    #[error("Failed to delete message")]
    Delete(#[from] SqsDeleteMessageError),
    #[error("Failed to read queue attributes")]
    QueueAttributes(#[from] SqsGetQueueAttributesError),
    #[error("Message from {0} has no receipt handle")]
    MissingReceiptHandle(String),
}
