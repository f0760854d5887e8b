use std::time::Duration;

use aws_config::default_provider::credentials::DefaultCredentialsChain;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::types::{Message, QueueAttributeName};
use aws_sdk_sqs::Client;

use super::error::SqsError;
use crate::clap::{AwsConfig, SqsConfig};

/// SQS holds a long poll open for at most 20 seconds.
pub const MAX_WAIT_TIME: Duration = Duration::from_secs(20);

/// SQS returns at most 10 messages from a single receive.
pub const MAX_MESSAGES_PER_RECEIVE: i32 = 10;

pub const DEFAULT_MAX_MESSAGES: i32 = MAX_MESSAGES_PER_RECEIVE;

/// Zero means "use the default", anything else is clamped to what SQS accepts.
fn max_messages_or_default(max_messages: i32) -> i32 {
    if max_messages == 0 {
        DEFAULT_MAX_MESSAGES
    } else {
        max_messages.clamp(1, MAX_MESSAGES_PER_RECEIVE)
    }
}

fn wait_time_seconds(wait_time: Duration) -> i32 {
    // Bounded by MAX_WAIT_TIME so the cast cannot truncate
    wait_time.min(MAX_WAIT_TIME).as_secs() as i32
}

fn visibility_timeout_seconds(visibility_timeout: Duration) -> i32 {
    i32::try_from(visibility_timeout.as_secs()).unwrap_or(i32::MAX)
}

#[derive(Clone)]
pub struct SqsClient {
    inner: Client,
}

impl SqsClient {
    async fn build_credentials(profile: &Option<String>) -> DefaultCredentialsChain {
        let mut builder = DefaultCredentialsChain::builder();
        if let Some(profile) = profile {
            builder = builder.profile_name(profile);
        }

        builder.build().await
    }

    async fn build_inner(
        endpoint: &Option<String>,
        region: &str,
        profile: &Option<String>,
    ) -> Client {
        let region = Region::new(region.to_owned());
        let credentials_provider = SqsClient::build_credentials(profile).await;

        // Long polls can legitimately take the full wait time so leave plenty of headroom
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(60))
            .build();

        let mut config = aws_sdk_sqs::Config::builder()
            .behavior_version_latest()
            .region(region)
            .credentials_provider(credentials_provider)
            .timeout_config(timeout_config);

        // Used to point at LocalStack during development
        if let Some(endpoint) = endpoint {
            config = config.endpoint_url(endpoint);
        }

        Client::from_conf(config.build())
    }

    pub async fn new(sqs_config: &SqsConfig, aws_config: &AwsConfig) -> SqsClient {
        let inner =
            Self::build_inner(&sqs_config.endpoint, &aws_config.region, &aws_config.profile).await;

        SqsClient { inner }
    }

    /// Checks that the queue exists and we are allowed to read it. Gives a much more
    /// meaningful error in the common case of missing credentials than the first failed poll.
    pub async fn preflight_check(&self, queue_url: &str) -> Result<(), SqsError> {
        tracing::debug!("Starting preflight check for {}", queue_url);

        let attributes = self
            .inner
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await?;

        let approximate_messages = attributes
            .attributes()
            .and_then(|a| a.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .map(String::as_str)
            .unwrap_or("unknown");

        tracing::info!(queue_url, approximate_messages, "Preflight check successful");

        Ok(())
    }

    /// Receive up to `max_messages` messages, long polling for at most `wait_time`.
    ///
    /// A `max_messages` of zero uses the default of 10. Wait times above the SQS maximum of 20
    /// seconds are clamped.
    pub async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time: Duration,
        visibility_timeout: Duration,
        message_attribute_names: &[String],
    ) -> Result<Vec<Message>, SqsError> {
        let message_attribute_names = if message_attribute_names.is_empty() {
            None
        } else {
            Some(message_attribute_names.to_vec())
        };

        let output = self
            .inner
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages_or_default(max_messages))
            .wait_time_seconds(wait_time_seconds(wait_time))
            .visibility_timeout(visibility_timeout_seconds(visibility_timeout))
            .set_message_attribute_names(message_attribute_names)
            .send()
            .await?;

        Ok(output.messages.unwrap_or_default())
    }

    /// Delete a processed message so it is not redelivered.
    pub async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), SqsError> {
        self.inner
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;

        Ok(())
    }
}
