use std::num::NonZeroUsize;

use clap::Parser;
use common::aws::sqs::DEFAULT_MAX_MESSAGES;
use common::clap::{AdaptivePollingArgs, AwsConfig, SqsConfig, Stage};

use crate::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// The stage the poller is running in
    #[clap(long, value_enum, env = "STAGE", default_value = "development")]
    pub stage: Stage,
    /// URL of a queue to poll, repeat the flag to poll several queues
    #[clap(
        long = "queue-url",
        env = "QUEUE_URLS",
        value_delimiter = ',',
        required = true
    )]
    pub queue_urls: Vec<String>,
    /// Number of workers polling each queue, all sharing the queue's polling controller
    #[clap(long, env = "WORKERS_PER_QUEUE", default_value = "1")]
    pub workers_per_queue: NonZeroUsize,
    /// Maximum number of messages per receive call, between 1 and 10
    #[clap(long, env = "MAX_MESSAGES", default_value_t = DEFAULT_MAX_MESSAGES)]
    pub max_messages: i32,
    /// Message attribute to request with each message, repeatable
    #[clap(long = "message-attribute")]
    pub message_attribute_names: Vec<String>,
    /// The port that the admin web server runs on
    #[clap(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Ship metrics to CloudWatch
    #[clap(long, env = "ENABLE_METRICS")]
    pub enable_metrics: bool,

    #[command(flatten)]
    pub adaptive_polling: AdaptivePollingArgs,
    #[command(flatten)]
    pub sqs_config: SqsConfig,
    #[command(flatten)]
    pub aws_config: AwsConfig,
}
