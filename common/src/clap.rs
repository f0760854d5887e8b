use clap::{Args, ValueEnum};

use crate::adaptive_polling::{
    PollingConfig, PollingConfigError, DEFAULT_DROP_DETECTION_THRESHOLD, DEFAULT_EWMA_ALPHA,
    DEFAULT_HIGH_VOLUME_WAIT_SECONDS, DEFAULT_IDLE_WAIT_SECONDS, DEFAULT_LOW_VOLUME_WAIT_SECONDS,
    DEFAULT_MEDIUM_VOLUME_WAIT_SECONDS, DEFAULT_VERY_HIGH_VOLUME_WAIT_SECONDS,
    DEFAULT_VISIBILITY_TIMEOUT_SECONDS,
};

/// Common AWS configuration parameters such as the region.
#[derive(Args, Clone, Debug)]
pub struct AwsConfig {
    /// AWS region
    #[clap(
        name = "aws-region",
        long,
        env = "AWS_REGION",
        global = true,
        default_value = "eu-west-1"
    )]
    pub region: String,
    /// AWS profile
    #[clap(name = "aws-profile", long, env = "AWS_PROFILE", global = true)]
    pub profile: Option<String>,
}

/// SQS connection parameters.
#[derive(Args, Clone, Debug, Default)]
pub struct SqsConfig {
    /// Override the SQS endpoint, e.g. `http://localhost:4566` for LocalStack
    #[clap(name = "sqs-endpoint", long, env = "SQS_ENDPOINT")]
    pub endpoint: Option<String>,
}

/// Adaptive polling options. Zero means "use the default" for every option except
/// `disabled-wait-seconds`.
#[derive(Args, Clone, Debug)]
pub struct AdaptivePollingArgs {
    /// Adapt long-poll wait times to the observed message volume
    #[clap(long, env = "ADAPTIVE_POLLING")]
    pub adaptive_polling: bool,
    /// Wait time when the queue is idle
    #[clap(long, env = "IDLE_WAIT_SECONDS", default_value_t = DEFAULT_IDLE_WAIT_SECONDS)]
    pub idle_wait_seconds: u64,
    /// How long received messages stay hidden from other consumers
    #[clap(
        long,
        env = "VISIBILITY_TIMEOUT_SECONDS",
        default_value_t = DEFAULT_VISIBILITY_TIMEOUT_SECONDS
    )]
    pub visibility_timeout_seconds: u64,
    /// Wait time for low message volume
    #[clap(
        long,
        env = "LOW_VOLUME_WAIT_SECONDS",
        default_value_t = DEFAULT_LOW_VOLUME_WAIT_SECONDS
    )]
    pub low_volume_wait_seconds: u64,
    /// Wait time for medium message volume
    #[clap(
        long,
        env = "MEDIUM_VOLUME_WAIT_SECONDS",
        default_value_t = DEFAULT_MEDIUM_VOLUME_WAIT_SECONDS
    )]
    pub medium_volume_wait_seconds: u64,
    /// Wait time for high message volume
    #[clap(
        long,
        env = "HIGH_VOLUME_WAIT_SECONDS",
        default_value_t = DEFAULT_HIGH_VOLUME_WAIT_SECONDS
    )]
    pub high_volume_wait_seconds: u64,
    /// Wait time for very high message volume
    #[clap(
        long,
        env = "VERY_HIGH_VOLUME_WAIT_SECONDS",
        default_value_t = DEFAULT_VERY_HIGH_VOLUME_WAIT_SECONDS
    )]
    pub very_high_volume_wait_seconds: u64,
    /// Wait time used while adaptive polling is disabled, zero for short polling
    #[clap(long, env = "DISABLED_WAIT_SECONDS", default_value_t = 0)]
    pub disabled_wait_seconds: u64,
    /// EWMA smoothing factor in (0, 1], higher values react faster to volume changes
    #[clap(long, env = "EWMA_ALPHA", default_value_t = DEFAULT_EWMA_ALPHA)]
    pub ewma_alpha: f64,
    /// Consecutive low volume polls before the volume average may be reset
    #[clap(
        long,
        env = "DROP_DETECTION_THRESHOLD",
        default_value_t = DEFAULT_DROP_DETECTION_THRESHOLD
    )]
    pub drop_detection_threshold: u32,
    /// Half-life of the volume average while the queue is idle, zero for the default
    #[clap(long, env = "DECAY_HALF_LIFE_SECONDS", default_value_t = 0)]
    pub decay_half_life_seconds: u64,
}

impl AdaptivePollingArgs {
    pub fn to_polling_config(&self) -> Result<PollingConfig, PollingConfigError> {
        PollingConfig::builder()
            .idle_wait_seconds(self.idle_wait_seconds)
            .visibility_timeout_seconds(self.visibility_timeout_seconds)
            .low_volume_wait_seconds(self.low_volume_wait_seconds)
            .medium_volume_wait_seconds(self.medium_volume_wait_seconds)
            .high_volume_wait_seconds(self.high_volume_wait_seconds)
            .very_high_volume_wait_seconds(self.very_high_volume_wait_seconds)
            .disabled_wait_seconds(self.disabled_wait_seconds)
            .ewma_alpha(self.ewma_alpha)
            .drop_detection_threshold(self.drop_detection_threshold)
            .decay_half_life_seconds(self.decay_half_life_seconds)
            .build()
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Stage {
    #[clap(aliases = &["prod", "PROD", "PRODUCTION"])]
    Production,
    #[clap(aliases = &["STAGING"])]
    Staging,
    #[clap(aliases = &["CODE"])]
    Code,
    #[clap(aliases = &["dev", "DEV", "DEVELOPMENT"])]
    Development,
}

impl Stage {
    /// Converts the `Stage` to the upper case name used as a metrics dimension.
    pub fn as_metrics_str(&self) -> &'static str {
        match self {
            Stage::Production => "PROD",
            Stage::Staging => "STAGING",
            Stage::Code => "CODE",
            Stage::Development => "DEV",
        }
    }
}
