//! The `common` crate provides the building blocks shared by the queue polling services,
//! primarily the [`AdaptivePollingController`] which picks long-poll wait times from observed
//! message volume, and the SQS client which feeds it.
//!
//! [`AdaptivePollingController`]: adaptive_polling::AdaptivePollingController

pub mod adaptive_polling;
pub mod aws;
pub mod clap;
pub mod healthcheck;
pub mod metrics;
pub mod time;
pub mod tracing;
