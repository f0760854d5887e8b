use std::env;

use tokio::task::JoinError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// - `default_directive`: used when `RUST_LOG` is not set. Either a plain level such as `info`
///   or comma-separated module directives, e.g. `info,common::adaptive_polling=debug`.
///
/// Logs are written to stdout, as JSON when the `JSON_LOGS` environment variable is present.
pub fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let json_logs = env::var_os("JSON_LOGS").is_some();

    let registry = tracing_subscriber::registry();

    if json_logs {
        let layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .json()
            .flatten_event(true)
            .with_span_list(false)
            .with_filter(filter);

        registry.with(layer).init();
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_filter(filter);

        registry.with(layer).init();
    }
}

pub fn log_task_result_exit<T, E>(task_name: &str, result: Result<Result<T, E>, JoinError>)
where
    E: std::fmt::Debug,
{
    match result {
        Ok(Ok(_)) => tracing::info!("Task '{}' exited successfully", task_name),
        Ok(Err(e)) => tracing::error!("Failure in '{}' task: {:?}", task_name, e),
        Err(e) => tracing::error!("Failed to join to '{}' task handle: {:?}", task_name, e),
    }
}
