use crate::clap::Stage;

pub const QUEUE_POLLER_NAMESPACE: &str = "AdaptivePolling/QueuePoller";

/// Start a background thread which ships metrics to CloudWatch once a minute.
pub async fn init_metrics(
    namespace: impl Into<String>,
    stage: &Stage,
) -> anyhow::Result<(), metrics_cloudwatch::Error> {
    let namespace = namespace.into();

    tracing::info!(
        "initializing metrics with namespace {} and stage {}",
        namespace,
        stage.as_metrics_str(),
    );

    let config = aws_config::load_from_env().await;
    let cloudwatch_client = aws_sdk_cloudwatch::Client::new(&config);

    metrics_cloudwatch::Builder::new()
        .cloudwatch_namespace(namespace)
        .default_dimension("Stage", stage.as_metrics_str())
        .send_interval_secs(60)
        .send_timeout_secs(60)
        .init_thread(cloudwatch_client, metrics::set_global_recorder)
}
