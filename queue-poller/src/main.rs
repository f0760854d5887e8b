use clap::Parser;
use common::adaptive_polling::AdaptivePollingController;
use common::aws::sqs::{AdaptiveQueue, SqsClient};
use common::metrics::{init_metrics, QUEUE_POLLER_NAMESPACE};
use common::tracing::{init_tracing, log_task_result_exit};
use queue_poller::cli::Cli;
use queue_poller::services::server::{self, PolledQueue, QueuePollerState};
use queue_poller::services::{PollingService, ProcessingService, MPSC_CHANNEL_BOUND};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _ = start(cli).await.map_err(|e| {
        tracing::error!("{}", e);
    });
}

async fn start(cli: Cli) -> anyhow::Result<()> {
    init_tracing("info");

    if cli.enable_metrics {
        init_metrics(QUEUE_POLLER_NAMESPACE, &cli.stage).await?;
    }

    tracing::info!("Cli args: {cli:?}");

    let polling_config = cli.adaptive_polling.to_polling_config()?;
    tracing::debug!("Polling config: {polling_config:?}");

    let sqs_client = SqsClient::new(&cli.sqs_config, &cli.aws_config).await;

    // fail early on a misspelt queue or missing permissions
    let mut queues = Vec::with_capacity(cli.queue_urls.len());
    for queue_url in &cli.queue_urls {
        sqs_client.preflight_check(queue_url).await?;

        let controller = AdaptivePollingController::with_enabled(
            polling_config.clone(),
            cli.adaptive_polling.adaptive_polling,
        );

        queues.push(AdaptiveQueue::new(sqs_client.clone(), queue_url, controller));
    }

    let mut services = JoinSet::new();

    for queue in &queues {
        let (tx, rx) = mpsc::channel(MPSC_CHANNEL_BOUND);

        for worker_id in 0..cli.workers_per_queue.get() {
            let polling_service = PollingService::new(
                queue.clone(),
                worker_id,
                cli.max_messages,
                cli.message_attribute_names.clone(),
            );
            let tx = tx.clone();

            services.spawn(async move { polling_service.run(tx).await });
        }

        let processing_service = ProcessingService::new(queue.clone());
        services.spawn(async move { processing_service.run(rx).await });
    }

    let state = QueuePollerState::new(
        queues
            .iter()
            .map(|queue| PolledQueue::new(queue.queue_url(), queue.controller().clone()))
            .collect(),
    );
    services.spawn(server::serve(cli.port, state));

    tracing::info!(
        num_queues = queues.len(),
        workers_per_queue = cli.workers_per_queue.get(),
        "Started queue poller"
    );

    // block until the first service fails/exits or we are interrupted, then abort the rest
    tokio::select! {
        r = services.join_next() => {
            if let Some(r) = r {
                log_task_result_exit("queue poller service", r);
            }
        },
        r = tokio::signal::ctrl_c() => {
            r?;
            tracing::info!("Interrupted, shutting down");
        }
    }

    services.shutdown().await;

    Ok(())
}
