use axum::{
    extract::{Query, State},
    Json,
};
use common::adaptive_polling::{PollingSnapshot, VolumeClass};
use serde::{Deserialize, Serialize};

use crate::{
    errors::AppError,
    services::server::{PolledQueue, QueuePollerState},
};

/// Restricts a request to the queue with this name. All queues when absent.
#[derive(Debug, Deserialize)]
pub struct QueueFilter {
    pub queue: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueuePollingStatus {
    pub queue_name: String,
    pub queue_url: String,
    pub volume_class: VolumeClass,
    pub wait_time_seconds: u64,
    #[serde(flatten)]
    pub state: PollingSnapshot,
}

impl QueuePollingStatus {
    fn of(queue: &PolledQueue) -> Self {
        let controller = &queue.controller;

        QueuePollingStatus {
            queue_name: queue.name.clone(),
            queue_url: queue.url.clone(),
            volume_class: controller.volume_class(),
            wait_time_seconds: controller.next_wait_time().as_secs(),
            state: controller.snapshot(),
        }
    }
}

fn select_queues<'a>(
    state: &'a QueuePollerState,
    filter: &QueueFilter,
) -> Result<Vec<&'a PolledQueue>, AppError> {
    let Some(name) = &filter.queue else {
        return Ok(state.queues.iter().collect());
    };

    let selected = state
        .queues
        .iter()
        .filter(|queue| &queue.name == name)
        .collect::<Vec<_>>();

    if selected.is_empty() {
        return Err(AppError::QueueNotFound(name.clone()));
    }

    Ok(selected)
}

pub async fn get_adaptive_polling(
    State(state): State<QueuePollerState>,
    Query(filter): Query<QueueFilter>,
) -> Result<Json<Vec<QueuePollingStatus>>, AppError> {
    let statuses = select_queues(&state, &filter)?
        .into_iter()
        .map(QueuePollingStatus::of)
        .collect();

    Ok(Json(statuses))
}

pub async fn post_enable(
    State(state): State<QueuePollerState>,
    Query(filter): Query<QueueFilter>,
) -> Result<Json<Vec<QueuePollingStatus>>, AppError> {
    let queues = select_queues(&state, &filter)?;

    for queue in &queues {
        queue.controller.enable();
    }

    tracing::info!(num_queues = queues.len(), "Enabled adaptive polling");

    Ok(Json(queues.into_iter().map(QueuePollingStatus::of).collect()))
}

pub async fn post_disable(
    State(state): State<QueuePollerState>,
    Query(filter): Query<QueueFilter>,
) -> Result<Json<Vec<QueuePollingStatus>>, AppError> {
    let queues = select_queues(&state, &filter)?;

    for queue in &queues {
        queue.controller.disable();
    }

    tracing::info!(num_queues = queues.len(), "Disabled adaptive polling");

    Ok(Json(queues.into_iter().map(QueuePollingStatus::of).collect()))
}
