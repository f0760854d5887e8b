use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use common::adaptive_polling::AdaptivePollingController;
use common::aws::sqs::queue_name_from_url;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::controllers::{
    adaptive_polling::{get_adaptive_polling, post_disable, post_enable},
    general::get_healthcheck,
};

/// A polled queue as seen by the admin API.
#[derive(Clone, Debug)]
pub struct PolledQueue {
    pub name: String,
    pub url: String,
    pub controller: AdaptivePollingController,
}

impl PolledQueue {
    pub fn new(url: impl Into<String>, controller: AdaptivePollingController) -> Self {
        let url = url.into();
        let name = queue_name_from_url(&url).to_owned();

        Self {
            name,
            url,
            controller,
        }
    }
}

#[derive(Clone, FromRef)]
pub struct QueuePollerState {
    pub queues: Arc<Vec<PolledQueue>>,
}

impl QueuePollerState {
    pub fn new(queues: Vec<PolledQueue>) -> Self {
        QueuePollerState {
            queues: Arc::new(queues),
        }
    }
}

pub fn router(state: QueuePollerState) -> Router {
    let app = Router::new()
        .route("/healthcheck", get(get_healthcheck))
        .route("/adaptive-polling", get(get_adaptive_polling))
        .route("/adaptive-polling/enable", post(post_enable))
        .route("/adaptive-polling/disable", post(post_disable));

    Router::new()
        .nest("/v1/", app)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(port: u16, state: QueuePollerState) -> anyhow::Result<()> {
    let app = router(state);

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port);

    tracing::info!("Starting server on http://{:?}", socket_addr);
    let listener = TcpListener::bind(&socket_addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
