//! Test utilities for runway-core
//!
//! This module provides a mock market-data server that serves a fixed
//! snapshot, for development and integration tests.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::net::SocketAddr;
use tokio::sync::oneshot;

use crate::models::MarketSnapshot;

/// What the mock feed answers on `/snapshots/latest`
#[derive(Clone)]
enum FeedBehavior {
    Snapshot(Option<MarketSnapshot>),
    Failing,
}

/// Mock market-data server for testing and development
pub struct MockMarketServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockMarketServer {
    /// Start a server that serves `snapshot` (404 when `None`)
    pub async fn start(snapshot: Option<MarketSnapshot>) -> Self {
        Self::spawn(FeedBehavior::Snapshot(snapshot)).await
    }

    /// Start a server whose every request fails with 500
    pub async fn start_failing() -> Self {
        Self::spawn(FeedBehavior::Failing).await
    }

    async fn spawn(behavior: FeedBehavior) -> Self {
        let app = Router::new()
            .route("/snapshots/latest", get(handle_latest))
            .with_state(behavior);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockMarketServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_latest(State(behavior): State<FeedBehavior>) -> axum::response::Response {
    match behavior {
        FeedBehavior::Snapshot(Some(snapshot)) => Json(snapshot).into_response(),
        FeedBehavior::Snapshot(None) => StatusCode::NOT_FOUND.into_response(),
        FeedBehavior::Failing => {
            (StatusCode::INTERNAL_SERVER_ERROR, "feed unavailable").into_response()
        }
    }
}
