pub mod envelope;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::pipeline::{Sequencer, WorkerPool};
use crate::storage::event_log::EventLog;
use crate::storage::rockets::RocketStore;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<WorkerPool>,
    pub sequencer: Arc<Sequencer>,
    pub rockets: Arc<RocketStore>,
    pub log: Arc<dyn EventLog>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/messages", post(handlers::post_message))
        .route("/rockets", get(handlers::list_rockets))
        .route("/rockets/:channel", get(handlers::get_rocket))
        .route("/rockets/:channel/events", get(handlers::list_events))
        .route("/debug/buffer", get(handlers::buffer_status))
        .with_state(state)
}
