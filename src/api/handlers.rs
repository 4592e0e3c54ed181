use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::api::envelope::TelemetryMessage;
use crate::api::error::ApiError;
use crate::api::AppState;
use crate::domain::events::event::DomainEvent;
use crate::domain::rocket::Rocket;
use crate::domain::values::Channel;
use crate::pipeline::sequencer::BufferStatus;

#[derive(Debug, Serialize)]
pub struct RocketView {
    pub channel: String,
    #[serde(rename = "type")]
    pub rocket_type: String,
    pub status: String,
    pub speed: u64,
    pub mission: String,
}

impl From<&Rocket> for RocketView {
    fn from(rocket: &Rocket) -> Self {
        Self {
            channel: rocket.channel().as_str().to_string(),
            rocket_type: rocket.rocket_type().to_string(),
            status: rocket.status().as_str().to_string(),
            speed: rocket.speed().value(),
            mission: rocket.mission().as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    #[serde(rename = "type")]
    pub event_type: String,
    pub message_number: u64,
    pub timestamp: i64,
    pub details: String,
}

impl From<&DomainEvent> for EventView {
    fn from(event: &DomainEvent) -> Self {
        Self {
            event_type: event.event_type().to_string(),
            message_number: event.sequence.value(),
            timestamp: event.timestamp,
            details: event.details(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn post_message(
    State(state): State<AppState>,
    Json(envelope): Json<TelemetryMessage>,
) -> Result<(StatusCode, Json<QueuedResponse>), ApiError> {
    info!(
        channel = %envelope.metadata.channel,
        sequence = envelope.metadata.message_number,
        message_type = %envelope.metadata.message_type,
        "received message"
    );

    let cmd = envelope.into_command()?;
    state.pool.enqueue(cmd).await?;

    Ok((StatusCode::ACCEPTED, Json(QueuedResponse { status: "queued" })))
}

pub async fn list_rockets(
    State(state): State<AppState>,
) -> Result<Json<Vec<RocketView>>, ApiError> {
    let mut rockets = state.rockets.all().await?;
    rockets.sort_by(|a, b| a.channel().as_str().cmp(b.channel().as_str()));
    Ok(Json(rockets.iter().map(RocketView::from).collect()))
}

pub async fn get_rocket(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Json<RocketView>, ApiError> {
    let channel = Channel::new(channel)?;
    let rocket = state.rockets.get_by_channel(&channel).await?;
    if rocket.last_applied() == 0 {
        return Err(ApiError::not_found("rocket", channel.as_str()));
    }
    Ok(Json(RocketView::from(&rocket)))
}

pub async fn list_events(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let channel = Channel::new(channel)?;
    let events = state.log.events_for_channel(&channel).await?;
    if events.is_empty() {
        return Err(ApiError::not_found("rocket", channel.as_str()));
    }
    Ok(Json(events.iter().map(EventView::from).collect()))
}

pub async fn buffer_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<BufferStatus>>, ApiError> {
    Ok(Json(state.sequencer.buffer_status().await?))
}
