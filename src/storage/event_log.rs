use async_trait::async_trait;

use crate::domain::events::event::DomainEvent;
use crate::domain::values::Channel;

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Append-only, per-channel ordered event persistence.
///
/// Arrival order per channel equals ascending sequence order by the
/// sequencer's contract; implementations only have to preserve it. All
/// operations are safe under concurrent invocation and reads never observe
/// a partially appended event.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Appends to the tail of the event's channel.
    async fn append(&self, event: DomainEvent) -> Result<(), EventLogError>;

    /// Events of one channel in append order. Returns a copy.
    async fn events_for_channel(
        &self,
        channel: &Channel,
    ) -> Result<Vec<DomainEvent>, EventLogError>;

    /// Channels that have at least one event.
    async fn channels(&self) -> Result<Vec<String>, EventLogError>;
}
