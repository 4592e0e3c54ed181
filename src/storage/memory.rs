use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::events::event::DomainEvent;
use crate::domain::values::Channel;
use crate::storage::event_log::{EventLog, EventLogError};

/// In-memory stand-in for a durable event log. Reads share the lock,
/// appends take it exclusively.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    // Key: channel, Value: events in append order
    store: RwLock<HashMap<String, Vec<DomainEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, event: DomainEvent) -> Result<(), EventLogError> {
        let mut store = self
            .store
            .write()
            .map_err(|_| EventLogError::Unknown("Lock poison".to_string()))?;

        store
            .entry(event.channel.as_str().to_string())
            .or_default()
            .push(event);

        Ok(())
    }

    async fn events_for_channel(
        &self,
        channel: &Channel,
    ) -> Result<Vec<DomainEvent>, EventLogError> {
        let store = self
            .store
            .read()
            .map_err(|_| EventLogError::Unknown("Lock poison".to_string()))?;

        match store.get(channel.as_str()) {
            Some(events) => Ok(events.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn channels(&self) -> Result<Vec<String>, EventLogError> {
        let store = self
            .store
            .read()
            .map_err(|_| EventLogError::Unknown("Lock poison".to_string()))?;

        Ok(store.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::event::EventKind;
    use crate::domain::values::{Mission, SequenceNumber, Speed};

    fn event(channel: &str, sequence: i64) -> DomainEvent {
        DomainEvent::new(
            Channel::new(channel).unwrap(),
            SequenceNumber::new(sequence).unwrap(),
            1_700_000_000_000 + sequence,
            EventKind::RocketLaunched {
                rocket_type: "Falcon-9".to_string(),
                speed: Speed::new(15000).unwrap(),
                mission: Mission::Exploration,
            },
        )
    }

    #[tokio::test]
    async fn test_append_and_load() {
        let log = InMemoryEventLog::new();
        let first = event("rocket-1", 1);

        log.append(first.clone()).await.expect("Append failed");

        let channel = Channel::new("rocket-1").unwrap();
        let loaded = log.events_for_channel(&channel).await.expect("Load failed");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, first.id);
    }

    #[tokio::test]
    async fn test_load_empty() {
        let log = InMemoryEventLog::new();
        let channel = Channel::new("non-existent").unwrap();
        let loaded = log.events_for_channel(&channel).await.expect("Load failed");
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_preserves_append_order() {
        let log = InMemoryEventLog::new();
        for sequence in 1..=5 {
            log.append(event("rocket-1", sequence)).await.unwrap();
        }

        let channel = Channel::new("rocket-1").unwrap();
        let loaded = log.events_for_channel(&channel).await.unwrap();
        let sequences: Vec<u64> = loaded.iter().map(|e| e.sequence.value()).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_channels_lists_only_non_empty() {
        let log = InMemoryEventLog::new();
        assert!(log.channels().await.unwrap().is_empty());

        log.append(event("rocket-a", 1)).await.unwrap();
        log.append(event("rocket-b", 1)).await.unwrap();

        let mut channels = log.channels().await.unwrap();
        channels.sort();
        assert_eq!(channels, vec!["rocket-a", "rocket-b"]);
    }

    #[tokio::test]
    async fn test_reads_return_defensive_copies() {
        let log = InMemoryEventLog::new();
        log.append(event("rocket-1", 1)).await.unwrap();

        let channel = Channel::new("rocket-1").unwrap();
        let mut copy = log.events_for_channel(&channel).await.unwrap();
        copy.clear();

        assert_eq!(log.events_for_channel(&channel).await.unwrap().len(), 1);
    }
}
