use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::values::{Channel, Mission, SequenceNumber, Speed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable record of one applied state change. The event log is the source
/// of truth for rebuilding rocket state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: EventId,
    pub channel: Channel,
    pub sequence: SequenceNumber,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    RocketLaunched {
        rocket_type: String,
        speed: Speed,
        mission: Mission,
    },
    RocketSpeedIncreased {
        delta: i64,
        old_speed: Speed,
        new_speed: Speed,
    },
    RocketSpeedDecreased {
        delta: i64,
        old_speed: Speed,
        new_speed: Speed,
    },
    RocketExploded {
        reason: String,
    },
    RocketMissionChanged {
        old_mission: Mission,
        new_mission: Mission,
    },
}

impl DomainEvent {
    pub fn new(
        channel: Channel,
        sequence: SequenceNumber,
        timestamp: i64,
        kind: EventKind,
    ) -> Self {
        Self {
            id: EventId::new(),
            channel,
            sequence,
            timestamp,
            kind,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self.kind {
            EventKind::RocketLaunched { .. } => "rocket_launched",
            EventKind::RocketSpeedIncreased { .. } => "rocket_speed_increased",
            EventKind::RocketSpeedDecreased { .. } => "rocket_speed_decreased",
            EventKind::RocketExploded { .. } => "rocket_exploded",
            EventKind::RocketMissionChanged { .. } => "rocket_mission_changed",
        }
    }

    /// Human-readable key=value summary of the payload, for the read API.
    pub fn details(&self) -> String {
        match &self.kind {
            EventKind::RocketLaunched { speed, mission, .. } => {
                format!("mission={} speed={}", mission, speed)
            }
            EventKind::RocketSpeedIncreased {
                delta, new_speed, ..
            }
            | EventKind::RocketSpeedDecreased {
                delta, new_speed, ..
            } => format!("delta={} newSpeed={}", delta, new_speed),
            EventKind::RocketExploded { reason } => format!("reason={}", reason),
            EventKind::RocketMissionChanged { new_mission, .. } => {
                format!("mission={}", new_mission)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launched(channel: &str) -> DomainEvent {
        DomainEvent::new(
            Channel::new(channel).unwrap(),
            SequenceNumber::new(1).unwrap(),
            1_700_000_000_000,
            EventKind::RocketLaunched {
                rocket_type: "Falcon-9".to_string(),
                speed: Speed::new(15000).unwrap(),
                mission: Mission::Exploration,
            },
        )
    }

    #[test]
    fn test_event_id_is_v7() {
        let event = launched("rocket-1");
        assert_eq!(event.id.0.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn test_event_types_and_details() {
        let event = launched("rocket-1");
        assert_eq!(event.event_type(), "rocket_launched");
        assert_eq!(event.details(), "mission=exploration speed=15000");

        let slowed = DomainEvent::new(
            Channel::new("rocket-1").unwrap(),
            SequenceNumber::new(2).unwrap(),
            1_700_000_000_500,
            EventKind::RocketSpeedDecreased {
                delta: 2000,
                old_speed: Speed::new(15000).unwrap(),
                new_speed: Speed::new(13000).unwrap(),
            },
        );
        assert_eq!(slowed.event_type(), "rocket_speed_decreased");
        assert_eq!(slowed.details(), "delta=2000 newSpeed=13000");
    }

    #[test]
    fn test_serialization_round_trip() {
        let event = launched("rocket-1");
        let serialized = serde_json::to_string(&event).expect("Failed to serialize");
        assert!(serialized.contains("\"type\":\"rocket_launched\""));

        let deserialized: DomainEvent =
            serde_json::from_str(&serialized).expect("Failed to deserialize");
        assert_eq!(deserialized.id, event.id);
        assert_eq!(deserialized.channel.as_str(), "rocket-1");
        assert_eq!(deserialized.sequence.value(), 1);
    }
}
