use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::error::DomainError;
use crate::domain::values::{Channel, Mission, SequenceNumber, Speed};
use crate::pipeline::command::{Command, CommandKind};

/// Telemetry envelope as posted by the producer.
#[derive(Debug, Deserialize)]
pub struct TelemetryMessage {
    pub metadata: Metadata,
    #[serde(default)]
    pub message: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub message_number: i64,
    #[serde(default)]
    pub message_time: String,
    pub message_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LaunchPayload {
    #[serde(rename = "type")]
    rocket_type: String,
    launch_speed: i64,
    mission: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SpeedPayload {
    by: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExplodePayload {
    reason: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MissionPayload {
    new_mission: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("invalid messageTime: {0}")]
    InvalidTime(String),
    #[error("invalid message payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

// Fallback identity for producers that omit the message number.
static SEQUENCE_FALLBACK: AtomicI64 = AtomicI64::new(0);

impl TelemetryMessage {
    /// Translates the wire envelope into the internal command shape.
    ///
    /// Missing identity fields are repaired here, never in the core: an
    /// empty channel gets a generated one, a non-positive message number is
    /// assigned from a process-wide counter, and a non-positive timestamp
    /// becomes the current wall-clock time.
    pub fn into_command(self) -> Result<Command, EnvelopeError> {
        let timestamp = parse_message_time(&self.metadata.message_time)?;

        let kind = match self.metadata.message_type.as_str() {
            "RocketLaunched" => {
                let p: LaunchPayload = payload(self.message)?;
                let rocket_type = if p.rocket_type.is_empty() {
                    "unknown".to_string()
                } else {
                    p.rocket_type
                };
                CommandKind::Launch {
                    rocket_type,
                    speed: Speed::new(p.launch_speed)?,
                    mission: Mission::parse(&p.mission),
                }
            }
            "RocketSpeedIncreased" => {
                let p: SpeedPayload = payload(self.message)?;
                CommandKind::IncreaseSpeed { delta: p.by }
            }
            "RocketSpeedDecreased" => {
                let p: SpeedPayload = payload(self.message)?;
                CommandKind::DecreaseSpeed { delta: p.by }
            }
            "RocketExploded" => {
                let p: ExplodePayload = payload(self.message)?;
                CommandKind::Explode { reason: p.reason }
            }
            "RocketMissionChanged" => {
                let p: MissionPayload = payload(self.message)?;
                CommandKind::ChangeMission {
                    mission: Mission::parse(&p.new_mission),
                }
            }
            other => {
                return Err(DomainError::UnknownMessageType(other.to_string()).into());
            }
        };

        let channel = if self.metadata.channel.trim().is_empty() {
            let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
            Channel::new(format!("rocket-{nanos}"))?
        } else {
            Channel::new(self.metadata.channel)?
        };

        let sequence = if self.metadata.message_number > 0 {
            SequenceNumber::new(self.metadata.message_number)?
        } else {
            SequenceNumber::new(SEQUENCE_FALLBACK.fetch_add(1, Ordering::SeqCst) + 1)?
        };

        Ok(Command {
            channel,
            sequence,
            timestamp,
            kind,
        })
    }
}

fn payload<T: DeserializeOwned + Default>(message: Value) -> Result<T, serde_json::Error> {
    if message.is_null() {
        Ok(T::default())
    } else {
        serde_json::from_value(message)
    }
}

/// ISO-8601 with or without sub-second precision, to ms since the epoch.
fn parse_message_time(value: &str) -> Result<i64, EnvelopeError> {
    if value.trim().is_empty() {
        return Ok(Utc::now().timestamp_millis());
    }

    let parsed = DateTime::parse_from_rfc3339(value)
        .map_err(|_| EnvelopeError::InvalidTime(value.to_string()))?;

    let millis = parsed.timestamp_millis();
    if millis <= 0 {
        return Ok(Utc::now().timestamp_millis());
    }
    Ok(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(body: &str) -> TelemetryMessage {
        serde_json::from_str(body).expect("Failed to parse envelope")
    }

    #[test]
    fn test_launch_envelope_to_command() {
        let cmd = envelope(
            r#"{
                "metadata": {
                    "channel": "193270a9-c9cf-404a-8f83-838e71d9ae67",
                    "messageNumber": 1,
                    "messageTime": "2022-02-02T19:39:05.86337+01:00",
                    "messageType": "RocketLaunched"
                },
                "message": {
                    "type": "Falcon-9",
                    "launchSpeed": 500,
                    "mission": "ARTEMIS"
                }
            }"#,
        )
        .into_command()
        .expect("Failed to convert");

        assert_eq!(cmd.channel.as_str(), "193270a9-c9cf-404a-8f83-838e71d9ae67");
        assert_eq!(cmd.sequence.value(), 1);
        assert_eq!(cmd.timestamp, 1_643_827_145_863);
        match cmd.kind {
            CommandKind::Launch {
                rocket_type,
                speed,
                mission,
            } => {
                assert_eq!(rocket_type, "Falcon-9");
                assert_eq!(speed.value(), 500);
                assert_eq!(mission, Mission::Unknown);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_time_without_subseconds() {
        let cmd = envelope(
            r#"{
                "metadata": {
                    "channel": "c1",
                    "messageNumber": 2,
                    "messageTime": "2022-02-02T19:39:05Z",
                    "messageType": "RocketSpeedIncreased"
                },
                "message": {"by": 3000}
            }"#,
        )
        .into_command()
        .unwrap();

        assert_eq!(cmd.timestamp, 1_643_830_745_000);
        assert!(matches!(cmd.kind, CommandKind::IncreaseSpeed { delta: 3000 }));
    }

    #[test]
    fn test_invalid_time_is_rejected() {
        let err = envelope(
            r#"{
                "metadata": {
                    "channel": "c1",
                    "messageNumber": 1,
                    "messageTime": "yesterday",
                    "messageType": "RocketExploded"
                },
                "message": {"reason": "test"}
            }"#,
        )
        .into_command()
        .unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidTime(_)));
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        let err = envelope(
            r#"{
                "metadata": {
                    "channel": "c1",
                    "messageNumber": 1,
                    "messageTime": "2022-02-02T19:39:05Z",
                    "messageType": "RocketTeleported"
                },
                "message": {}
            }"#,
        )
        .into_command()
        .unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::Domain(DomainError::UnknownMessageType(_))
        ));
    }

    #[test]
    fn test_negative_launch_speed_is_rejected() {
        let err = envelope(
            r#"{
                "metadata": {
                    "channel": "c1",
                    "messageNumber": 1,
                    "messageTime": "2022-02-02T19:39:05Z",
                    "messageType": "RocketLaunched"
                },
                "message": {"type": "Falcon-9", "launchSpeed": -5, "mission": "resupply"}
            }"#,
        )
        .into_command()
        .unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::Domain(DomainError::NegativeSpeed(-5))
        ));
    }

    #[test]
    fn test_missing_identity_fields_are_repaired() {
        let cmd = envelope(
            r#"{
                "metadata": {
                    "messageType": "RocketMissionChanged"
                },
                "message": {"newMission": "Satellite"}
            }"#,
        )
        .into_command()
        .unwrap();

        assert!(cmd.channel.as_str().starts_with("rocket-"));
        assert!(cmd.sequence.value() >= 1);
        assert!(cmd.timestamp > 0);
        assert!(matches!(
            cmd.kind,
            CommandKind::ChangeMission {
                mission: Mission::Satellite
            }
        ));
    }

    #[test]
    fn test_mission_defaults_to_unknown_for_empty_payload() {
        let cmd = envelope(
            r#"{
                "metadata": {
                    "channel": "c1",
                    "messageNumber": 1,
                    "messageTime": "2022-02-02T19:39:05Z",
                    "messageType": "RocketLaunched"
                }
            }"#,
        )
        .into_command()
        .unwrap();

        match cmd.kind {
            CommandKind::Launch {
                rocket_type,
                speed,
                mission,
            } => {
                assert_eq!(rocket_type, "unknown");
                assert_eq!(speed.value(), 0);
                assert_eq!(mission, Mission::Unknown);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
