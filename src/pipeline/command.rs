use crate::domain::values::{Channel, Mission, SequenceNumber, Speed};

/// Validated intent to mutate one rocket, consumed by the sequencer.
#[derive(Debug, Clone)]
pub struct Command {
    pub channel: Channel,
    pub sequence: SequenceNumber,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub kind: CommandKind,
}

#[derive(Debug, Clone)]
pub enum CommandKind {
    Launch {
        rocket_type: String,
        speed: Speed,
        mission: Mission,
    },
    IncreaseSpeed {
        delta: i64,
    },
    DecreaseSpeed {
        delta: i64,
    },
    Explode {
        reason: String,
    },
    ChangeMission {
        mission: Mission,
    },
}

impl CommandKind {
    /// Short action name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Launch { .. } => "launch",
            Self::IncreaseSpeed { .. } => "increase_speed",
            Self::DecreaseSpeed { .. } => "decrease_speed",
            Self::Explode { .. } => "explode",
            Self::ChangeMission { .. } => "change_mission",
        }
    }
}
