use thiserror::Error;

/// Business-rule and validation failures raised by the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("channel cannot be empty")]
    EmptyChannel,
    #[error("message number must be positive, got {0}")]
    InvalidSequence(i64),
    #[error("speed cannot be negative, got {0}")]
    NegativeSpeed(i64),
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
    /// The aggregate saw a sequence number at or below its last applied one.
    /// The sequencer filters these before the apply path, so hitting this
    /// from there is a programmer error.
    #[error("message {sequence} out of order, last applied {last_applied}")]
    OutOfOrder { sequence: u64, last_applied: u64 },
    #[error("rocket already launched")]
    AlreadyLaunched,
    #[error("rocket already exploded")]
    AlreadyExploded,
}
