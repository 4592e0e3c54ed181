use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Opaque identity of one rocket's message stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel(String);

impl Channel {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyChannel);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-channel monotonically increasing message index. Always positive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::InvalidSequence(value));
        }
        Ok(Self(value as u64))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Speed in km/h. Never negative; arithmetic saturates at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speed(u64);

impl Speed {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 0 {
            return Err(DomainError::NegativeSpeed(value));
        }
        Ok(Self(value as u64))
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn increase(&self, delta: i64) -> Self {
        Self((self.0 as i64).saturating_add(delta).max(0) as u64)
    }

    pub fn decrease(&self, delta: i64) -> Self {
        Self((self.0 as i64).saturating_sub(delta).max(0) as u64)
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The rocket's assigned mission. Unrecognized values map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mission {
    Exploration,
    Satellite,
    Resupply,
    Unknown,
}

impl Mission {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "exploration" => Self::Exploration,
            "satellite" => Self::Satellite,
            "resupply" => Self::Resupply,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Satellite => "satellite",
            Self::Resupply => "resupply",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status. `Launched` is the pre-flight sentinel a fresh rocket
/// starts in; a successful launch moves it to `Flying`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RocketStatus {
    Launched,
    Flying,
    Exploded,
}

impl RocketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Launched => "launched",
            Self::Flying => "flying",
            Self::Exploded => "exploded",
        }
    }
}

impl fmt::Display for RocketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
