use tracing::info;

use crate::domain::error::DomainError;
use crate::domain::events::event::{DomainEvent, EventKind};
use crate::domain::values::{Channel, Mission, RocketStatus, SequenceNumber, Speed};

/// Aggregate root for a single rocket.
///
/// State changes only by applying events. Every command validates the
/// supplied sequence number against the last applied one and the current
/// status before emitting its event; successful commands accumulate events
/// in the uncommitted list until the store persists them.
#[derive(Debug, Clone)]
pub struct Rocket {
    channel: Channel,
    rocket_type: String,
    status: RocketStatus,
    speed: Speed,
    mission: Mission,
    last_applied: u64,
    uncommitted: Vec<DomainEvent>,
}

impl Rocket {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            rocket_type: "unknown".to_string(),
            status: RocketStatus::Launched,
            speed: Speed::zero(),
            mission: Mission::Unknown,
            last_applied: 0,
            uncommitted: Vec::new(),
        }
    }

    pub fn launch(
        &mut self,
        sequence: SequenceNumber,
        rocket_type: impl Into<String>,
        speed: Speed,
        mission: Mission,
        timestamp: i64,
    ) -> Result<(), DomainError> {
        if self.status != RocketStatus::Launched {
            return Err(DomainError::AlreadyLaunched);
        }
        self.check_sequence(sequence)?;

        info!(
            channel = %self.channel,
            sequence = sequence.value(),
            speed = speed.value(),
            mission = %mission,
            "applying RocketLaunched"
        );

        self.record(DomainEvent::new(
            self.channel.clone(),
            sequence,
            timestamp,
            EventKind::RocketLaunched {
                rocket_type: rocket_type.into(),
                speed,
                mission,
            },
        ));
        Ok(())
    }

    pub fn increase_speed(
        &mut self,
        sequence: SequenceNumber,
        delta: i64,
        timestamp: i64,
    ) -> Result<(), DomainError> {
        if self.status == RocketStatus::Exploded {
            return Err(DomainError::AlreadyExploded);
        }
        self.check_sequence(sequence)?;

        let new_speed = self.speed.increase(delta);
        info!(
            channel = %self.channel,
            sequence = sequence.value(),
            before = self.speed.value(),
            after = new_speed.value(),
            delta,
            "applying RocketSpeedIncreased"
        );

        self.record(DomainEvent::new(
            self.channel.clone(),
            sequence,
            timestamp,
            EventKind::RocketSpeedIncreased {
                delta,
                old_speed: self.speed,
                new_speed,
            },
        ));
        Ok(())
    }

    pub fn decrease_speed(
        &mut self,
        sequence: SequenceNumber,
        delta: i64,
        timestamp: i64,
    ) -> Result<(), DomainError> {
        if self.status == RocketStatus::Exploded {
            return Err(DomainError::AlreadyExploded);
        }
        self.check_sequence(sequence)?;

        let new_speed = self.speed.decrease(delta);
        info!(
            channel = %self.channel,
            sequence = sequence.value(),
            before = self.speed.value(),
            after = new_speed.value(),
            delta,
            "applying RocketSpeedDecreased"
        );

        self.record(DomainEvent::new(
            self.channel.clone(),
            sequence,
            timestamp,
            EventKind::RocketSpeedDecreased {
                delta,
                old_speed: self.speed,
                new_speed,
            },
        ));
        Ok(())
    }

    pub fn explode(
        &mut self,
        sequence: SequenceNumber,
        reason: impl Into<String>,
        timestamp: i64,
    ) -> Result<(), DomainError> {
        if self.status == RocketStatus::Exploded {
            return Err(DomainError::AlreadyExploded);
        }
        self.check_sequence(sequence)?;

        let reason = reason.into();
        info!(
            channel = %self.channel,
            sequence = sequence.value(),
            reason = %reason,
            "applying RocketExploded"
        );

        self.record(DomainEvent::new(
            self.channel.clone(),
            sequence,
            timestamp,
            EventKind::RocketExploded { reason },
        ));
        Ok(())
    }

    pub fn change_mission(
        &mut self,
        sequence: SequenceNumber,
        new_mission: Mission,
        timestamp: i64,
    ) -> Result<(), DomainError> {
        if self.status == RocketStatus::Exploded {
            return Err(DomainError::AlreadyExploded);
        }
        self.check_sequence(sequence)?;

        info!(
            channel = %self.channel,
            sequence = sequence.value(),
            mission = %new_mission,
            "applying RocketMissionChanged"
        );

        self.record(DomainEvent::new(
            self.channel.clone(),
            sequence,
            timestamp,
            EventKind::RocketMissionChanged {
                old_mission: self.mission,
                new_mission,
            },
        ));
        Ok(())
    }

    /// Rebuilds state from persisted history. History is valid by
    /// definition, so no preconditions are re-checked and nothing lands in
    /// the uncommitted list.
    pub fn load_from_history(&mut self, events: &[DomainEvent]) {
        for event in events {
            self.apply(event);
        }
    }

    /// Returns and clears the pending event list. The store calls this once
    /// all events have been appended to the log.
    pub fn take_uncommitted(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.uncommitted)
    }

    pub fn uncommitted_events(&self) -> &[DomainEvent] {
        &self.uncommitted
    }

    fn check_sequence(&self, sequence: SequenceNumber) -> Result<(), DomainError> {
        if sequence.value() <= self.last_applied {
            return Err(DomainError::OutOfOrder {
                sequence: sequence.value(),
                last_applied: self.last_applied,
            });
        }
        Ok(())
    }

    fn record(&mut self, event: DomainEvent) {
        self.apply(&event);
        self.uncommitted.push(event);
    }

    fn apply(&mut self, event: &DomainEvent) {
        self.last_applied = event.sequence.value();
        match &event.kind {
            EventKind::RocketLaunched {
                rocket_type,
                speed,
                mission,
            } => {
                self.status = RocketStatus::Flying;
                self.rocket_type = rocket_type.clone();
                self.speed = *speed;
                self.mission = *mission;
            }
            EventKind::RocketSpeedIncreased { new_speed, .. }
            | EventKind::RocketSpeedDecreased { new_speed, .. } => {
                self.speed = *new_speed;
            }
            EventKind::RocketExploded { .. } => {
                self.status = RocketStatus::Exploded;
            }
            EventKind::RocketMissionChanged { new_mission, .. } => {
                self.mission = *new_mission;
            }
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn rocket_type(&self) -> &str {
        &self.rocket_type
    }

    pub fn status(&self) -> RocketStatus {
        self.status
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn mission(&self) -> Mission {
        self.mission
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }
}
