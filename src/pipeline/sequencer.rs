use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::rocket::Rocket;
use crate::domain::values::Channel;
use crate::pipeline::command::{Command, CommandKind};
use crate::pipeline::PipelineError;
use crate::storage::rockets::RocketStore;

/// Serializes command processing so that, per channel, events are applied
/// exactly in sequence order starting from 1, each at most once.
///
/// Every incoming command is classified against the channel's next expected
/// sequence number: the expected one is applied (followed by a drain of the
/// contiguous buffered prefix), a future one is buffered, and anything at or
/// below the last applied number is rejected as stale. One lock covers
/// classification, the apply path, the drain loop and all buffer mutation;
/// workers on different channels simply queue behind it.
pub struct Sequencer {
    rockets: Arc<RocketStore>,
    // Key: channel, Value: future commands by sequence number
    pending: Mutex<HashMap<String, HashMap<u64, Command>>>,
}

/// How the sequencer disposed of an accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Applied, along with any now-contiguous buffered successors.
    Applied,
    /// Ahead of the expected sequence; parked until the gap fills.
    Buffered,
}

/// Snapshot of one channel's pending buffer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferStatus {
    pub channel: String,
    pub expected_next: u64,
    pub buffered_messages: Vec<u64>,
}

impl Sequencer {
    pub fn new(rockets: Arc<RocketStore>) -> Self {
        Self {
            rockets,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub async fn process(&self, cmd: Command) -> Result<ProcessOutcome, PipelineError> {
        let mut pending = self.pending.lock().await;

        let mut rocket = self.rockets.get_by_channel(&cmd.channel).await?;
        let expected = rocket.last_applied() + 1;
        let sequence = cmd.sequence.value();

        debug!(
            channel = %cmd.channel,
            sequence,
            expected,
            action = cmd.kind.name(),
            "classifying message"
        );

        if sequence == expected {
            let channel = cmd.channel.clone();
            self.apply(&mut rocket, cmd).await?;
            self.drain(&mut pending, &mut rocket, &channel).await;
            Ok(ProcessOutcome::Applied)
        } else if sequence > expected {
            let buffered = pending.entry(cmd.channel.as_str().to_string()).or_default();
            if buffered.contains_key(&sequence) {
                // Duplicate future delivery: the latest copy wins.
                warn!(channel = %cmd.channel, sequence, "replacing buffered duplicate");
            }
            info!(
                channel = %cmd.channel,
                sequence,
                waiting_for = expected,
                "buffered future message"
            );
            buffered.insert(sequence, cmd);
            Ok(ProcessOutcome::Buffered)
        } else {
            info!(channel = %cmd.channel, sequence, expected, "rejecting stale message");
            Err(PipelineError::Stale { sequence, expected })
        }
    }

    /// Snapshot of every channel with a non-empty buffer.
    pub async fn buffer_status(&self) -> Result<Vec<BufferStatus>, PipelineError> {
        let pending = self.pending.lock().await;

        let mut status = Vec::with_capacity(pending.len());
        for (channel, buffered) in pending.iter() {
            let chan = Channel::new(channel.clone())?;
            let rocket = self.rockets.get_by_channel(&chan).await?;

            let mut buffered_messages: Vec<u64> = buffered.keys().copied().collect();
            buffered_messages.sort_unstable();

            status.push(BufferStatus {
                channel: channel.clone(),
                expected_next: rocket.last_applied() + 1,
                buffered_messages,
            });
        }
        status.sort_by(|a, b| a.channel.cmp(&b.channel));
        Ok(status)
    }

    async fn apply(&self, rocket: &mut Rocket, cmd: Command) -> Result<(), PipelineError> {
        match cmd.kind {
            CommandKind::Launch {
                rocket_type,
                speed,
                mission,
            } => rocket.launch(cmd.sequence, rocket_type, speed, mission, cmd.timestamp)?,
            CommandKind::IncreaseSpeed { delta } => {
                rocket.increase_speed(cmd.sequence, delta, cmd.timestamp)?
            }
            CommandKind::DecreaseSpeed { delta } => {
                rocket.decrease_speed(cmd.sequence, delta, cmd.timestamp)?
            }
            CommandKind::Explode { reason } => {
                rocket.explode(cmd.sequence, reason, cmd.timestamp)?
            }
            CommandKind::ChangeMission { mission } => {
                rocket.change_mission(cmd.sequence, mission, cmd.timestamp)?
            }
        }
        self.rockets.save(rocket).await?;
        Ok(())
    }

    /// Applies the contiguous prefix of buffered successors.
    ///
    /// A buffered command that fails is removed and the drain stops; its
    /// failure is logged rather than surfaced, because the triggering
    /// request already succeeded and the buffered command has no caller of
    /// its own.
    async fn drain(
        &self,
        pending: &mut HashMap<String, HashMap<u64, Command>>,
        rocket: &mut Rocket,
        channel: &Channel,
    ) {
        let Some(buffered) = pending.get_mut(channel.as_str()) else {
            return;
        };

        while let Some(next) = buffered.remove(&(rocket.last_applied() + 1)) {
            let sequence = next.sequence.value();
            let action = next.kind.name();
            debug!(channel = %channel, sequence, action, "applying buffered message");

            if let Err(err) = self.apply(rocket, next).await {
                warn!(
                    channel = %channel,
                    sequence,
                    action,
                    error = %err,
                    "dropping buffered message"
                );
                break;
            }
        }

        if buffered.is_empty() {
            pending.remove(channel.as_str());
        }
    }
}
