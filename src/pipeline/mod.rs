pub mod command;
pub mod sequencer;
pub mod worker;

pub use command::{Command, CommandKind};
pub use sequencer::{BufferStatus, ProcessOutcome, Sequencer};
pub use worker::WorkerPool;

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::storage::event_log::EventLogError;

/// Failures surfaced by the delivery pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The sequence number is at or below what has already been applied for
    /// the channel: a duplicate or re-delivery.
    #[error("message {sequence} already processed (expected {expected})")]
    Stale { sequence: u64, expected: u64 },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Storage(#[from] EventLogError),
    #[error("worker pool stopped")]
    Stopped,
}
