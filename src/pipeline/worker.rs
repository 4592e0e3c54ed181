use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::pipeline::command::Command;
use crate::pipeline::sequencer::{ProcessOutcome, Sequencer};
use crate::pipeline::PipelineError;

/// Decouples the intake from the serialized sequencer: a bounded job queue
/// drained by a fixed number of workers.
///
/// Workers have no channel affinity; any worker may pick up any command.
/// Per-channel ordering is entirely the sequencer's responsibility.
pub struct WorkerPool {
    sequencer: Arc<Sequencer>,
    jobs: mpsc::Sender<Command>,
    intake: Mutex<Option<mpsc::Receiver<Command>>>,
    worker_count: usize,
    shutdown: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(sequencer: Arc<Sequencer>, worker_count: usize, queue_capacity: usize) -> Self {
        let (jobs, intake) = mpsc::channel(queue_capacity.max(1));
        Self {
            sequencer,
            jobs,
            intake: Mutex::new(Some(intake)),
            worker_count: worker_count.max(1),
            shutdown: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Launches the workers. A second call is a no-op.
    pub async fn start(&self) {
        let Some(intake) = self.intake.lock().await.take() else {
            warn!("worker pool already started");
            return;
        };
        let intake = Arc::new(Mutex::new(intake));

        let mut handles = self.handles.lock().await;
        for id in 1..=self.worker_count {
            let sequencer = self.sequencer.clone();
            let intake = intake.clone();
            let shutdown = self.shutdown.clone();
            handles.push(tokio::spawn(async move {
                run_worker(id, sequencer, intake, shutdown).await;
            }));
        }
        info!(workers = self.worker_count, "worker pool started");
    }

    /// Queues a command for processing, waiting while the queue is full.
    /// Fails with `Stopped` once shutdown has been signalled.
    pub async fn enqueue(&self, cmd: Command) -> Result<(), PipelineError> {
        if self.shutdown.is_cancelled() {
            return Err(PipelineError::Stopped);
        }
        tokio::select! {
            res = self.jobs.send(cmd) => res.map_err(|_| PipelineError::Stopped),
            () = self.shutdown.cancelled() => Err(PipelineError::Stopped),
        }
    }

    /// Signals every worker to exit.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Waits for all workers to exit. Call after `shutdown`.
    pub async fn wait(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().await);
        for handle in handles {
            if let Err(err) = handle.await {
                error!(error = %err, "worker task failed");
            }
        }
    }
}

async fn run_worker(
    id: usize,
    sequencer: Arc<Sequencer>,
    intake: Arc<Mutex<mpsc::Receiver<Command>>>,
    shutdown: CancellationToken,
) {
    debug!(worker = id, "worker started");
    loop {
        let cmd = {
            let mut intake = intake.lock().await;
            tokio::select! {
                () = shutdown.cancelled() => break,
                cmd = intake.recv() => cmd,
            }
        };
        let Some(cmd) = cmd else {
            break;
        };

        let channel = cmd.channel.clone();
        let sequence = cmd.sequence.value();
        let action = cmd.kind.name();
        match sequencer.process(cmd).await {
            Ok(ProcessOutcome::Applied) => {
                debug!(worker = id, channel = %channel, sequence, action, "message applied");
            }
            Ok(ProcessOutcome::Buffered) => {
                debug!(worker = id, channel = %channel, sequence, action, "message buffered");
            }
            Err(err) => {
                warn!(
                    worker = id,
                    channel = %channel,
                    sequence,
                    action,
                    error = %err,
                    "message rejected"
                );
            }
        }
    }
    debug!(worker = id, "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::values::{Channel, Mission, RocketStatus, SequenceNumber, Speed};
    use crate::pipeline::command::CommandKind;
    use crate::storage::memory::InMemoryEventLog;
    use crate::storage::rockets::RocketStore;

    fn pipeline(worker_count: usize, queue_capacity: usize) -> (Arc<RocketStore>, Arc<WorkerPool>) {
        let log = Arc::new(InMemoryEventLog::new());
        let rockets = Arc::new(RocketStore::new(log));
        let sequencer = Arc::new(Sequencer::new(rockets.clone()));
        let pool = Arc::new(WorkerPool::new(sequencer, worker_count, queue_capacity));
        (rockets, pool)
    }

    fn command(chan: &str, sequence: i64, kind: CommandKind) -> Command {
        Command {
            channel: Channel::new(chan).unwrap(),
            sequence: SequenceNumber::new(sequence).unwrap(),
            timestamp: 1_700_000_000_000 + sequence,
            kind,
        }
    }

    fn launch(chan: &str, sequence: i64, speed: i64) -> Command {
        command(
            chan,
            sequence,
            CommandKind::Launch {
                rocket_type: "Falcon-9".to_string(),
                speed: Speed::new(speed).unwrap(),
                mission: Mission::Exploration,
            },
        )
    }

    async fn wait_for_applied(rockets: &RocketStore, chan: &str, sequence: u64) {
        let channel = Channel::new(chan).unwrap();
        for _ in 0..200 {
            let rocket = rockets.get_by_channel(&channel).await.unwrap();
            if rocket.last_applied() >= sequence {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("rocket {chan} never reached sequence {sequence}");
    }

    #[tokio::test]
    async fn test_workers_process_out_of_order_stream() {
        let (rockets, pool) = pipeline(3, 100);
        pool.start().await;

        pool.enqueue(launch("W1", 1, 15000)).await.unwrap();
        pool.enqueue(command("W1", 3, CommandKind::DecreaseSpeed { delta: 2000 }))
            .await
            .unwrap();
        pool.enqueue(command("W1", 2, CommandKind::IncreaseSpeed { delta: 5000 }))
            .await
            .unwrap();

        wait_for_applied(&rockets, "W1", 3).await;

        let rocket = rockets
            .get_by_channel(&Channel::new("W1").unwrap())
            .await
            .unwrap();
        assert_eq!(rocket.status(), RocketStatus::Flying);
        assert_eq!(rocket.speed().value(), 18000);

        pool.shutdown();
        pool.wait().await;
    }

    #[tokio::test]
    async fn test_enqueue_blocks_when_queue_is_full() {
        // No workers started, capacity 1: the second enqueue must park.
        let (_rockets, pool) = pipeline(1, 1);

        pool.enqueue(launch("W2", 1, 1000)).await.unwrap();

        let blocked = tokio::time::timeout(
            Duration::from_millis(100),
            pool.enqueue(launch("W2", 2, 1000)),
        )
        .await;
        assert!(blocked.is_err(), "expected enqueue to block on a full queue");
    }

    #[tokio::test]
    async fn test_enqueue_fails_after_shutdown() {
        let (_rockets, pool) = pipeline(1, 10);
        pool.start().await;

        pool.shutdown();
        pool.wait().await;

        let err = pool.enqueue(launch("W3", 1, 1000)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Stopped));
    }

    #[tokio::test]
    async fn test_shutdown_releases_blocked_producer() {
        let (_rockets, pool) = pipeline(1, 1);

        pool.enqueue(launch("W4", 1, 1000)).await.unwrap();

        let blocked = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.enqueue(launch("W4", 2, 1000)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        pool.shutdown();
        let result = blocked.await.unwrap();
        assert!(matches!(result, Err(PipelineError::Stopped)));
    }

    #[tokio::test]
    async fn test_worker_count_has_a_floor_of_one() {
        let (rockets, pool) = pipeline(0, 10);
        pool.start().await;

        pool.enqueue(launch("W5", 1, 1000)).await.unwrap();
        wait_for_applied(&rockets, "W5", 1).await;

        pool.shutdown();
        pool.wait().await;
    }
}
