//! The scheduler actor.
//!
//! One task owns the FIFO queue, the idle-worker list and the in-flight map. Every
//! mutation arrives as a [`Command`], so a job can be dispatched to at most one worker and
//! resolved at most once.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ahash::AHashMap;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use super::PoolStats;
use super::job::{Job, JobId, JobOutcome};
use super::worker::{Assignment, WorkerHandle, WorkerReport};
use crate::LekhaError;
use crate::types::PassFailure;

pub(crate) enum Command {
    Submit {
        job: Job,
        reply: oneshot::Sender<JobOutcome>,
        dispatched: oneshot::Sender<()>,
    },
    Cancel(JobId),
    Timeout(JobId),
    Finished {
        worker: usize,
        job_id: JobId,
        report: WorkerReport,
    },
    Shutdown,
}

struct QueuedJob {
    job: Job,
    reply: oneshot::Sender<JobOutcome>,
    /// Fired once a worker accepts the job. Dropped unfired if it never starts.
    dispatched: oneshot::Sender<()>,
}

struct InFlight {
    worker: usize,
    cancelled: Arc<AtomicBool>,
    /// `None` once the caller has been answered early (cancel, timeout, shutdown).
    reply: Option<oneshot::Sender<JobOutcome>>,
}

pub(crate) struct Scheduler {
    queue: VecDeque<QueuedJob>,
    idle: VecDeque<usize>,
    workers: Vec<WorkerHandle>,
    in_flight: AHashMap<JobId, InFlight>,
    job_timeout: Option<Duration>,
    commands: mpsc::WeakUnboundedSender<Command>,
    stats: Arc<Mutex<PoolStats>>,
}

impl Scheduler {
    pub(crate) fn new(
        workers: Vec<WorkerHandle>,
        job_timeout: Option<Duration>,
        commands: mpsc::WeakUnboundedSender<Command>,
        stats: Arc<Mutex<PoolStats>>,
    ) -> Self {
        let idle = workers.iter().map(|w| w.index).collect();
        Self {
            queue: VecDeque::new(),
            idle,
            workers,
            in_flight: AHashMap::new(),
            job_timeout,
            commands,
            stats,
        }
    }

    pub(crate) async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        self.publish_stats();

        while let Some(command) = receiver.recv().await {
            let keep_running = self.handle(command);
            self.publish_stats();
            if !keep_running {
                break;
            }
        }

        tracing::debug!("scheduler stopped");
    }

    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Submit { job, reply, dispatched } => {
                tracing::debug!(job = %job.id, config = %job.config.name, queued = self.queue.len(), "job submitted");
                self.queue.push_back(QueuedJob { job, reply, dispatched });
                self.dispatch();
            }
            Command::Cancel(job_id) => self.cancel(job_id),
            Command::Timeout(job_id) => self.time_out(job_id),
            Command::Finished { worker, job_id, report } => {
                self.finish(worker, job_id, report);
                self.dispatch();
            }
            Command::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    fn dispatch(&mut self) {
        while !self.idle.is_empty() {
            let Some(QueuedJob { job, reply, dispatched }) = self.queue.pop_front() else {
                break;
            };

            if reply.is_closed() {
                tracing::debug!(job = %job.id, "dropping job whose caller went away");
                continue;
            }

            let Some(worker) = self.idle.pop_front() else {
                break;
            };

            let job_id = job.id;
            let cancelled = Arc::new(AtomicBool::new(false));
            let assignment = Assignment {
                job,
                cancelled: Arc::clone(&cancelled),
            };

            if self.workers[worker].sender.send(assignment).is_err() {
                tracing::warn!(worker, job = %job_id, "worker is gone; failing job");
                self.stats.lock().failed += 1;
                let _ = reply.send(JobOutcome::Failed(PassFailure::EngineUnavailable(format!(
                    "worker {} stopped",
                    worker
                ))));
                continue;
            }

            tracing::debug!(worker, job = %job_id, "job dispatched");
            let _ = dispatched.send(());
            self.in_flight.insert(
                job_id,
                InFlight {
                    worker,
                    cancelled,
                    reply: Some(reply),
                },
            );
            self.arm_timeout(job_id);
        }
    }

    fn arm_timeout(&self, job_id: JobId) {
        let Some(timeout) = self.job_timeout else {
            return;
        };
        let commands = self.commands.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(Command::Timeout(job_id));
            }
        });
    }

    fn cancel(&mut self, job_id: JobId) {
        if let Some(position) = self.queue.iter().position(|queued| queued.job.id == job_id) {
            if let Some(queued) = self.queue.remove(position) {
                tracing::debug!(job = %job_id, "cancelled queued job");
                self.stats.lock().cancelled += 1;
                let _ = queued.reply.send(JobOutcome::Cancelled);
            }
            return;
        }

        if let Some(entry) = self.in_flight.get_mut(&job_id) {
            entry.cancelled.store(true, Ordering::Release);
            if let Some(reply) = entry.reply.take() {
                tracing::debug!(job = %job_id, worker = entry.worker, "cancelled in-flight job");
                self.stats.lock().cancelled += 1;
                let _ = reply.send(JobOutcome::Cancelled);
            }
        }
    }

    fn time_out(&mut self, job_id: JobId) {
        if let Some(entry) = self.in_flight.get_mut(&job_id) {
            entry.cancelled.store(true, Ordering::Release);
            if let Some(reply) = entry.reply.take() {
                tracing::warn!(job = %job_id, worker = entry.worker, "job timed out");
                self.stats.lock().timed_out += 1;
                let _ = reply.send(JobOutcome::Failed(PassFailure::Timeout));
            }
        }
    }

    fn finish(&mut self, worker: usize, job_id: JobId, report: WorkerReport) {
        self.idle.push_back(worker);

        let Some(entry) = self.in_flight.remove(&job_id) else {
            tracing::warn!(worker, job = %job_id, "completion for unknown job");
            return;
        };

        let Some(reply) = entry.reply else {
            tracing::debug!(job = %job_id, "discarding result of abandoned job");
            return;
        };

        // A cancel that raced with completion has already set the flag; never report success then.
        let outcome = if entry.cancelled.load(Ordering::Acquire) {
            JobOutcome::Cancelled
        } else {
            match report {
                WorkerReport::Recognized(output) => JobOutcome::Completed(output),
                WorkerReport::Error(LekhaError::EngineUnavailable(reason)) => {
                    JobOutcome::Failed(PassFailure::EngineUnavailable(reason))
                }
                WorkerReport::Error(err) => JobOutcome::Failed(PassFailure::Engine(err.to_string())),
                WorkerReport::Panicked(message) => {
                    JobOutcome::Failed(PassFailure::Engine(format!("engine panicked: {}", message)))
                }
                WorkerReport::Skipped => JobOutcome::Cancelled,
            }
        };

        {
            let mut stats = self.stats.lock();
            match &outcome {
                JobOutcome::Completed(_) => stats.completed += 1,
                JobOutcome::Failed(_) => stats.failed += 1,
                JobOutcome::Cancelled => stats.cancelled += 1,
            }
        }

        let _ = reply.send(outcome);
    }

    fn shutdown(&mut self) {
        tracing::info!(
            queued = self.queue.len(),
            in_flight = self.in_flight.len(),
            "shutting down worker pool"
        );

        for queued in self.queue.drain(..) {
            let _ = queued.reply.send(JobOutcome::Failed(PassFailure::EngineUnavailable(
                "worker pool shut down".to_string(),
            )));
        }

        for (_, entry) in self.in_flight.drain() {
            entry.cancelled.store(true, Ordering::Release);
            if let Some(reply) = entry.reply {
                let _ = reply.send(JobOutcome::Failed(PassFailure::EngineUnavailable(
                    "worker pool shut down".to_string(),
                )));
            }
        }

        self.idle.clear();
        // Dropping the senders lets each worker thread exit after its current call.
        self.workers.clear();
    }

    fn publish_stats(&self) {
        let mut stats = self.stats.lock();
        stats.workers = self.workers.len();
        stats.idle = self.idle.len();
        stats.queued = self.queue.len();
        stats.in_flight = self.in_flight.len();
    }
}
