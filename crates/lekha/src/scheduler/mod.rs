//! Fixed-size recognition worker pool.
//!
//! Each worker is a dedicated OS thread that owns one engine for the lifetime of the pool.
//! A single scheduler task ([`actor::Scheduler`]) owns the FIFO queue and routes
//! completions back to callers through one oneshot channel per job.
//!
//! ```text
//! submit ──► Command::Submit ──► [scheduler] ──► worker N (thread, engine N)
//!                                     ▲                 │
//!                                     └─ Command::Finished
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lekha::engine::{RecordedPass, ReplayScript};
//! use lekha::scheduler::{JobOutcome, WorkerPool};
//! use lekha::types::RecognitionConfig;
//!
//! # async fn example() -> lekha::Result<()> {
//! let script = ReplayScript::new().with_pass("Standard", RecordedPass::from_text("D.L. No: 03-066-041605", 90.0));
//! let pool = WorkerPool::new(Arc::new(script.into_factory()), 2, None)?;
//!
//! let config = RecognitionConfig::default_catalog().remove(0);
//! let handle = pool.submit(Arc::from(&b"image"[..]), config)?;
//! assert!(matches!(handle.outcome().await, JobOutcome::Completed(_)));
//! # Ok(())
//! # }
//! ```

mod actor;
mod job;
mod worker;

pub use job::{Job, JobHandle, JobId, JobOutcome};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::core::config::LekhaConfig;
use crate::engine::EngineFactory;
use crate::types::RecognitionConfig;
use crate::{LekhaError, Result};
use actor::{Command, Scheduler};

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub workers: usize,
    pub idle: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub timed_out: u64,
}

pub struct WorkerPool {
    commands: mpsc::UnboundedSender<Command>,
    stats: Arc<Mutex<PoolStats>>,
    shut_down: AtomicBool,
    size: usize,
}

impl WorkerPool {
    /// Builds `size` engines through `factory` and starts the scheduler.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `LekhaError::Config` when `size` is zero
    /// - `LekhaError::EngineUnavailable` when there is no runtime
    /// - whatever `factory` returns for a worker it cannot build
    pub fn new(factory: Arc<dyn EngineFactory>, size: usize, job_timeout: Option<Duration>) -> Result<Self> {
        if size == 0 {
            return Err(LekhaError::config("Worker pool size must be at least 1"));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LekhaError::EngineUnavailable(format!("Worker pool requires a tokio runtime: {}", e)))?;

        let (commands, receiver) = mpsc::unbounded_channel();

        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let engine = factory.create(index)?;
            workers.push(worker::spawn_worker(index, engine, commands.clone())?);
        }

        let stats = Arc::new(Mutex::new(PoolStats::default()));
        let scheduler = Scheduler::new(workers, job_timeout, commands.downgrade(), Arc::clone(&stats));
        runtime.spawn(scheduler.run(receiver));

        tracing::info!(workers = size, timeout_ms = job_timeout.map(|t| t.as_millis() as u64), "worker pool started");

        Ok(Self {
            commands,
            stats,
            shut_down: AtomicBool::new(false),
            size,
        })
    }

    /// Pool sized and timed per `config`.
    pub fn from_config(factory: Arc<dyn EngineFactory>, config: &LekhaConfig) -> Result<Self> {
        Self::new(factory, config.effective_pool_size(), config.job_timeout())
    }

    /// Enqueues a job. Returns as soon as the job is handed to the scheduler.
    pub fn submit(&self, image: Arc<[u8]>, config: RecognitionConfig) -> Result<JobHandle> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(LekhaError::PoolShutdown);
        }

        let job = Job::new(image, config);
        let id = job.id;
        let (reply, receiver) = oneshot::channel();
        let (dispatched, on_dispatch) = oneshot::channel();

        self.commands
            .send(Command::Submit { job, reply, dispatched })
            .map_err(|_| LekhaError::PoolShutdown)?;

        Ok(JobHandle::new(id, receiver, on_dispatch, self.commands.clone()))
    }

    /// Cancels a queued or running job. Unknown or settled ids are ignored.
    pub fn cancel(&self, job_id: JobId) {
        let _ = self.commands.send(Command::Cancel(job_id));
    }

    /// Stops accepting work and abandons queued and running jobs. Idempotent.
    pub fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            let _ = self.commands.send(Command::Shutdown);
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stats(&self) -> PoolStats {
        self.stats.lock().clone()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
