//! Long-lived recognition worker threads.
//!
//! A worker owns its engine exclusively and runs one job at a time. Engine errors and
//! panics are reported back to the scheduler; neither ends the worker.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use super::actor::Command;
use super::job::Job;
use crate::engine::RecognitionEngine;
use crate::{LekhaError, Result};
use crate::types::RecognitionOutput;

/// Work handed from the scheduler to a worker.
pub(crate) struct Assignment {
    pub job: Job,
    pub cancelled: Arc<AtomicBool>,
}

/// What a worker reports back after an assignment.
#[derive(Debug)]
pub(crate) enum WorkerReport {
    Recognized(RecognitionOutput),
    Error(LekhaError),
    Panicked(String),
    /// The job was cancelled before the engine was called.
    Skipped,
}

pub(crate) struct WorkerHandle {
    pub index: usize,
    pub sender: mpsc::UnboundedSender<Assignment>,
}

pub(crate) fn spawn_worker(
    index: usize,
    mut engine: Box<dyn RecognitionEngine>,
    commands: mpsc::UnboundedSender<Command>,
) -> Result<WorkerHandle> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Assignment>();

    // Detached: shutdown abandons in-flight calls instead of joining them.
    std::thread::Builder::new()
        .name(format!("lekha-worker-{}", index))
        .spawn(move || {
            tracing::debug!(worker = index, engine = engine.name(), "worker started");

            while let Some(assignment) = receiver.blocking_recv() {
                let job_id = assignment.job.id;
                let report = run_assignment(index, engine.as_mut(), &assignment);

                if commands
                    .send(Command::Finished {
                        worker: index,
                        job_id,
                        report,
                    })
                    .is_err()
                {
                    break;
                }
            }

            tracing::debug!(worker = index, "worker stopped");
        })?;

    Ok(WorkerHandle { index, sender })
}

fn run_assignment(index: usize, engine: &mut dyn RecognitionEngine, assignment: &Assignment) -> WorkerReport {
    let job = &assignment.job;

    if assignment.cancelled.load(Ordering::Acquire) {
        tracing::debug!(worker = index, job = %job.id, "skipping cancelled job");
        return WorkerReport::Skipped;
    }

    tracing::debug!(
        worker = index,
        job = %job.id,
        config = %job.config.name,
        queued_ms = job.created_at.elapsed().as_millis() as u64,
        "recognition started"
    );

    match catch_unwind(AssertUnwindSafe(|| engine.recognize(&job.image, &job.config))) {
        Ok(Ok(output)) => WorkerReport::Recognized(output),
        Ok(Err(err)) => {
            tracing::warn!(worker = index, job = %job.id, error = %err, "recognition failed");
            WorkerReport::Error(err)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::warn!(worker = index, job = %job.id, panic = %message, "engine panicked");
            WorkerReport::Panicked(message)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
