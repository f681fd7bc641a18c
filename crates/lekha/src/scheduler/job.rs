use crate::types::{PassFailure, RecognitionConfig, RecognitionOutput};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::actor::Command;

/// Opaque job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recognition request. Immutable once created.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub image: Arc<[u8]>,
    pub config: RecognitionConfig,
    pub created_at: Instant,
}

impl Job {
    pub(crate) fn new(image: Arc<[u8]>, config: RecognitionConfig) -> Self {
        Self {
            id: JobId::new(),
            image,
            config,
            created_at: Instant::now(),
        }
    }
}

/// How a submitted job settled. Exactly one outcome is delivered per job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(RecognitionOutput),
    Failed(PassFailure),
    Cancelled,
}

/// Caller's side of a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    receiver: oneshot::Receiver<JobOutcome>,
    dispatched: Option<oneshot::Receiver<()>>,
    commands: mpsc::UnboundedSender<Command>,
}

impl JobHandle {
    pub(crate) fn new(
        id: JobId,
        receiver: oneshot::Receiver<JobOutcome>,
        dispatched: oneshot::Receiver<()>,
        commands: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            id,
            receiver,
            dispatched: Some(dispatched),
            commands,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Takes the signal that resolves when a worker picks the job up. It closes without
    /// firing if the job settles while still queued. `None` after the first call.
    pub fn take_dispatched(&mut self) -> Option<oneshot::Receiver<()>> {
        self.dispatched.take()
    }

    /// Requests cooperative cancellation. A no-op once the job has settled.
    pub fn cancel(&self) {
        let _ = self.commands.send(Command::Cancel(self.id));
    }

    /// Waits for the job to settle.
    pub async fn outcome(self) -> JobOutcome {
        self.receiver.await.unwrap_or_else(|_| {
            JobOutcome::Failed(PassFailure::EngineUnavailable("scheduler stopped".to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_serializes_as_uuid_string() {
        let id = JobId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_job_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }
}
