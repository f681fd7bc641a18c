//! Multi-pass recognition of one image.
//!
//! One job per catalog entry goes to the shared [`WorkerPool`]. Passes run concurrently up
//! to the pool size; results are written back by catalog index so the returned list is in
//! catalog order regardless of completion order.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::core::cancel::CancelToken;
use crate::core::progress::{Milestone, ProgressTracker};
use crate::preprocessing::{ImagePreprocessor, Passthrough};
use crate::scheduler::{JobId, JobOutcome, WorkerPool};
use crate::types::{FailureReason, Outcome, PassFailure, PassOutcome, RawPassResult, RecognitionConfig};

pub struct MultiPassOrchestrator {
    pool: Arc<WorkerPool>,
    preprocessor: Arc<dyn ImagePreprocessor>,
}

impl MultiPassOrchestrator {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self {
            pool,
            preprocessor: Arc::new(Passthrough),
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn ImagePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Runs `image` through every config and returns one [`PassOutcome`] per config, in
    /// config order.
    ///
    /// Failed passes are kept in the list. The run itself fails only when no pass
    /// succeeded, and resolves `Cancelled` as soon as `cancel` fires, after cancelling
    /// every outstanding job.
    #[tracing::instrument(skip_all, fields(passes = configs.len(), preprocessor = self.preprocessor.name()))]
    pub async fn run(
        &self,
        image: Arc<[u8]>,
        configs: &[RecognitionConfig],
        progress: &ProgressTracker,
        cancel: &CancelToken,
    ) -> Outcome<Vec<PassOutcome>> {
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        progress.report(Milestone::PreprocessingStarted);
        // The blocking task runs to completion on its own; a cancel only stops waiting for it.
        let preprocessed = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::info!("run cancelled during preprocessing");
                return Outcome::Cancelled;
            }
            result = self.preprocess(image) => result,
        };
        let image = match preprocessed {
            Ok(image) => image,
            Err(reason) => {
                tracing::warn!(%reason, "preprocessing failed");
                return Outcome::Failed(FailureReason::EngineUnavailable(reason));
            }
        };

        let total = configs.len();
        let mut slots: Vec<Option<PassOutcome>> = vec![None; total];
        let mut job_ids: Vec<JobId> = Vec::with_capacity(total);
        let mut pending_starts: VecDeque<(usize, oneshot::Receiver<()>)> = VecDeque::with_capacity(total);
        let mut tasks = JoinSet::new();

        for (index, config) in configs.iter().enumerate() {
            match self.pool.submit(Arc::clone(&image), config.clone()) {
                Ok(mut handle) => {
                    job_ids.push(handle.id());
                    if let Some(dispatched) = handle.take_dispatched() {
                        pending_starts.push_back((index, dispatched));
                    }
                    tasks.spawn(async move { (index, handle.outcome().await) });
                }
                Err(err) => {
                    tracing::warn!(config = %config.name, error = %err, "pass could not be submitted");
                    slots[index] = Some(PassOutcome::Failed {
                        config_name: config.name.clone(),
                        catalog_index: index,
                        failure: PassFailure::EngineUnavailable(err.to_string()),
                    });
                }
            }
        }

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!(outstanding = tasks.len(), "run cancelled");
                    for id in &job_ids {
                        self.pool.cancel(*id);
                    }
                    tasks.abort_all();
                    return Outcome::Cancelled;
                }

                // Jobs are dispatched in submission order, so awaiting the front suffices.
                started = next_dispatch(&mut pending_starts), if !pending_starts.is_empty() => {
                    if let Some(index) = started {
                        progress.report(Milestone::PassStarted { index, total });
                    }
                }

                next = tasks.join_next() => match next {
                    None => break,
                    Some(Ok((index, outcome))) => {
                        slots[index] = Some(pass_outcome(index, &configs[index], outcome));
                    }
                    Some(Err(join_err)) => {
                        tracing::warn!(error = %join_err, "pass task ended abnormally");
                    }
                },
            }
        }

        // A cancel that lands after the last pass settled still wins.
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        let passes: Vec<PassOutcome> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| PassOutcome::Failed {
                    config_name: configs[index].name.clone(),
                    catalog_index: index,
                    failure: PassFailure::EngineUnavailable("pass task aborted".to_string()),
                })
            })
            .collect();

        let failed: Vec<&str> = passes.iter().filter(|p| p.is_failed()).map(PassOutcome::config_name).collect();
        if failed.len() == passes.len() {
            let reason = all_failed_reason(&passes);
            tracing::warn!(code = reason.code(), "every pass failed");
            return Outcome::Failed(reason);
        }

        tracing::info!(
            succeeded = passes.len() - failed.len(),
            failed = ?failed,
            "multi-pass recognition finished"
        );
        Outcome::Completed(passes)
    }

    async fn preprocess(&self, image: Arc<[u8]>) -> std::result::Result<Arc<[u8]>, String> {
        let preprocessor = Arc::clone(&self.preprocessor);
        tokio::task::spawn_blocking(move || preprocessor.preprocess(image))
            .await
            .map_err(|e| format!("preprocessing task failed: {}", e))?
            .map_err(|e| e.to_string())
    }
}

/// Waits for the oldest pending pass to reach a worker. `None` when it settled without
/// starting.
async fn next_dispatch(pending: &mut VecDeque<(usize, oneshot::Receiver<()>)>) -> Option<usize> {
    let (index, signal) = pending.front_mut()?;
    let index = *index;
    let started = signal.await.is_ok();
    pending.pop_front();
    started.then_some(index)
}

fn pass_outcome(index: usize, config: &RecognitionConfig, outcome: JobOutcome) -> PassOutcome {
    match outcome {
        JobOutcome::Completed(output) => PassOutcome::Recognized(RawPassResult::from_output(&config.name, index, output)),
        JobOutcome::Failed(failure) => {
            tracing::debug!(config = %config.name, %failure, "pass failed");
            PassOutcome::Failed {
                config_name: config.name.clone(),
                catalog_index: index,
                failure,
            }
        }
        JobOutcome::Cancelled => PassOutcome::Failed {
            config_name: config.name.clone(),
            catalog_index: index,
            failure: PassFailure::Cancelled,
        },
    }
}

/// `Timeout` or `EngineUnavailable` when every pass failed that same way, otherwise
/// `AllPassesFailed`. An empty catalog counts as every pass failing.
fn all_failed_reason(passes: &[PassOutcome]) -> FailureReason {
    let failures: Vec<&PassFailure> = passes
        .iter()
        .filter_map(|p| match p {
            PassOutcome::Failed { failure, .. } => Some(failure),
            PassOutcome::Recognized(_) => None,
        })
        .collect();

    if failures.is_empty() {
        return FailureReason::AllPassesFailed;
    }
    if failures.iter().all(|f| matches!(f, PassFailure::Timeout)) {
        return FailureReason::Timeout;
    }
    if let Some(PassFailure::EngineUnavailable(reason)) = failures.first()
        && failures.iter().all(|f| matches!(f, PassFailure::EngineUnavailable(_)))
    {
        return FailureReason::EngineUnavailable(reason.clone());
    }
    FailureReason::AllPassesFailed
}
