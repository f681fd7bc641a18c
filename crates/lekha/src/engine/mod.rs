//! Recognition engine boundary.
//!
//! The engine itself is a black box: given image bytes and a [`RecognitionConfig`] it
//! returns text, an overall confidence, and per-token confidences. Each pool worker owns
//! exactly one engine instance for its whole lifetime, so implementations may keep
//! expensive, non-thread-safe state (a loaded model, a native API handle) without locking.
//!
//! # Implementations
//!
//! - [`ReplayEngine`] serves recorded outputs keyed by config name. Deterministic; used by
//!   tests and by the CLI's `--replay` mode.
//! - `TesseractEngine` (feature `tesseract`) drives a native Tesseract context.

pub mod replay;
#[cfg(feature = "tesseract")]
pub mod tesseract;
pub mod tsv;

use crate::Result;
use crate::types::{RecognitionConfig, RecognitionOutput};

pub use replay::{RecordedPass, ReplayEngine, ReplayScript};
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngine;
pub use tsv::parse_tsv_tokens;

/// A stateful recognition context.
///
/// `recognize` takes `&mut self`: the pool guarantees a context is never used by two jobs
/// at once. Errors are recoverable; the worker stays alive and takes the next job.
pub trait RecognitionEngine: Send {
    fn name(&self) -> &str;

    fn recognize(&mut self, image: &[u8], config: &RecognitionConfig) -> Result<RecognitionOutput>;
}

/// Builds one engine per worker.
pub trait EngineFactory: Send + Sync {
    /// `worker_index` is stable for the life of the pool and can be used for logging.
    fn create(&self, worker_index: usize) -> Result<Box<dyn RecognitionEngine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(usize) -> Result<Box<dyn RecognitionEngine>> + Send + Sync,
{
    fn create(&self, worker_index: usize) -> Result<Box<dyn RecognitionEngine>> {
        self(worker_index)
    }
}
