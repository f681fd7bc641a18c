//! Run orchestration.
//!
//! - **Pipeline**: [`pipeline::DocumentPipeline`] takes one image to a validated record
//! - **Orchestrator**: fans one image out over the recognition catalog on the shared pool
//! - **Cancellation and progress**: per-run [`CancelToken`] and [`ProgressTracker`]
//! - **Configuration**: [`LekhaConfig`] loading and discovery
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lekha::core::{CancelToken, DocumentPipeline, LekhaConfig, ProgressTracker};
//! use lekha::engine::ReplayScript;
//!
//! # async fn example() -> lekha::Result<()> {
//! let script = ReplayScript::from_json_file("card.passes.json")?;
//! let pipeline = DocumentPipeline::from_config(Arc::new(script.into_factory()), &LekhaConfig::default())?;
//!
//! let image: Arc<[u8]> = Arc::from(std::fs::read("card.png")?);
//! let outcome = pipeline.process(image, &ProgressTracker::disabled(), &CancelToken::new()).await;
//! println!("{:?}", outcome.reason_code());
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;

pub use cancel::CancelToken;
pub use config::{CONFIG_FILE_NAME, ExtractionSettings, LekhaConfig, ValidationSettings};
pub use orchestrator::MultiPassOrchestrator;
pub use pipeline::{DocumentPipeline, ProcessedDocument};
pub use progress::{Milestone, ProgressEvent, ProgressSink, ProgressTracker, RecordingSink};
