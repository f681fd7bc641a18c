//! Lekha - multi-pass OCR and field extraction for bilingual identity documents
//!
//! Lekha recognizes one document image under several engine configurations, reconciles
//! the passes field by field and validates the result. It targets Nepali driving licences,
//! which mix Latin and Devanagari script.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lekha::{CancelToken, DocumentPipeline, LekhaConfig, Outcome, ProgressTracker};
//! use lekha::engine::ReplayScript;
//!
//! # async fn example() -> lekha::Result<()> {
//! let script = ReplayScript::from_json_file("card.passes.json")?;
//! let pipeline = DocumentPipeline::from_config(Arc::new(script.into_factory()), &LekhaConfig::default())?;
//!
//! let image: Arc<[u8]> = Arc::from(std::fs::read("card.png")?);
//! match pipeline.process(image, &ProgressTracker::disabled(), &CancelToken::new()).await {
//!     Outcome::Completed(document) => println!("{}", serde_json::to_string_pretty(&document.record)?),
//!     other => eprintln!("no record: {:?}", other.reason_code()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Scheduler** (`scheduler`): fixed pool of worker threads, each owning one engine
//! - **Core** (`core`): orchestrator, pipeline, cancellation, progress and configuration
//! - **Engines** (`engine`): the recognition boundary plus replay and Tesseract backends
//! - **Extraction** (`extraction`): candidates, cross-pass voting and normalization
//! - **Validation** (`validation`): per-field and cross-field rules
//!
//! # Features
//!
//! - `preprocessing`: grayscale and contrast stretch before recognition
//! - `tesseract`: native Tesseract engine

#![deny(unsafe_code)]

pub mod core;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod preprocessing;
pub mod scheduler;
pub mod types;
pub mod validation;

pub use error::{LekhaError, Result};
pub use types::*;

pub use core::cancel::CancelToken;
pub use core::config::LekhaConfig;
pub use core::pipeline::{DocumentPipeline, ProcessedDocument};
pub use core::progress::{ProgressEvent, ProgressSink, ProgressTracker};

pub use engine::{EngineFactory, RecognitionEngine};
pub use extraction::{ExtractedField, ExtractedRecord, FieldExtractionEngine, FieldName};
pub use scheduler::{PoolStats, WorkerPool};
pub use validation::{ValidationLayer, ValidationReport, ValidationSummary};
