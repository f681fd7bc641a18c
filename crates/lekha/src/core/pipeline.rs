//! End-to-end processing of one document image.
//!
//! [`DocumentPipeline`] runs the catalog through the [`MultiPassOrchestrator`], reconciles
//! the passes into an [`ExtractedRecord`] and validates it. Each run gets its own
//! [`CancelToken`] and [`ProgressTracker`]; the pool is shared across runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::core::cancel::CancelToken;
use crate::core::config::LekhaConfig;
use crate::core::orchestrator::MultiPassOrchestrator;
use crate::core::progress::{Milestone, ProgressTracker};
use crate::engine::EngineFactory;
use crate::extraction::{ExtractedRecord, FieldExtractionEngine};
use crate::preprocessing::ImagePreprocessor;
use crate::scheduler::WorkerPool;
use crate::types::{Outcome, PassOutcome, RecognitionConfig};
use crate::validation::{ValidationLayer, ValidationSummary};

/// Everything one successful run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub record: ExtractedRecord,
    pub validation: ValidationSummary,
    /// One entry per catalog config, in catalog order.
    pub passes: Vec<PassOutcome>,
}

pub struct DocumentPipeline {
    orchestrator: MultiPassOrchestrator,
    extractor: FieldExtractionEngine,
    validator: ValidationLayer,
    catalog: Vec<RecognitionConfig>,
}

impl DocumentPipeline {
    /// Builds a pipeline over an existing pool. `config` supplies the catalog and the
    /// extraction and validation settings; its pool settings are ignored.
    pub fn new(pool: Arc<WorkerPool>, config: &LekhaConfig) -> Self {
        Self {
            orchestrator: MultiPassOrchestrator::new(pool),
            extractor: FieldExtractionEngine::new(config.extraction.clone()),
            validator: ValidationLayer::new(config.validation.clone()),
            catalog: config.catalog.clone(),
        }
    }

    /// Validates `config`, starts a pool sized from it and builds the pipeline.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(factory: Arc<dyn EngineFactory>, config: &LekhaConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::from_config(factory, config)?;
        Ok(Self::new(Arc::new(pool), config))
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn ImagePreprocessor>) -> Self {
        self.orchestrator = self.orchestrator.with_preprocessor(preprocessor);
        self
    }

    pub fn catalog(&self) -> &[RecognitionConfig] {
        &self.catalog
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        self.orchestrator.pool()
    }

    pub fn extractor(&self) -> &FieldExtractionEngine {
        &self.extractor
    }

    pub fn validator(&self) -> &ValidationLayer {
        &self.validator
    }

    /// Processes one image.
    ///
    /// Resolves to exactly one of a processed document, a labeled failure, or
    /// `Cancelled`. A cancel observed at any checkpoint discards partial work.
    #[tracing::instrument(skip_all, fields(image_bytes = image.len(), catalog = self.catalog.len()))]
    pub async fn process(
        &self,
        image: Arc<[u8]>,
        progress: &ProgressTracker,
        cancel: &CancelToken,
    ) -> Outcome<ProcessedDocument> {
        let passes = match self.orchestrator.run(image, &self.catalog, progress, cancel).await {
            Outcome::Completed(passes) => passes,
            Outcome::Failed(reason) => return Outcome::Failed(reason),
            Outcome::Cancelled => return Outcome::Cancelled,
        };

        progress.report(Milestone::ExtractionStarted);
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        let Some(record) = self.extractor.extract_passes(&passes, cancel) else {
            return Outcome::Cancelled;
        };
        let validation = self.validator.validate(&record);

        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        tracing::info!(
            present = record.present_count(),
            failed_passes = record.failed_passes.len(),
            valid = validation.is_valid(),
            "document processed"
        );
        progress.report(Milestone::Complete);

        Outcome::Completed(ProcessedDocument {
            record,
            validation,
            passes,
        })
    }
}

impl std::fmt::Debug for DocumentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPipeline")
            .field("catalog", &self.catalog.iter().map(|c| c.name.as_str()).collect::<Vec<_>>())
            .field("pool", self.orchestrator.pool())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::RecordingSink;
    use crate::engine::{RecordedPass, ReplayScript};
    use crate::extraction::FieldName;

    fn pipeline(script: ReplayScript) -> DocumentPipeline {
        DocumentPipeline::from_config(Arc::new(script.into_factory()), &LekhaConfig::default()).unwrap()
    }

    fn image() -> Arc<[u8]> {
        Arc::from(&b"fake image"[..])
    }

    #[tokio::test]
    async fn test_full_run_reports_every_milestone() {
        let script = ReplayScript::new()
            .with_pass("Standard", RecordedPass::from_text("D.L. No: 03-066-041605", 90.0))
            .with_pass("Precise", RecordedPass::from_text("D.L. No: 03-066-041605", 70.0));
        let sink = RecordingSink::new();
        let progress = ProgressTracker::new(Some(Arc::new(sink.clone())));

        let outcome = pipeline(script).process(image(), &progress, &CancelToken::new()).await;
        let document = outcome.completed().unwrap();
        assert_eq!(document.record.value(FieldName::LicenseNumber), Some("03-066-041605"));
        assert_eq!(document.passes.len(), 2);

        let stages: Vec<String> = sink.events().into_iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                "preprocessing-started",
                "pass-1-started",
                "pass-2-started",
                "extraction-started",
                "complete"
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = pipeline(ReplayScript::new())
            .process(image(), &ProgressTracker::disabled(), &cancel)
            .await;
        assert!(outcome.is_cancelled());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = LekhaConfig {
            catalog: vec![],
            ..Default::default()
        };
        let result = DocumentPipeline::from_config(Arc::new(ReplayScript::new().into_factory()), &config);
        assert!(result.is_err());
    }
}
