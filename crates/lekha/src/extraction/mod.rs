//! Field extraction: per-pass candidates, cross-pass voting, normalization.
//!
//! Extraction is pure and single-threaded. Given the same pass results it always yields
//! the same record: passes are ordered by catalog index before anything else happens,
//! and every map is ordered.
//!
//! # Example
//!
//! ```rust
//! use lekha::extraction::{FieldExtractionEngine, FieldName};
//! use lekha::types::{RawPassResult, RecognitionOutput};
//!
//! let pass = RawPassResult::from_output(
//!     "Standard",
//!     0,
//!     RecognitionOutput { text: "D.L. No: 03066041605".into(), confidence: 90.0, tokens: vec![] },
//! );
//! let record = FieldExtractionEngine::default().extract(&[pass]);
//! assert_eq!(record.value(FieldName::LicenseNumber), Some("03-066-041605"));
//! ```

pub mod candidates;
pub mod dates;
pub mod license;
pub mod normalize;
pub mod patterns;
pub mod record;
pub mod terms;
pub mod voting;

pub use record::{DiscardedCandidate, ExtractedField, ExtractedRecord, FieldCandidate, FieldName};

use crate::core::cancel::CancelToken;
use crate::core::config::ExtractionSettings;
use crate::types::{PassOutcome, RawPassResult};

#[derive(Debug, Clone, Default)]
pub struct FieldExtractionEngine {
    settings: ExtractionSettings,
}

impl FieldExtractionEngine {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Candidates one pass yields, before voting.
    pub fn candidates(&self, pass: &RawPassResult) -> Vec<FieldCandidate> {
        candidates::candidates_for_pass(pass, self.settings.two_digit_year_pivot)
    }

    pub fn extract(&self, results: &[RawPassResult]) -> ExtractedRecord {
        let results: Vec<&RawPassResult> = results.iter().collect();
        self.build(&results, Vec::new(), || false).unwrap_or_default()
    }

    /// Like [`extract`](Self::extract) but stops writing fields once `cancel` fires and
    /// returns `None` instead of a partial record.
    pub fn extract_cancellable(&self, results: &[RawPassResult], cancel: &CancelToken) -> Option<ExtractedRecord> {
        let results: Vec<&RawPassResult> = results.iter().collect();
        self.build(&results, Vec::new(), || cancel.is_cancelled())
    }

    /// Extracts from a multi-pass run, recording which configs failed.
    pub fn extract_passes(&self, passes: &[PassOutcome], cancel: &CancelToken) -> Option<ExtractedRecord> {
        let results: Vec<&RawPassResult> = passes.iter().filter_map(PassOutcome::as_result).collect();
        let failed = passes
            .iter()
            .filter(|p| p.is_failed())
            .map(|p| p.config_name().to_string())
            .collect();
        self.build(&results, failed, || cancel.is_cancelled())
    }

    fn build(
        &self,
        results: &[&RawPassResult],
        failed_passes: Vec<String>,
        is_cancelled: impl Fn() -> bool,
    ) -> Option<ExtractedRecord> {
        let mut ordered = results.to_vec();
        ordered.sort_by(|a, b| {
            a.catalog_index
                .cmp(&b.catalog_index)
                .then_with(|| a.config_name.cmp(&b.config_name))
        });

        let catalog_order: Vec<&str> = ordered.iter().map(|p| p.config_name.as_str()).collect();
        let mut per_field: Vec<Vec<FieldCandidate>> = vec![Vec::new(); FieldName::ALL.len()];
        for pass in &ordered {
            if is_cancelled() {
                return None;
            }
            for candidate in self.candidates(pass) {
                if let Some(slot) = FieldName::ALL.iter().position(|f| *f == candidate.field) {
                    per_field[slot].push(candidate);
                }
            }
        }

        let mut record = ExtractedRecord::empty();
        record.failed_passes = failed_passes;

        for (field, candidates) in FieldName::ALL.iter().zip(per_field) {
            if is_cancelled() {
                tracing::debug!(field = %field, "extraction cancelled");
                return None;
            }

            let mut extracted = voting::vote(&candidates, self.settings.single_source_ceiling);
            let pivot = self.settings.two_digit_year_pivot;
            if let Some(raw) = extracted.value.take() {
                extracted.value = Some(normalize::normalize(*field, &raw, pivot));
            }
            for alternative in &mut extracted.alternatives {
                alternative.value = normalize::normalize(*field, &alternative.value, pivot);
            }
            fold_equivalent_alternatives(&mut extracted, &catalog_order);

            tracing::trace!(
                field = %field,
                candidates = candidates.len(),
                confidence = extracted.confidence,
                alternatives = extracted.alternatives.len(),
                "field reconciled"
            );
            record.insert(*field, extracted);
        }

        tracing::debug!(
            present = record.present_count(),
            failed_passes = record.failed_passes.len(),
            "record extracted"
        );
        Some(record)
    }
}

/// Voting compares raw text, so spellings of one value can survive it as rivals. Once
/// normalized they are the same value: merge them into the winner or into each other.
/// Merged confidence is the maximum of the already capped confidences.
fn fold_equivalent_alternatives(field: &mut ExtractedField, catalog_order: &[&str]) {
    let Some(value) = field.value.as_deref() else {
        return;
    };

    let mut kept: Vec<DiscardedCandidate> = Vec::with_capacity(field.alternatives.len());
    for alternative in std::mem::take(&mut field.alternatives) {
        if alternative.value == value {
            field.confidence = field.confidence.max(alternative.confidence);
            field.sources.extend(alternative.sources);
        } else if let Some(existing) = kept.iter_mut().find(|k| k.value == alternative.value) {
            existing.confidence = existing.confidence.max(alternative.confidence);
            existing.sources.extend(alternative.sources);
        } else {
            kept.push(alternative);
        }
    }

    sort_sources(&mut field.sources, catalog_order);
    for alternative in &mut kept {
        sort_sources(&mut alternative.sources, catalog_order);
    }
    field.alternatives = kept;
}

fn sort_sources(sources: &mut Vec<String>, catalog_order: &[&str]) {
    sources.sort_by_key(|name| catalog_order.iter().position(|c| *c == name.as_str()).unwrap_or(usize::MAX));
    sources.dedup();
}
