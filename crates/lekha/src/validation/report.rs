use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::extraction::FieldName;

/// Diagnostics for one field or for the record as a whole.
///
/// `is_valid` is false exactly when there is at least one error. Warnings and
/// suggestions never affect validity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn suggest(&mut self, suggestion: impl Into<String>) {
        self.suggestions.push(suggestion.into());
    }

    pub fn has_error(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.contains(needle))
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Per-field reports plus one report for cross-field rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub fields: IndexMap<FieldName, ValidationReport>,
    pub record: ValidationReport,
}

impl ValidationSummary {
    pub fn is_valid(&self) -> bool {
        self.record.is_valid && self.fields.values().all(|r| r.is_valid)
    }

    pub fn field(&self, field: FieldName) -> Option<&ValidationReport> {
        self.fields.get(&field)
    }

    pub fn error_count(&self) -> usize {
        self.record.errors.len() + self.fields.values().map(|r| r.errors.len()).sum::<usize>()
    }

    pub fn warning_count(&self) -> usize {
        self.record.warnings.len() + self.fields.values().map(|r| r.warnings.len()).sum::<usize>()
    }

    /// Every message prefixed with its field name, errors first.
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        let scopes = self
            .fields
            .iter()
            .map(|(field, report)| (field.as_str(), report))
            .chain(std::iter::once(("record", &self.record)));
        for (scope, report) in scopes.clone() {
            out.extend(report.errors.iter().map(|e| format!("error [{}]: {}", scope, e)));
        }
        for (scope, report) in scopes.clone() {
            out.extend(report.warnings.iter().map(|w| format!("warning [{}]: {}", scope, w)));
        }
        for (scope, report) in scopes {
            out.extend(report.suggestions.iter().map(|s| format!("suggestion [{}]: {}", scope, s)));
        }
        out
    }
}
