//! Post-extraction validation.
//!
//! The layer only reads a record. Field reports are keyed in [`FieldName::ALL`] order and
//! cover every field, present or not; cross-field findings go in the record-level report.

pub mod report;
pub mod rules;

pub use report::{ValidationReport, ValidationSummary};

use indexmap::IndexMap;

use crate::core::config::ValidationSettings;
use crate::extraction::{ExtractedRecord, FieldName};

#[derive(Debug, Clone, Default)]
pub struct ValidationLayer {
    settings: ValidationSettings,
}

impl ValidationLayer {
    pub fn new(settings: ValidationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    pub fn validate(&self, record: &ExtractedRecord) -> ValidationSummary {
        let mut fields = IndexMap::with_capacity(FieldName::ALL.len());
        let mut issue = None;
        let mut expiry = None;
        let mut birth = None;

        for field in FieldName::ALL {
            let mut report = ValidationReport::new();
            match record.value(field) {
                None if field.is_required() => report.error(format!("missing required field {}", field)),
                None => {}
                Some(value) => {
                    let date = self.check_field(field, value, &mut report);
                    match field {
                        FieldName::IssueDate => issue = date,
                        FieldName::ExpiryDate => expiry = date,
                        FieldName::DateOfBirth => birth = date,
                        _ => {}
                    }
                }
            }
            fields.insert(field, report);
        }

        let mut cross = ValidationReport::new();
        if let (Some(issue), Some(expiry)) = (issue, expiry) {
            rules::validity_period(issue, expiry, &self.settings, &mut cross);
        }
        if let (Some(birth), Some(issue)) = (birth, issue) {
            rules::holder_age(birth, issue, &self.settings, &mut cross);
        }

        let summary = ValidationSummary { fields, record: cross };
        tracing::debug!(
            valid = summary.is_valid(),
            errors = summary.error_count(),
            warnings = summary.warning_count(),
            "record validated"
        );
        summary
    }

    /// Runs the field's own rules; returns the parsed date for date fields.
    fn check_field(&self, field: FieldName, value: &str, report: &mut ValidationReport) -> Option<chrono::NaiveDate> {
        match field {
            FieldName::LicenseNumber => rules::license_number(value, report),
            FieldName::HolderName => rules::person_name(value, report),
            FieldName::GuardianName => {
                if value.chars().any(|c| c.is_ascii_digit()) {
                    report.error("name contains digits");
                }
            }
            FieldName::IssueDate | FieldName::ExpiryDate | FieldName::DateOfBirth => {
                return rules::iso_date(value, report);
            }
            FieldName::BloodGroup => rules::blood_group(value, report),
            FieldName::Category => rules::category(value, report),
            FieldName::PhoneNumber => rules::phone_number(value, report),
            FieldName::CitizenshipNumber => rules::citizenship_number(value, report),
            FieldName::Address | FieldName::IssuingAuthority => {
                if value.trim().is_empty() {
                    report.error("value is empty");
                }
            }
        }
        None
    }
}
