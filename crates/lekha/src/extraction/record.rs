use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of fields read from a driving licence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    LicenseNumber,
    HolderName,
    IssueDate,
    ExpiryDate,
    IssuingAuthority,
    Address,
    DateOfBirth,
    /// Father's or husband's name.
    GuardianName,
    CitizenshipNumber,
    PhoneNumber,
    BloodGroup,
    Category,
}

impl FieldName {
    pub const ALL: [FieldName; 12] = [
        FieldName::LicenseNumber,
        FieldName::HolderName,
        FieldName::IssueDate,
        FieldName::ExpiryDate,
        FieldName::IssuingAuthority,
        FieldName::Address,
        FieldName::DateOfBirth,
        FieldName::GuardianName,
        FieldName::CitizenshipNumber,
        FieldName::PhoneNumber,
        FieldName::BloodGroup,
        FieldName::Category,
    ];

    /// Fields without which a record cannot be valid.
    pub const REQUIRED: [FieldName; 4] = [
        FieldName::LicenseNumber,
        FieldName::HolderName,
        FieldName::IssueDate,
        FieldName::ExpiryDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::LicenseNumber => "license_number",
            FieldName::HolderName => "holder_name",
            FieldName::IssueDate => "issue_date",
            FieldName::ExpiryDate => "expiry_date",
            FieldName::IssuingAuthority => "issuing_authority",
            FieldName::Address => "address",
            FieldName::DateOfBirth => "date_of_birth",
            FieldName::GuardianName => "guardian_name",
            FieldName::CitizenshipNumber => "citizenship_number",
            FieldName::PhoneNumber => "phone_number",
            FieldName::BloodGroup => "blood_group",
            FieldName::Category => "category",
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    pub fn is_date(&self) -> bool {
        matches!(
            self,
            FieldName::IssueDate | FieldName::ExpiryDate | FieldName::DateOfBirth
        )
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tentative value read from one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCandidate {
    pub field: FieldName,
    /// Raw matched text; normalization happens after voting.
    pub value: String,
    /// 0..1
    pub confidence: f64,
    pub source_pass: String,
    pub catalog_index: usize,
}

/// A value that lost the vote, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscardedCandidate {
    pub value: String,
    pub confidence: f64,
    pub sources: Vec<String>,
}

/// Reconciled value of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    /// Canonical value, `None` when no pass produced a candidate.
    pub value: Option<String>,
    /// 0..1; 0 when absent.
    pub confidence: f64,
    /// Passes that agreed on the value, in catalog order.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<DiscardedCandidate>,
}

impl ExtractedField {
    pub fn absent() -> Self {
        Self {
            value: None,
            confidence: 0.0,
            sources: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }
}

/// One structured record per pipeline run.
///
/// Fields are kept in [`FieldName::ALL`] order so serialized output is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    fields: IndexMap<FieldName, ExtractedField>,
    /// Catalog configs whose pass produced no result.
    #[serde(default)]
    pub failed_passes: Vec<String>,
}

impl Default for ExtractedRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl ExtractedRecord {
    /// A record with every field absent.
    pub fn empty() -> Self {
        Self {
            fields: FieldName::ALL.iter().map(|f| (*f, ExtractedField::absent())).collect(),
            failed_passes: Vec::new(),
        }
    }

    /// Builds a record from known values at full confidence, e.g. a manually keyed entry.
    pub fn from_values<'a>(values: impl IntoIterator<Item = (FieldName, &'a str)>) -> Self {
        let mut record = Self::empty();
        for (field, value) in values {
            record.insert(
                field,
                ExtractedField {
                    value: Some(value.to_string()),
                    confidence: 1.0,
                    sources: vec!["manual".to_string()],
                    alternatives: Vec::new(),
                },
            );
        }
        record
    }

    pub(crate) fn insert(&mut self, field: FieldName, value: ExtractedField) {
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: FieldName) -> Option<&ExtractedField> {
        self.fields.get(&field)
    }

    pub fn value(&self, field: FieldName) -> Option<&str> {
        self.get(field).and_then(|f| f.value.as_deref())
    }

    pub fn confidence(&self, field: FieldName) -> f64 {
        self.get(field).map_or(0.0, |f| f.confidence)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &ExtractedField)> {
        self.fields.iter()
    }

    pub fn present_count(&self) -> usize {
        self.fields.values().filter(|f| !f.is_absent()).count()
    }
}
