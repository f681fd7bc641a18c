//! Shared data model for recognition passes and pipeline outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Page Segmentation Mode understood by the recognition engine.
///
/// Discriminants match Tesseract's PSM numbering so engines can forward them untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegmentationMode {
    OsdOnly = 0,
    AutoOsd = 1,
    AutoOnly = 2,
    Auto = 3,
    SingleColumn = 4,
    SingleBlockVertical = 5,
    SingleBlock = 6,
    SingleLine = 7,
    SingleWord = 8,
    CircleWord = 9,
    SingleChar = 10,
}

impl PageSegmentationMode {
    pub fn from_u8(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(Self::OsdOnly),
            1 => Ok(Self::AutoOsd),
            2 => Ok(Self::AutoOnly),
            3 => Ok(Self::Auto),
            4 => Ok(Self::SingleColumn),
            5 => Ok(Self::SingleBlockVertical),
            6 => Ok(Self::SingleBlock),
            7 => Ok(Self::SingleLine),
            8 => Ok(Self::SingleWord),
            9 => Ok(Self::CircleWord),
            10 => Ok(Self::SingleChar),
            _ => Err(format!("Invalid page segmentation mode value: {}", value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// Characters allowed by the `Precise` catalog entry.
pub const PRECISE_WHITELIST: &str = concat!(
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789",
    "०१२३४५६७८९",
    "अआइईउऊऋएऐओऔकखगघङचछजझञटठडढणतथदधनपफबभमयरलवशषसहक्षत्रज्ञ",
    "ािीुूृेैोौंःँ्।",
    "-/.:,+() ",
);

fn default_language() -> String {
    "eng+nep".to_string()
}

/// One named recognition configuration.
///
/// The position of a config inside its catalog is its tie-break priority: earlier entries
/// win when passes disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub name: String,

    /// Characters the engine may emit. Empty means unrestricted.
    #[serde(default)]
    pub character_whitelist: String,

    pub page_segmentation_mode: PageSegmentationMode,

    #[serde(default)]
    pub preserve_interword_spacing: bool,

    /// Engine language hint, e.g. `eng+nep`.
    #[serde(default = "default_language")]
    pub language: String,
}

impl RecognitionConfig {
    pub fn new(name: impl Into<String>, page_segmentation_mode: PageSegmentationMode) -> Self {
        Self {
            name: name.into(),
            character_whitelist: String::new(),
            page_segmentation_mode,
            preserve_interword_spacing: false,
            language: default_language(),
        }
    }

    pub fn with_whitelist(mut self, whitelist: impl Into<String>) -> Self {
        self.character_whitelist = whitelist.into();
        self
    }

    pub fn with_interword_spacing(mut self, preserve: bool) -> Self {
        self.preserve_interword_spacing = preserve;
        self
    }

    /// The whitelist as a set. An empty set means every character is allowed.
    pub fn whitelist(&self) -> BTreeSet<char> {
        self.character_whitelist.chars().collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Recognition config name cannot be empty".to_string());
        }
        if self.language.trim().is_empty() {
            return Err(format!("Recognition config '{}' has an empty language", self.name));
        }
        Ok(())
    }

    /// The two-entry default catalog: identical except for segmentation mode and whitelist.
    pub fn default_catalog() -> Vec<RecognitionConfig> {
        vec![
            RecognitionConfig::new("Standard", PageSegmentationMode::Auto).with_interword_spacing(true),
            RecognitionConfig::new("Precise", PageSegmentationMode::SingleBlock)
                .with_whitelist(PRECISE_WHITELIST)
                .with_interword_spacing(true),
        ]
    }
}

/// Pixel rectangle of a recognized token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// A single recognized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(default)]
    pub bbox: BoundingBox,
    /// 0..100, as reported by the engine.
    pub confidence: f64,
}

/// What an engine returns for one image/config pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionOutput {
    pub text: String,
    /// 0..100
    pub confidence: f64,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

/// A completed pass, tagged with the catalog entry that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPassResult {
    pub config_name: String,
    pub catalog_index: usize,
    pub text: String,
    /// 0..100
    pub overall_confidence: f64,
    pub tokens: Vec<Token>,
}

impl RawPassResult {
    pub fn from_output(config_name: impl Into<String>, catalog_index: usize, output: RecognitionOutput) -> Self {
        Self {
            config_name: config_name.into(),
            catalog_index,
            text: output.text,
            overall_confidence: output.confidence.clamp(0.0, 100.0),
            tokens: output.tokens,
        }
    }
}

/// Why a single pass produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum PassFailure {
    #[error("engine error: {0}")]
    Engine(String),
    #[error("timed out")]
    Timeout,
    #[error("cancelled")]
    Cancelled,
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// Per-config result of a multi-pass run. Failed passes are recorded, never substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    Recognized(RawPassResult),
    Failed {
        config_name: String,
        catalog_index: usize,
        failure: PassFailure,
    },
}

impl PassOutcome {
    pub fn config_name(&self) -> &str {
        match self {
            PassOutcome::Recognized(result) => &result.config_name,
            PassOutcome::Failed { config_name, .. } => config_name,
        }
    }

    pub fn catalog_index(&self) -> usize {
        match self {
            PassOutcome::Recognized(result) => result.catalog_index,
            PassOutcome::Failed { catalog_index, .. } => *catalog_index,
        }
    }

    pub fn as_result(&self) -> Option<&RawPassResult> {
        match self {
            PassOutcome::Recognized(result) => Some(result),
            PassOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PassOutcome::Failed { .. })
    }
}

/// Reason code for a run that ended without a usable record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("all recognition passes failed")]
    AllPassesFailed,
    #[error("recognition timed out")]
    Timeout,
    #[error("recognition engine unavailable: {0}")]
    EngineUnavailable(String),
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::AllPassesFailed => "AllPassesFailed",
            FailureReason::Timeout => "Timeout",
            FailureReason::EngineUnavailable(_) => "EngineUnavailable",
        }
    }
}

/// Terminal result of a pipeline stage.
///
/// Cancellation is its own variant and never an error: callers always see exactly one of
/// a value, a labeled failure, or `Cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Completed(T),
    Failed(FailureReason),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Reason code for terminal non-success outcomes.
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Failed(reason) => Some(reason.code()),
            Outcome::Cancelled => Some("Cancelled"),
        }
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            _ => None,
        }
    }
}
