//! Deterministic engine that replays recorded pass outputs.
//!
//! A [`ReplayScript`] maps catalog config names to what the engine "saw" for that
//! configuration. Scripts are plain JSON so captured Tesseract runs can be stored next
//! to the image and re-extracted offline:
//!
//! ```json
//! {
//!   "passes": {
//!     "Standard": { "output": { "text": "D.L. No: 03-066-041605", "confidence": 91.0 } },
//!     "Precise":  { "error": "engine crashed", "delay_ms": 20 }
//!   }
//! }
//! ```

use super::{EngineFactory, RecognitionEngine};
use crate::types::{BoundingBox, RecognitionConfig, RecognitionOutput, Token};
use crate::{LekhaError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Recorded behaviour of one configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedPass {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<RecognitionOutput>,

    /// When set, the pass fails with this message instead of returning `output`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Simulated recognition latency.
    #[serde(default)]
    pub delay_ms: u64,
}

impl RecordedPass {
    pub fn output(output: RecognitionOutput) -> Self {
        Self {
            output: Some(output),
            ..Default::default()
        }
    }

    /// Builds an output whose tokens are the whitespace-separated words of `text`, laid
    /// out one line per row, all at `confidence`.
    pub fn from_text(text: &str, confidence: f64) -> Self {
        let mut tokens = Vec::new();
        for (row, line) in text.lines().enumerate() {
            let mut left = 0u32;
            for word in line.split_whitespace() {
                let width = 12 * word.chars().count() as u32;
                tokens.push(Token {
                    text: word.to_string(),
                    bbox: BoundingBox {
                        left,
                        top: 40 * row as u32,
                        width,
                        height: 30,
                    },
                    confidence,
                });
                left += width + 12;
            }
        }

        Self::output(RecognitionOutput {
            text: text.to_string(),
            confidence,
            tokens,
        })
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }
}

/// Recorded outputs for a whole catalog, keyed by config name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub passes: IndexMap<String, RecordedPass>,
}

impl ReplayScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pass(mut self, config_name: impl Into<String>, pass: RecordedPass) -> Self {
        self.passes.insert(config_name.into(), pass);
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            LekhaError::serialization_with_source(format!("Invalid replay script {}", path.display()), e)
        })
    }

    /// Factory handing every worker its own engine over the shared script.
    pub fn into_factory(self) -> impl EngineFactory {
        let script = Arc::new(self);
        move |_worker_index: usize| -> Result<Box<dyn RecognitionEngine>> {
            Ok(Box::new(ReplayEngine::new(Arc::clone(&script))))
        }
    }
}

/// Engine backed by a [`ReplayScript`].
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    script: Arc<ReplayScript>,
    calls: usize,
}

impl ReplayEngine {
    pub fn new(script: Arc<ReplayScript>) -> Self {
        Self { script, calls: 0 }
    }

    /// Number of recognition calls served by this instance.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl RecognitionEngine for ReplayEngine {
    fn name(&self) -> &str {
        "replay"
    }

    fn recognize(&mut self, _image: &[u8], config: &RecognitionConfig) -> Result<RecognitionOutput> {
        self.calls += 1;

        let pass = self.script.passes.get(&config.name).ok_or_else(|| {
            LekhaError::recognition(format!("No recorded pass for config '{}'", config.name))
        })?;

        if pass.delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(pass.delay_ms));
        }

        if let Some(message) = &pass.error {
            return Err(LekhaError::recognition(message.clone()));
        }

        pass.output
            .clone()
            .ok_or_else(|| LekhaError::recognition(format!("Recorded pass '{}' has no output", config.name)))
    }
}
