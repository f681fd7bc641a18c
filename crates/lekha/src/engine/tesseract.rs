//! Native Tesseract engine.
//!
//! Each worker owns one `TesseractAPI`. The context is initialised lazily and re-initialised
//! only when a job asks for a different language, so consecutive passes on the same worker
//! reuse the loaded traineddata.

use std::env;
use std::path::Path;

use kreuzberg_tesseract::{TessPageSegMode, TesseractAPI};

use super::tsv::{mean_confidence, parse_tsv_tokens};
use super::{EngineFactory, RecognitionEngine};
use crate::types::{RecognitionConfig, RecognitionOutput};
use crate::{LekhaError, Result};

const FALLBACK_TESSDATA_PATHS: [&str; 9] = [
    "/opt/homebrew/share/tessdata",
    "/opt/homebrew/opt/tesseract/share/tessdata",
    "/usr/local/opt/tesseract/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    r#"C:\Program Files\Tesseract-OCR\tessdata"#,
    r#"C:\ProgramData\Tesseract-OCR\tessdata"#,
];

/// Resolve the tessdata directory from `TESSDATA_PREFIX` or well-known install locations.
pub fn resolve_tessdata_path() -> Option<String> {
    env::var("TESSDATA_PREFIX").ok().or_else(|| {
        FALLBACK_TESSDATA_PATHS
            .iter()
            .find(|p| Path::new(p).exists())
            .map(|p| (*p).to_string())
    })
}

/// Deduplicated, ordered whitelist. Empty lifts the restriction.
fn whitelist_variable(config: &RecognitionConfig) -> String {
    config.whitelist().into_iter().collect()
}

fn strip_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}') || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

pub struct TesseractEngine {
    tessdata_path: String,
    api: Option<TesseractAPI>,
    loaded_language: Option<String>,
}

impl TesseractEngine {
    pub fn new(tessdata_path: impl Into<String>) -> Self {
        Self {
            tessdata_path: tessdata_path.into(),
            api: None,
            loaded_language: None,
        }
    }

    /// Factory using the resolved tessdata directory.
    pub fn factory() -> Result<impl EngineFactory> {
        let tessdata_path = resolve_tessdata_path()
            .ok_or_else(|| LekhaError::EngineUnavailable("tessdata directory not found".to_string()))?;
        Ok(move |worker_index: usize| -> Result<Box<dyn RecognitionEngine>> {
            tracing::debug!(worker_index, tessdata = %tessdata_path, "creating tesseract context");
            Ok(Box::new(TesseractEngine::new(tessdata_path.clone())))
        })
    }

    fn ensure_language(&mut self, language: &str) -> Result<&TesseractAPI> {
        // tesseract aborts on an empty language or a missing traineddata file
        if language.trim().is_empty() {
            return Err(LekhaError::recognition("Language cannot be empty"));
        }
        for lang in language.split('+').map(str::trim).filter(|l| !l.is_empty()) {
            let traineddata = Path::new(&self.tessdata_path).join(format!("{}.traineddata", lang));
            if !traineddata.exists() {
                return Err(LekhaError::EngineUnavailable(format!(
                    "Language '{}' not found: {}",
                    lang,
                    traineddata.display()
                )));
            }
        }

        if self.loaded_language.as_deref() != Some(language) || self.api.is_none() {
            let api = TesseractAPI::new();
            api.init(&self.tessdata_path, language).map_err(|e| {
                LekhaError::EngineUnavailable(format!("Failed to initialize language '{}': {}", language, e))
            })?;
            self.api = Some(api);
            self.loaded_language = Some(language.to_string());
        }

        self.api
            .as_ref()
            .ok_or_else(|| LekhaError::EngineUnavailable("tesseract context missing".to_string()))
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&mut self, image: &[u8], config: &RecognitionConfig) -> Result<RecognitionOutput> {
        let img = image::load_from_memory(image)
            .map_err(|e| LekhaError::image_processing(format!("Failed to decode image: {}", e)))?;
        let rgb_image = img.to_rgb8();
        let (width, height) = rgb_image.dimensions();
        let bytes_per_pixel = 3;
        let bytes_per_line = width * bytes_per_pixel;

        let api = self.ensure_language(&config.language)?;

        let psm = TessPageSegMode::from_int(config.page_segmentation_mode.as_u8() as i32);
        api.set_page_seg_mode(psm)
            .map_err(|e| LekhaError::recognition(format!("Failed to set PSM mode: {}", e)))?;

        // Always set the whitelist so a previous pass on this worker cannot leak into this one.
        api.set_variable("tessedit_char_whitelist", &whitelist_variable(config))
            .map_err(|e| LekhaError::recognition(format!("Failed to set tessedit_char_whitelist: {}", e)))?;

        let preserve = if config.preserve_interword_spacing { "1" } else { "0" };
        api.set_variable("preserve_interword_spaces", preserve)
            .map_err(|e| LekhaError::recognition(format!("Failed to set preserve_interword_spaces: {}", e)))?;

        api.set_image(
            rgb_image.as_raw(),
            width as i32,
            height as i32,
            bytes_per_pixel as i32,
            bytes_per_line as i32,
        )
        .map_err(|e| LekhaError::recognition(format!("Failed to set image: {}", e)))?;

        api.recognize()
            .map_err(|e| LekhaError::recognition(format!("Failed to recognize text: {}", e)))?;

        let text = api
            .get_utf8_text()
            .map_err(|e| LekhaError::recognition(format!("Failed to extract text: {}", e)))?;
        let tsv = api
            .get_tsv_text(0)
            .map_err(|e| LekhaError::recognition(format!("Failed to extract TSV: {}", e)))?;

        let tokens = parse_tsv_tokens(&tsv, 0.0);
        let confidence = match api.mean_text_conf() {
            Ok(mean) => mean as f64,
            Err(_) => mean_confidence(&tokens),
        };

        Ok(RecognitionOutput {
            text: strip_control_characters(&text),
            confidence,
            tokens,
        })
    }
}
