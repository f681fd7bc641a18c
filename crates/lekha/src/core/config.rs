//! Configuration loading and management.
//!
//! `LekhaConfig` can be loaded from TOML, YAML, or JSON files, discovered from the
//! working directory upwards (`lekha.toml`), or built programmatically.

use crate::types::RecognitionConfig;
use crate::{LekhaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// File name searched for by [`LekhaConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "lekha.toml";

/// Main pipeline configuration.
///
/// # Example
///
/// ```rust
/// use lekha::core::config::LekhaConfig;
///
/// let config = LekhaConfig::default();
/// assert_eq!(config.catalog.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LekhaConfig {
    /// Number of recognition workers (None = min(num_cpus, catalog length), at least 1).
    #[serde(default)]
    pub pool_size: Option<usize>,

    /// Per-job timeout in milliseconds, measured from dispatch (None = no timeout).
    #[serde(default)]
    pub job_timeout_ms: Option<u64>,

    /// Ordered recognition catalog. Order is the tie-break priority during voting.
    #[serde(default = "RecognitionConfig::default_catalog")]
    pub catalog: Vec<RecognitionConfig>,

    #[serde(default)]
    pub extraction: ExtractionSettings,

    #[serde(default)]
    pub validation: ValidationSettings,
}

/// Field extraction tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Upper bound for a field value seen in exactly one pass.
    #[serde(default = "default_single_source_ceiling")]
    pub single_source_ceiling: f64,

    /// Two-digit years at or below this map to 20yy, above it to 19yy.
    #[serde(default = "default_two_digit_year_pivot")]
    pub two_digit_year_pivot: u32,
}

/// Validation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSettings {
    #[serde(default = "default_min_validity_years")]
    pub min_validity_years: u32,

    #[serde(default = "default_max_validity_years")]
    pub max_validity_years: u32,

    /// Youngest plausible holder age on the issue date.
    #[serde(default = "default_min_holder_age")]
    pub min_holder_age: u32,
}

fn default_single_source_ceiling() -> f64 {
    0.8
}
fn default_two_digit_year_pivot() -> u32 {
    50
}
fn default_min_validity_years() -> u32 {
    5
}
fn default_max_validity_years() -> u32 {
    10
}
fn default_min_holder_age() -> u32 {
    16
}

impl Default for LekhaConfig {
    fn default() -> Self {
        Self {
            pool_size: None,
            job_timeout_ms: None,
            catalog: RecognitionConfig::default_catalog(),
            extraction: ExtractionSettings::default(),
            validation: ValidationSettings::default(),
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            single_source_ceiling: default_single_source_ceiling(),
            two_digit_year_pivot: default_two_digit_year_pivot(),
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            min_validity_years: default_min_validity_years(),
            max_validity_years: default_max_validity_years(),
            min_holder_age: default_min_holder_age(),
        }
    }
}

impl LekhaConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `LekhaError::Config` if the file doesn't exist, is invalid TOML, or fails
    /// [`LekhaConfig::validate`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LekhaError::config(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| LekhaError::config(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LekhaError::config(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, picking the format from its extension (`.toml`, `.yaml`/`.yml`, `.json`).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            other => Err(LekhaError::config(format!(
                "Unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Discover `lekha.toml` in the current directory or any parent directory.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(LekhaError::Io)?;
        Self::discover_from(&current)
    }

    /// Same as [`LekhaConfig::discover`] but starting at `start`.
    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "discovered config file");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.is_empty() {
            return Err(LekhaError::config("Recognition catalog must contain at least one entry"));
        }

        let mut seen = HashSet::new();
        for entry in &self.catalog {
            entry.validate().map_err(LekhaError::config)?;
            if !seen.insert(entry.name.as_str()) {
                return Err(LekhaError::config(format!(
                    "Duplicate recognition config name '{}'",
                    entry.name
                )));
            }
        }

        if self.pool_size == Some(0) {
            return Err(LekhaError::config("pool_size must be at least 1"));
        }

        if !(0.0..=1.0).contains(&self.extraction.single_source_ceiling) {
            return Err(LekhaError::config(format!(
                "single_source_ceiling must be within 0..=1, got {}",
                self.extraction.single_source_ceiling
            )));
        }

        if self.extraction.two_digit_year_pivot > 99 {
            return Err(LekhaError::config(format!(
                "two_digit_year_pivot must be within 0..=99, got {}",
                self.extraction.two_digit_year_pivot
            )));
        }

        if self.validation.min_validity_years > self.validation.max_validity_years {
            return Err(LekhaError::config(format!(
                "min_validity_years ({}) exceeds max_validity_years ({})",
                self.validation.min_validity_years, self.validation.max_validity_years
            )));
        }

        Ok(())
    }

    /// Effective worker count.
    pub fn effective_pool_size(&self) -> usize {
        self.pool_size
            .unwrap_or_else(|| num_cpus::get().min(self.catalog.len()))
            .max(1)
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_ms.map(Duration::from_millis)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| LekhaError::config(format!("Failed to read config file {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageSegmentationMode;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = LekhaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog.len(), 2);
        assert_eq!(config.extraction.single_source_ceiling, 0.8);
        assert_eq!(config.extraction.two_digit_year_pivot, 50);
        assert_eq!(config.validation.min_validity_years, 5);
        assert_eq!(config.validation.max_validity_years, 10);
        assert!(config.job_timeout().is_none());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("lekha.toml");

        fs::write(
            &config_path,
            r#"
pool_size = 3
job_timeout_ms = 1500

[extraction]
single_source_ceiling = 0.75

[[catalog]]
name = "Fast"
page_segmentation_mode = "auto"

[[catalog]]
name = "Digits"
page_segmentation_mode = "single_line"
character_whitelist = "0123456789-"
        "#,
        )
        .unwrap();

        let config = LekhaConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.pool_size, Some(3));
        assert_eq!(config.job_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.extraction.single_source_ceiling, 0.75);
        assert_eq!(config.extraction.two_digit_year_pivot, 50);
        assert_eq!(config.catalog.len(), 2);
        assert_eq!(config.catalog[1].page_segmentation_mode, PageSegmentationMode::SingleLine);
        assert_eq!(config.effective_pool_size(), 3);
    }

    #[test]
    fn test_missing_catalog_uses_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("lekha.toml");
        fs::write(&config_path, "pool_size = 1\n").unwrap();

        let config = LekhaConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.catalog, RecognitionConfig::default_catalog());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("lekha.yaml");
        fs::write(
            &config_path,
            r#"
pool_size: 2
validation:
  min_validity_years: 3
  max_validity_years: 12
"#,
        )
        .unwrap();

        let config = LekhaConfig::from_file(&config_path).unwrap();
        assert_eq!(config.validation.min_validity_years, 3);
        assert_eq!(config.validation.max_validity_years, 12);
        assert_eq!(config.validation.min_holder_age, 16);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("lekha.json");
        fs::write(&config_path, r#"{"job_timeout_ms": 250, "extraction": {"two_digit_year_pivot": 30}}"#).unwrap();

        let config = LekhaConfig::from_file(&config_path).unwrap();
        assert_eq!(config.job_timeout_ms, Some(250));
        assert_eq!(config.extraction.two_digit_year_pivot, 30);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = LekhaConfig::from_file("config.ini").unwrap_err();
        assert!(matches!(err, LekhaError::Config { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("lekha.toml");
        fs::write(&config_path, "pool_size = = 3").unwrap();

        let err = LekhaConfig::from_toml_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_missing_file() {
        let err = LekhaConfig::from_toml_file("/nonexistent/lekha.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let mut config = LekhaConfig::default();
        config.catalog.push(RecognitionConfig::new("Standard", PageSegmentationMode::SingleLine));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_validate_rejects_empty_catalog() {
        let config = LekhaConfig {
            catalog: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ceiling_and_pool() {
        let mut config = LekhaConfig::default();
        config.extraction.single_source_ceiling = 1.5;
        assert!(config.validate().is_err());

        let config = LekhaConfig {
            pool_size: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discover_from_parent_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "job_timeout_ms = 900\n").unwrap();
        let nested = dir.path().join("scans").join("2024");
        fs::create_dir_all(&nested).unwrap();

        let config = LekhaConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.job_timeout_ms, Some(900));
    }

    #[test]
    fn test_effective_pool_size_default_is_bounded_by_catalog() {
        let config = LekhaConfig::default();
        let size = config.effective_pool_size();
        assert!(size >= 1 && size <= 2);
    }
}
