//! Error types for Lekha.
//!
//! `LekhaError` covers the fallible infrastructure around the pipeline: loading
//! configuration, constructing engines, submitting work to the pool, decoding images
//! and serializing records.
//!
//! Terminal pipeline results are deliberately *not* errors. A run that was cancelled
//! or in which every pass failed resolves to [`crate::types::Outcome`], and validation
//! problems come back as structured diagnostics alongside the record.
//!
//! # Error Handling Philosophy
//!
//! **System errors MUST always bubble up unchanged:**
//! - `LekhaError::Io` (from `std::io::Error`) - File system errors, permission errors
//!
//! **Application errors are wrapped with context:**
//! - `Config` - Invalid configuration files or values
//! - `Recognition` - Engine failures
//! - `ImageProcessing` - Image decode / enhancement failures
//! - `Serialization` - JSON/TOML/YAML encoding problems
use thiserror::Error;

/// Result type alias using `LekhaError`.
pub type Result<T> = std::result::Result<T, LekhaError>;

/// Main error type for all Lekha operations.
#[derive(Debug, Error)]
pub enum LekhaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Recognition error: {message}")]
    Recognition {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Image processing error: {message}")]
    ImageProcessing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Worker pool has been shut down")]
    PoolShutdown,
}

impl From<serde_json::Error> for LekhaError {
    fn from(err: serde_json::Error) -> Self {
        LekhaError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl LekhaError {
    error_constructor!(config, Config);
    error_constructor!(recognition, Recognition);
    error_constructor!(image_processing, ImageProcessing);
    error_constructor!(serialization, Serialization);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LekhaError = io_err.into();
        assert!(matches!(err, LekhaError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_config_error() {
        let err = LekhaError::config("catalog is empty");
        assert_eq!(err.to_string(), "Configuration error: catalog is empty");
    }

    #[test]
    fn test_config_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad toml");
        let err = LekhaError::config_with_source("invalid file", source);
        assert_eq!(err.to_string(), "Configuration error: invalid file");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_recognition_error() {
        let err = LekhaError::recognition("engine crashed");
        assert_eq!(err.to_string(), "Recognition error: engine crashed");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_image_processing_error_with_source() {
        let source = std::io::Error::other("decode failed");
        let err = LekhaError::image_processing_with_source("unreadable image", source);
        assert_eq!(err.to_string(), "Image processing error: unreadable image");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_pool_shutdown_display() {
        assert_eq!(LekhaError::PoolShutdown.to_string(), "Worker pool has been shut down");
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: LekhaError = json_err.into();
        assert!(matches!(err, LekhaError::Serialization { .. }));
    }

    #[test]
    fn test_io_error_bubbles_unchanged() {
        fn read_file() -> Result<String> {
            let content = std::fs::read_to_string("/nonexistent/lekha/file.json")?;
            Ok(content)
        }

        assert!(matches!(read_file().unwrap_err(), LekhaError::Io(_)));
    }
}
