//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Design Principles
//!
//! - Single unified error type (DocError) for the entire application
//! - Input-shape errors are fatal to the call that raised them
//! - External I/O failures inside `export()` never surface here: exporters
//!   convert them into `ExportResult { success: false, .. }`
//! - Validation findings are data, not errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    /// Raised when no recognized input shape matches. Never recovered locally.
    #[error("Unknown input format. Supported: entries, rules, api, config")]
    UnknownFormat,

    #[error("Missing input data: {0}")]
    MissingInput(String),

    #[error("Config error: {0}")]
    Config(String),

    /// Failure loading an exporter-specific configuration file. File absence
    /// is not an error (defaults apply); this is reserved for parse failures.
    #[error("Failed to load {exporter} configuration: {message}")]
    ExporterConfig { exporter: String, message: String },

    #[error("Unknown exporter: {0}")]
    UnknownExporter(String),

    /// Raised by commands that promote validation findings to a failing
    /// exit status.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for DocError {
    fn from(err: reqwest::Error) -> Self {
        DocError::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocError>;

impl DocError {
    /// Create an exporter configuration error
    pub fn exporter_config(exporter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExporterConfig {
            exporter: exporter.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_names_supported_shapes() {
        let msg = DocError::UnknownFormat.to_string();
        assert!(msg.contains("entries"));
        assert!(msg.contains("rules"));
        assert!(msg.contains("api"));
        assert!(msg.contains("config"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DocError = io.into();
        assert!(matches!(err, DocError::Io(_)));
    }

    #[test]
    fn test_exporter_config_display() {
        let err = DocError::exporter_config("markdown", "bad json");
        assert_eq!(
            err.to_string(),
            "Failed to load markdown configuration: bad json"
        );
    }
}
