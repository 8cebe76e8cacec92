//! gendoc - Documentation Normalization and Export Pipeline
//!
//! Turns heterogeneous JSON snapshots (entries, rules, API descriptions,
//! key/value configuration) into a uniform entry model, renders them as
//! Markdown or JSON, computes diffs between snapshots, and pushes the
//! result through pluggable export backends.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gendoc::docs::{generate_docs_from_input, GenerateRequest};
//!
//! let request = GenerateRequest {
//!     input: serde_json::json!({"entries": [{"title": "T", "content": "C"}]}),
//!     ..Default::default()
//! };
//! let output = generate_docs_from_input(&request)?;
//! println!("{}", output.to_display_string());
//! ```
//!
//! ## Modules
//!
//! - [`normalize`]: Format detection and normalization to the entry model
//! - [`render`]: Markdown and JSON projection of normalized entries
//! - [`diff`]: Key-based change detection between snapshots
//! - [`docs`]: High-level generate/validate/diff operations
//! - [`export`]: Exporter trait, registry and built-in backends
//! - [`config`]: Hierarchical configuration resolution

pub mod cli;
pub mod config;
pub mod diff;
pub mod docs;
pub mod export;
pub mod normalize;
pub mod render;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::{DocError, Result};

// Entry Model
pub use types::{Entry, Format, Lang};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use docs::{
    generate_docs_from_diff, generate_docs_from_input, validate_documentation, DiffRequest,
    DocOutput, DocValidation, GenerateRequest, OutputFormat,
};

pub use normalize::{detect_format, normalize};

// =============================================================================
// Export Re-exports
// =============================================================================

pub use export::{
    ConfluenceExporter, ExportContent, ExportOptions, ExportResult, Exporter, ExporterRegistry,
    HtmlExporter, MarkdownExporter, PdfExporter, Validation,
};
