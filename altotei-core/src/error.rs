//! Error and warning types.
//!
//! Errors abort the run (unreadable or malformed input, bad configuration).
//! Warnings describe content-shape anomalies that were absorbed so that no
//! text is lost; they are collected in reports and logged, never fatal.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for altotei operations.
pub type Result<T> = std::result::Result<T, AltoTeiError>;

#[derive(Error, Debug)]
pub enum AltoTeiError {
    /// I/O error when reading pages or writing artifacts/output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The page file is not well-formed markup or lacks the ALTO text-line/geometry structure.
    #[error("Malformed input {}: {reason}", .path.display())]
    MalformedInput { path: PathBuf, reason: String },

    /// XML writer/reader failure outside of page loading.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid configuration (YAML or pattern).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation was requested and a page failed it.
    #[error("Validation failed for {}: {}", .path.display(), .issues.join("; "))]
    ValidationFailed { path: PathBuf, issues: Vec<String> },

    /// The external OCR tool could not be run or reported failure.
    #[error("External tool error: {0}")]
    ExternalTool(String),
}

impl AltoTeiError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AltoTeiError::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<regex::Error> for AltoTeiError {
    fn from(err: regex::Error) -> Self {
        AltoTeiError::Config(format!("invalid pattern: {err}"))
    }
}

impl From<serde_yaml::Error> for AltoTeiError {
    fn from(err: serde_yaml::Error) -> Self {
        AltoTeiError::Config(err.to_string())
    }
}

/// Non-fatal anomaly recorded while processing a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Warning {
    /// A line matched no field pattern and was kept under the residual role.
    UnrecognizedField {
        page_id: String,
        work_number: u32,
        line: String,
    },
    /// Position data unusable; the page kept its source order.
    DegenerateGeometry {
        page_id: String,
        block_ids: Vec<String>,
    },
    /// Lines seen before the first entry marker of the run.
    OrphanLines { page_id: String, count: usize },
    /// The run ended with an entry holding fewer works than the layout requires.
    IncompleteEntry {
        entry_number: u32,
        works: usize,
        expected: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnrecognizedField {
                page_id,
                work_number,
                line,
            } => write!(
                f,
                "{page_id}: work {work_number}: unrecognized field kept as unclassified: \"{line}\""
            ),
            Warning::DegenerateGeometry { page_id, block_ids } => write!(
                f,
                "{page_id}: degenerate geometry in block(s) {}, source order kept",
                block_ids.join(", ")
            ),
            Warning::OrphanLines { page_id, count } => write!(
                f,
                "{page_id}: {count} line(s) before the first entry marker"
            ),
            Warning::IncompleteEntry {
                entry_number,
                works,
                expected,
            } => write!(
                f,
                "entry {entry_number} closed with {works} work(s), layout expects {expected}"
            ),
        }
    }
}

impl Warning {
    /// Log through tracing and hand the warning back for collection
    pub fn emit(self) -> Self {
        tracing::warn!("⚠️  {}", self);
        self
    }
}
