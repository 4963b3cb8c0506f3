//! Error types for the invoice clean-up pipeline.
//!
//! Two families live here:
//!
//! - Hard errors ([`CsvError`], [`SettingsError`], [`PipelineError`]) returned
//!   at resource boundaries, where a file could not be read or written.
//! - [`Issue`] - recoverable conditions that degrade one row, one column or
//!   one stage. Issues are recorded in the [`crate::logs::RunLog`] and never
//!   abort a run.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing a table resource.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write the file.
    #[error("Cannot access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content could not be decoded.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// The resource has no heading line.
    #[error("CSV file is empty")]
    EmptyFile,
}

// =============================================================================
// Settings Errors
// =============================================================================

/// Errors while loading the settings resource.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file.
    #[error("Cannot read settings '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors for a complete file-to-file run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Table read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Settings error.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

// =============================================================================
// Reportable conditions
// =============================================================================

/// A recoverable condition met during a run.
///
/// Each variant maps to one degrade-to-no-op path: the affected row, column
/// or stage is left alone and processing carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Issue {
    /// An input or settings resource is absent or unreadable.
    #[error("Resource '{resource}' unavailable: {reason}")]
    MissingResource { resource: String, reason: String },

    /// A stage or rule names a heading the table does not have.
    #[error("{stage}: column '{column}' not found, skipping")]
    MissingColumn { stage: &'static str, column: String },

    /// A settings line could not be understood.
    #[error("Settings line {line}: {reason} ('{content}')")]
    MalformedConfigLine {
        line: usize,
        content: String,
        reason: String,
    },

    /// A date cell did not parse; the row keeps a fallback value.
    #[error("{stage}: row {row}: cannot parse date '{value}'")]
    UnparsableDate {
        stage: &'static str,
        row: usize,
        value: String,
    },

    /// The setting that drives a stage is absent or zero.
    #[error("{stage}: {reason}")]
    SettingAbsent { stage: &'static str, reason: String },
}

impl Issue {
    /// Short machine-friendly name of the condition class.
    pub fn kind(&self) -> &'static str {
        match self {
            Issue::MissingResource { .. } => "missing_resource",
            Issue::MissingColumn { .. } => "missing_column",
            Issue::MalformedConfigLine { .. } => "malformed_config_line",
            Issue::UnparsableDate { .. } => "unparsable_date",
            Issue::SettingAbsent { .. } => "setting_absent",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table I/O.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for settings I/O.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Result type for full runs.
pub type PipelineResult<T> = Result<T, PipelineError>;
