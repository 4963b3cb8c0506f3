//! # Invoice Fixer - settings-driven clean-up of invoice exports
//!
//! Reads a CSV invoice export, applies an ordered set of edits described in a
//! plain-text settings file, and writes the corrected CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV File   │────▶│   Parser    │────▶│  Pipeline   │────▶│  CSV File   │
//! │ (UTF8/1252) │     │ (quote-aware│     │ (6 stages,  │     │  (UTF-8)    │
//! └─────────────┘     │  records)   │     │  settings)  │     └─────────────┘
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use invoice_fixer::{parse_table, render_table, run_pipeline, RunLog, Settings};
//!
//! let mut log = RunLog::new();
//! let settings = Settings::parse("due date additional days:5\n", &mut log);
//! let mut table = parse_table("*Description,*DueDate\nFee 01/02/23,30/01/2024\n").unwrap();
//!
//! run_pipeline(&mut table, &settings, &mut log);
//! assert_eq!(render_table(&table), "*Description,*DueDate\n01/02/23 Fee ,04/02/2024\n");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types and reportable conditions
//! - [`logs`] - Per-run log
//! - [`models`] - Table and Row
//! - [`parser`] - Quote-aware CSV reading and writing
//! - [`settings`] - Settings file parser
//! - [`transform`] - Pipeline stages

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;
pub mod settings;

// Transformation
pub mod transform;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, CsvResult, Issue, PipelineError, PipelineResult, SettingsError, SettingsResult,
};

// =============================================================================
// Re-exports - Logging
// =============================================================================

pub use logs::{LogEntry, LogLevel, RunLog};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Row, Table};

// =============================================================================
// Re-exports - CSV
// =============================================================================

pub use parser::{
    decode_content, detect_encoding, parse_bytes_auto, parse_table, read_table,
    read_table_or_empty, render_table, tokenize, unquoted, write_table, write_table_to,
    LogicalRecords, ParseResult,
};

// =============================================================================
// Re-exports - Settings
// =============================================================================

pub use settings::{
    AppendageRule, ColumnAppendages, ColumnReplacements, ReplacementPair, Settings, SortDirection,
    SortKey, DEFAULT_POSTFIX,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    process_file, process_file_with_settings, run_pipeline, stages_description, PipelineSummary,
    Stage, StageStatus,
};
