//! High-level pipeline API: the fixed stage order and file-to-file runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use invoice_fixer::{process_file, RunLog};
//!
//! let mut log = RunLog::new();
//! let summary = process_file("invoices.csv", "settings.txt", "invoices_new.csv", &mut log)?;
//! println!("{} rows, {} issues", summary.rows, summary.issues);
//! # Ok::<(), invoice_fixer::PipelineError>(())
//! ```

use serde::Serialize;
use std::path::Path;

use crate::error::PipelineResult;
use crate::logs::RunLog;
use crate::models::Table;
use crate::parser::{read_table_or_empty, write_table};
use crate::settings::Settings;

use super::dates::{
    extract_description_dates, reinsert_description_dates, shift_due_dates, DUE_DATE_STAGE,
    EXTRACT_STAGE, REINSERT_STAGE,
};
use super::sort::{sort_rows, SORT_STAGE};
use super::text::{apply_appendages, apply_replacements, APPEND_STAGE, REPLACE_STAGE};

/// Whether a stage changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Applied,
    Skipped,
}

// =============================================================================
// Stages
// =============================================================================

/// One table-wide pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Pull `dd/mm/yy` out of `*Description` into scratch columns
    ExtractDescriptionDates,
    /// Literal per-column text replacements
    ReplaceText,
    /// Multi-key stable sort
    SortRows,
    /// Put the extracted date back in front of the description
    ReinsertDescriptionDates,
    /// Add the configured days to `*DueDate`
    ShiftDueDates,
    /// Conditional per-column appendages
    AppendText,
}

impl Stage {
    /// Every stage, in the order the pipeline runs them.
    pub const ALL: [Stage; 6] = [
        Stage::ExtractDescriptionDates,
        Stage::ReplaceText,
        Stage::SortRows,
        Stage::ReinsertDescriptionDates,
        Stage::ShiftDueDates,
        Stage::AppendText,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::ExtractDescriptionDates => EXTRACT_STAGE,
            Stage::ReplaceText => REPLACE_STAGE,
            Stage::SortRows => SORT_STAGE,
            Stage::ReinsertDescriptionDates => REINSERT_STAGE,
            Stage::ShiftDueDates => DUE_DATE_STAGE,
            Stage::AppendText => APPEND_STAGE,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Stage::ExtractDescriptionDates => {
                "Move the first dd/mm/yy of *Description into DescDate / DescDateTimeStamp"
            }
            Stage::ReplaceText => "Apply the 'replacements:' pairs to their columns",
            Stage::SortRows => "Stable sort by the 'sort order:' keys, most significant first",
            Stage::ReinsertDescriptionDates => {
                "Prefix *Description with DescDate and drop the scratch columns"
            }
            Stage::ShiftDueDates => "Add 'due date additional days' to every *DueDate",
            Stage::AppendText => "Append 'appendages:' text where a trigger occurs",
        }
    }

    /// Run this stage over the table.
    pub fn apply(&self, table: &mut Table, settings: &Settings, log: &mut RunLog) -> StageStatus {
        match self {
            Stage::ExtractDescriptionDates => extract_description_dates(table, log),
            Stage::ReplaceText => apply_replacements(table, settings, log),
            Stage::SortRows => sort_rows(table, settings, log),
            Stage::ReinsertDescriptionDates => reinsert_description_dates(table, log),
            Stage::ShiftDueDates => shift_due_dates(table, settings, log),
            Stage::AppendText => apply_appendages(table, settings, log),
        }
    }
}

/// Get a description of all stages, in order
pub fn stages_description() -> String {
    let mut out = String::from("Pipeline stages (run in this order):\n\n");
    for (i, stage) in Stage::ALL.iter().enumerate() {
        out.push_str(&format!("{}. {:<18} {}\n", i + 1, stage.name(), stage.description()));
    }
    out
}

// =============================================================================
// Running
// =============================================================================

/// Outcome of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    /// Rows in the final table
    pub rows: usize,
    /// Stages that changed the table
    pub applied: Vec<Stage>,
    /// Stages that degraded to a no-op
    pub skipped: Vec<Stage>,
    /// Issues recorded in the run log so far
    pub issues: usize,
}

/// Run every stage over the table, in the fixed order.
pub fn run_pipeline(table: &mut Table, settings: &Settings, log: &mut RunLog) -> PipelineSummary {
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for stage in Stage::ALL {
        log.info(format!("Stage: {}", stage.name()));
        match stage.apply(table, settings, log) {
            StageStatus::Applied => applied.push(stage),
            StageStatus::Skipped => skipped.push(stage),
        }
    }

    log.success(format!(
        "{} rows processed, {} stage(s) applied, {} skipped",
        table.len(),
        applied.len(),
        skipped.len()
    ));

    PipelineSummary {
        rows: table.len(),
        applied,
        skipped,
        issues: log.issues().len(),
    }
}

/// Read `input`, run the pipeline with the settings file, write `output`.
///
/// An unreadable settings file or an unwritable output is a hard error. An
/// unreadable or empty input is reported and processed as an empty table.
pub fn process_file(
    input: impl AsRef<Path>,
    settings_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    log: &mut RunLog,
) -> PipelineResult<PipelineSummary> {
    let settings = Settings::load(settings_path, log)?;
    process_file_with_settings(input, &settings, output, log)
}

/// [`process_file`] with settings the caller already loaded.
pub fn process_file_with_settings(
    input: impl AsRef<Path>,
    settings: &Settings,
    output: impl AsRef<Path>,
    log: &mut RunLog,
) -> PipelineResult<PipelineSummary> {
    log.info(format!("Reading {}", input.as_ref().display()));
    let mut table = read_table_or_empty(input, log);

    let summary = run_pipeline(&mut table, settings, log);

    write_table(&table, &output)?;
    log.success(format!("Written to {}", output.as_ref().display()));

    Ok(summary)
}
