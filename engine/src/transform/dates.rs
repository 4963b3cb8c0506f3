//! Date stages: description date extraction, reinsertion and due-date shift.
//!
//! Extraction pulls the first `dd/mm/yy` out of `*Description` into two
//! scratch columns, `DescDate` and `DescDateTimeStamp`, so the sort stage can
//! order rows chronologically. Reinsertion puts the date back at the front of
//! the description and drops both scratch columns.

use chrono::{Days, Local, NaiveDate, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Issue;
use crate::logs::RunLog;
use crate::models::Table;
use crate::settings::Settings;

use super::pipeline::StageStatus;

pub const DESCRIPTION_COLUMN: &str = "*Description";
pub const DUE_DATE_COLUMN: &str = "*DueDate";
pub const DESC_DATE_COLUMN: &str = "DescDate";
pub const DESC_TIMESTAMP_COLUMN: &str = "DescDateTimeStamp";

/// Stored in `DescDate` when the description carries no date.
pub const NO_DATE: &str = "N/A";
/// Stored in `DescDateTimeStamp` when there is no usable date.
pub const NO_TIMESTAMP: &str = "0";

const DESC_DATE_FORMAT: &str = "%d/%m/%y";
const DUE_DATE_FORMAT: &str = "%d/%m/%Y";

pub(crate) const EXTRACT_STAGE: &str = "description dates";
pub(crate) const REINSERT_STAGE: &str = "date reinsertion";
pub(crate) const DUE_DATE_STAGE: &str = "due dates";

static DESC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{2}/[0-9]{2}/[0-9]{2}").expect("valid date pattern"));

// =============================================================================
// Extraction
// =============================================================================

/// Move the first `dd/mm/yy` of each description into the scratch columns.
///
/// Every match of the pattern is removed from the description, not only the
/// first. Rows without a date get `N/A` and `0`.
pub fn extract_description_dates(table: &mut Table, log: &mut RunLog) -> StageStatus {
    if !table.has_column(DESCRIPTION_COLUMN) {
        log.report(Issue::MissingColumn {
            stage: EXTRACT_STAGE,
            column: DESCRIPTION_COLUMN.to_string(),
        });
        return StageStatus::Skipped;
    }

    table.add_column(DESC_DATE_COLUMN);
    table.add_column(DESC_TIMESTAMP_COLUMN);

    let mut found = 0;
    for (idx, row) in table.rows_mut().iter_mut().enumerate() {
        let description = row.entry(DESCRIPTION_COLUMN.to_string()).or_default();

        let (date, stamp) = match DESC_DATE.find(description.as_str()).map(|m| m.as_str().to_string()) {
            Some(date) => {
                *description = DESC_DATE.replace_all(description.as_str(), "").into_owned();
                found += 1;
                let stamp = match local_midnight_timestamp(&date) {
                    Some(ts) => ts.to_string(),
                    None => {
                        log.report(Issue::UnparsableDate {
                            stage: EXTRACT_STAGE,
                            row: idx,
                            value: date.clone(),
                        });
                        NO_TIMESTAMP.to_string()
                    }
                };
                (date, stamp)
            }
            None => (NO_DATE.to_string(), NO_TIMESTAMP.to_string()),
        };

        row.insert(DESC_DATE_COLUMN.to_string(), date);
        row.insert(DESC_TIMESTAMP_COLUMN.to_string(), stamp);
    }

    log.info_indent(format!("{} of {} descriptions carry a date", found, table.len()), 1);
    StageStatus::Applied
}

/// Epoch seconds of local midnight on a `dd/mm/yy` date.
///
/// `None` for an invalid calendar date or a midnight skipped by a DST change.
pub fn local_midnight_timestamp(date: &str) -> Option<i64> {
    let midnight = NaiveDate::parse_from_str(date, DESC_DATE_FORMAT)
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp())
}

// =============================================================================
// Reinsertion
// =============================================================================

/// Prefix each description with its `DescDate`, then drop the scratch columns.
///
/// A quoted description gets the date just inside its opening quote. Rows
/// whose date is `N/A` are prefixed too.
pub fn reinsert_description_dates(table: &mut Table, log: &mut RunLog) -> StageStatus {
    if !table.has_column(DESCRIPTION_COLUMN) {
        log.report(Issue::MissingColumn {
            stage: REINSERT_STAGE,
            column: DESCRIPTION_COLUMN.to_string(),
        });
        return StageStatus::Skipped;
    }

    if table.has_column(DESC_DATE_COLUMN) {
        for row in table.rows_mut() {
            let date = row.get(DESC_DATE_COLUMN).cloned().unwrap_or_default();
            let description = row.entry(DESCRIPTION_COLUMN.to_string()).or_default();
            *description = prefix_description(description, &date);
        }
    } else {
        log.report(Issue::MissingColumn {
            stage: REINSERT_STAGE,
            column: DESC_DATE_COLUMN.to_string(),
        });
    }

    table.remove_column(DESC_DATE_COLUMN);
    table.remove_column(DESC_TIMESTAMP_COLUMN);
    StageStatus::Applied
}

fn prefix_description(description: &str, date: &str) -> String {
    match description.strip_prefix('"') {
        Some(rest) => format!("\"{} {}", date, rest),
        None => format!("{} {}", date, description),
    }
}

// =============================================================================
// Due dates
// =============================================================================

/// Add the configured number of days to every `*DueDate`.
///
/// Cells that are missing or not `dd/mm/yyyy` are left untouched and
/// reported.
pub fn shift_due_dates(table: &mut Table, settings: &Settings, log: &mut RunLog) -> StageStatus {
    let days = settings.due_date_additional_days;
    if days == 0 {
        log.report(Issue::SettingAbsent {
            stage: DUE_DATE_STAGE,
            reason: "no days to add specified or value is 0".to_string(),
        });
        return StageStatus::Skipped;
    }

    if !table.has_column(DUE_DATE_COLUMN) {
        log.report(Issue::MissingColumn {
            stage: DUE_DATE_STAGE,
            column: DUE_DATE_COLUMN.to_string(),
        });
        return StageStatus::Skipped;
    }

    for (idx, row) in table.rows_mut().iter_mut().enumerate() {
        let shifted = row.get(DUE_DATE_COLUMN).and_then(|v| shift_date(v, days));
        match shifted {
            Some(value) => {
                row.insert(DUE_DATE_COLUMN.to_string(), value);
            }
            None => log.report(Issue::UnparsableDate {
                stage: DUE_DATE_STAGE,
                row: idx,
                value: row.get(DUE_DATE_COLUMN).cloned().unwrap_or_default(),
            }),
        }
    }

    log.info_indent(format!("Due dates updated: added {} days", days), 1);
    StageStatus::Applied
}

/// Shift a `dd/mm/yyyy` date by whole calendar days, negative moves back.
pub fn shift_date(value: &str, days: i64) -> Option<String> {
    let date = NaiveDate::parse_from_str(value.trim(), DUE_DATE_FORMAT).ok()?;
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }?;
    Some(shifted.format(DUE_DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    fn settings_with_days(days: i64) -> Settings {
        Settings {
            due_date_additional_days: days,
            ..Settings::default()
        }
    }

    #[test]
    fn test_extract_date_from_description() {
        let mut table = parse_table("*Description\nPayment 01/02/23 received\n").unwrap();
        let mut log = RunLog::new();

        assert_eq!(extract_description_dates(&mut table, &mut log), StageStatus::Applied);
        assert_eq!(table.value(0, DESCRIPTION_COLUMN), Some("Payment  received"));
        assert_eq!(table.value(0, DESC_DATE_COLUMN), Some("01/02/23"));

        let expected = Local
            .with_ymd_and_hms(2023, 2, 1, 0, 0, 0)
            .earliest()
            .unwrap()
            .timestamp()
            .to_string();
        assert_eq!(table.value(0, DESC_TIMESTAMP_COLUMN), Some(expected.as_str()));
        assert_eq!(table.headings(), ["*Description", "DescDate", "DescDateTimeStamp"]);
    }

    #[test]
    fn test_no_date_gives_placeholders() {
        let mut table = parse_table("*Description\nConsulting\n").unwrap();
        let mut log = RunLog::new();
        extract_description_dates(&mut table, &mut log);

        assert_eq!(table.value(0, DESC_DATE_COLUMN), Some("N/A"));
        assert_eq!(table.value(0, DESC_TIMESTAMP_COLUMN), Some("0"));
        assert_eq!(table.value(0, DESCRIPTION_COLUMN), Some("Consulting"));
    }

    #[test]
    fn test_all_matches_removed_first_kept() {
        let mut table = parse_table("*Description\nA 05/06/22 to 07/06/22 B\n").unwrap();
        let mut log = RunLog::new();
        extract_description_dates(&mut table, &mut log);

        assert_eq!(table.value(0, DESC_DATE_COLUMN), Some("05/06/22"));
        assert_eq!(table.value(0, DESCRIPTION_COLUMN), Some("A  to  B"));
    }

    #[test]
    fn test_invalid_calendar_date_gives_zero_timestamp() {
        let mut table = parse_table("*Description\nBilled 31/02/23\n").unwrap();
        let mut log = RunLog::new();
        extract_description_dates(&mut table, &mut log);

        assert_eq!(table.value(0, DESC_DATE_COLUMN), Some("31/02/23"));
        assert_eq!(table.value(0, DESC_TIMESTAMP_COLUMN), Some("0"));
        assert_eq!(log.issues_of("unparsable_date").len(), 1);
    }

    #[test]
    fn test_extract_without_description_is_noop() {
        let mut table = parse_table("*Reference\nA1\n").unwrap();
        let mut log = RunLog::new();

        assert_eq!(extract_description_dates(&mut table, &mut log), StageStatus::Skipped);
        assert_eq!(table.headings(), ["*Reference"]);
        assert_eq!(log.issues_of("missing_column").len(), 1);
    }

    #[test]
    fn test_reinsert_plain_and_quoted() {
        let mut table = parse_table("*Description,Amount\nFee 01/02/23,5\n\"Fee, 02/03/23 late\",6\nNothing,7\n").unwrap();
        let mut log = RunLog::new();
        extract_description_dates(&mut table, &mut log);
        reinsert_description_dates(&mut table, &mut log);

        assert_eq!(table.value(0, DESCRIPTION_COLUMN), Some("01/02/23 Fee "));
        assert_eq!(table.value(1, DESCRIPTION_COLUMN), Some("\"02/03/23 Fee,  late\""));
        assert_eq!(table.value(2, DESCRIPTION_COLUMN), Some("N/A Nothing"));
        assert_eq!(table.headings(), ["*Description", "Amount"]);
        assert!(table.rows().iter().all(|r| r.len() == 2));
    }

    #[test]
    fn test_reinsert_without_description_is_noop() {
        let mut table = parse_table("Other\nx\n").unwrap();
        let mut log = RunLog::new();
        assert_eq!(reinsert_description_dates(&mut table, &mut log), StageStatus::Skipped);
        assert_eq!(log.issues_of("missing_column").len(), 1);
    }

    #[test]
    fn test_shift_across_month_boundary() {
        assert_eq!(shift_date("30/01/2024", 5).as_deref(), Some("04/02/2024"));
    }

    #[test]
    fn test_shift_across_year_and_leap_day() {
        assert_eq!(shift_date("28/12/2023", 7).as_deref(), Some("04/01/2024"));
        assert_eq!(shift_date("28/02/2024", 1).as_deref(), Some("29/02/2024"));
        assert_eq!(shift_date("01/03/2024", -1).as_deref(), Some("29/02/2024"));
    }

    #[test]
    fn test_shift_rejects_bad_dates() {
        assert_eq!(shift_date("", 3), None);
        assert_eq!(shift_date("2024-01-30", 3), None);
        assert_eq!(shift_date("32/01/2024", 3), None);
    }

    #[test]
    fn test_shift_due_dates_stage() {
        let mut table = parse_table("*DueDate\n30/01/2024\nsoon\n").unwrap();
        let mut log = RunLog::new();

        let status = shift_due_dates(&mut table, &settings_with_days(5), &mut log);
        assert_eq!(status, StageStatus::Applied);
        assert_eq!(table.value(0, DUE_DATE_COLUMN), Some("04/02/2024"));
        assert_eq!(table.value(1, DUE_DATE_COLUMN), Some("soon"));
        assert_eq!(log.issues_of("unparsable_date").len(), 1);
    }

    #[test]
    fn test_zero_days_is_noop() {
        let mut table = parse_table("*DueDate\n30/01/2024\n").unwrap();
        let mut log = RunLog::new();

        let status = shift_due_dates(&mut table, &settings_with_days(0), &mut log);
        assert_eq!(status, StageStatus::Skipped);
        assert_eq!(table.value(0, DUE_DATE_COLUMN), Some("30/01/2024"));
        assert_eq!(log.issues_of("setting_absent").len(), 1);
    }

    #[test]
    fn test_missing_due_date_column() {
        let mut table = parse_table("Other\nx\n").unwrap();
        let mut log = RunLog::new();
        let status = shift_due_dates(&mut table, &settings_with_days(3), &mut log);
        assert_eq!(status, StageStatus::Skipped);
        assert_eq!(log.issues_of("missing_column").len(), 1);
    }
}
