//! Text stages: literal column replacements and conditional appendages.

use crate::error::Issue;
use crate::logs::RunLog;
use crate::models::Table;
use crate::settings::{AppendageRule, ReplacementPair, Settings};

use super::pipeline::StageStatus;

/// Cells already containing this text are never appended to.
pub const CLAIM_TYPE_GUARD: &str = "Claim Type";

pub(crate) const REPLACE_STAGE: &str = "replacements";
pub(crate) const APPEND_STAGE: &str = "appendages";

// =============================================================================
// Replacements
// =============================================================================

/// Apply every configured `from` -> `to` pair to its column, in listed order.
pub fn apply_replacements(table: &mut Table, settings: &Settings, log: &mut RunLog) -> StageStatus {
    if settings.replacements.is_empty() {
        log.info_indent("No replacements configured", 1);
        return StageStatus::Skipped;
    }

    let mut applied = false;
    for column in &settings.replacements {
        if !table.has_column(&column.column) {
            log.report(Issue::MissingColumn {
                stage: REPLACE_STAGE,
                column: column.column.clone(),
            });
            continue;
        }

        for row in table.rows_mut() {
            let cell = row.entry(column.column.clone()).or_default();
            replace_all(cell, &column.pairs);
        }
        log.info_indent(
            format!("{}: {} replacement(s)", column.column, column.pairs.len()),
            1,
        );
        applied = true;
    }

    if applied {
        StageStatus::Applied
    } else {
        StageStatus::Skipped
    }
}

/// Replace non-overlapping occurrences left to right; replacement output is
/// never rescanned by the same pair.
pub fn replace_all(cell: &mut String, pairs: &[ReplacementPair]) {
    for pair in pairs {
        if !pair.from.is_empty() && cell.contains(&pair.from) {
            *cell = cell.replace(&pair.from, &pair.to);
        }
    }
}

// =============================================================================
// Appendages
// =============================================================================

/// Append configured text to cells containing a trigger.
///
/// Cells containing [`CLAIM_TYPE_GUARD`] are left alone; rows without the
/// column are skipped.
pub fn apply_appendages(table: &mut Table, settings: &Settings, log: &mut RunLog) -> StageStatus {
    if settings.appendages.is_empty() {
        log.info_indent("No appendages configured", 1);
        return StageStatus::Skipped;
    }

    let mut applied = false;
    for column in &settings.appendages {
        if !table.has_column(&column.column) {
            log.report(Issue::MissingColumn {
                stage: APPEND_STAGE,
                column: column.column.clone(),
            });
            continue;
        }

        let mut touched = 0;
        for row in table.rows_mut() {
            if let Some(cell) = row.get_mut(&column.column) {
                if append_matching(cell, &column.rules) {
                    touched += 1;
                }
            }
        }
        log.info_indent(format!("{}: {} cell(s) appended to", column.column, touched), 1);
        applied = true;
    }

    if applied {
        StageStatus::Applied
    } else {
        StageStatus::Skipped
    }
}

/// Returns whether anything was appended.
pub fn append_matching(cell: &mut String, rules: &[AppendageRule]) -> bool {
    if cell.contains(CLAIM_TYPE_GUARD) {
        return false;
    }

    let mut appended = false;
    for rule in rules {
        if cell.contains(&rule.trigger) {
            cell.push(' ');
            cell.push_str(&rule.text);
            appended = true;
        }
    }
    appended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    fn settings(text: &str) -> Settings {
        Settings::parse(text, &mut RunLog::new())
    }

    fn pair(from: &str, to: &str) -> ReplacementPair {
        ReplacementPair {
            from: from.into(),
            to: to.into(),
        }
    }

    fn rule(trigger: &str, text: &str) -> AppendageRule {
        AppendageRule {
            trigger: trigger.into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_replace_all_occurrences() {
        let mut cell = "a-b-c".to_string();
        replace_all(&mut cell, &[pair("-", "+")]);
        assert_eq!(cell, "a+b+c");
    }

    #[test]
    fn test_replacement_output_not_rescanned() {
        let mut cell = "aa".to_string();
        replace_all(&mut cell, &[pair("a", "aa")]);
        assert_eq!(cell, "aaaa");
    }

    #[test]
    fn test_pairs_applied_in_order() {
        let mut cell = "cat".to_string();
        replace_all(&mut cell, &[pair("cat", "dog"), pair("dog", "bird")]);
        assert_eq!(cell, "bird");
    }

    #[test]
    fn test_replacements_stage() {
        let mut table = parse_table("*Description,Other\nServ. fee,Serv.\n").unwrap();
        let mut log = RunLog::new();
        let s = settings("replacements:\n*Description:\"Serv.\"=\"Service\"\nend:\n");

        assert_eq!(apply_replacements(&mut table, &s, &mut log), StageStatus::Applied);
        assert_eq!(table.value(0, "*Description"), Some("Service fee"));
        assert_eq!(table.value(0, "Other"), Some("Serv."));
    }

    #[test]
    fn test_replacements_unknown_column_reported() {
        let mut table = parse_table("A\nx\n").unwrap();
        let mut log = RunLog::new();
        let s = settings("replacements:\nB:\"x\"=\"y\"\nA:\"x\"=\"z\"\nend:\n");

        assert_eq!(apply_replacements(&mut table, &s, &mut log), StageStatus::Applied);
        assert_eq!(table.value(0, "A"), Some("z"));
        assert_eq!(log.issues_of("missing_column").len(), 1);
        assert!(table.rows()[0].get("B").is_none());
    }

    #[test]
    fn test_append_cumulative() {
        let mut cell = "ABC-XYZ".to_string();
        let appended = append_matching(&mut cell, &[rule("ABC", "one"), rule("one", "two")]);
        assert!(appended);
        assert_eq!(cell, "ABC-XYZ one two");
    }

    #[test]
    fn test_claim_type_guard() {
        let rules = [rule("A", "x"), rule("Claim", "y"), rule("Type", "z")];
        let mut cell = "A Claim Type B".to_string();
        assert!(!append_matching(&mut cell, &rules));
        assert_eq!(cell, "A Claim Type B");
    }

    #[test]
    fn test_appendages_stage() {
        let mut table =
            parse_table("*ItemCode,Note\nABC1,n\nABC2 Claim Type A,n\nZZZ,n\n").unwrap();
        let mut log = RunLog::new();
        let s = settings("appendages:\n*ItemCode:\"ABC\"=\"Claim Type A\"\nend:\n");

        assert_eq!(apply_appendages(&mut table, &s, &mut log), StageStatus::Applied);
        assert_eq!(table.value(0, "*ItemCode"), Some("ABC1 Claim Type A"));
        assert_eq!(table.value(1, "*ItemCode"), Some("ABC2 Claim Type A"));
        assert_eq!(table.value(2, "*ItemCode"), Some("ZZZ"));
    }

    #[test]
    fn test_appendages_skip_rows_without_key() {
        let mut table = parse_table("A,B\n1\n").unwrap();
        let mut log = RunLog::new();
        let s = settings("appendages:\nB:\"1\"=\"x\"\nend:\n");
        apply_appendages(&mut table, &s, &mut log);
        assert!(!table.rows()[0].contains_key("B"));
    }

    #[test]
    fn test_no_rules_is_skipped() {
        let mut table = parse_table("A\n1\n").unwrap();
        let mut log = RunLog::new();
        let s = Settings::default();
        assert_eq!(apply_replacements(&mut table, &s, &mut log), StageStatus::Skipped);
        assert_eq!(apply_appendages(&mut table, &s, &mut log), StageStatus::Skipped);
        assert!(!log.has_issues());
    }
}
