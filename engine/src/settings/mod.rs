//! Settings resource parser.
//!
//! The settings file is a line-oriented format with optional sections:
//!
//! ```text
//! replacements:
//! *Description:"Serv."="Service","Inv"="Invoice"
//! end:
//!
//! sort order:
//! DescDateTimeStamp:asc
//! *ContactName:desc
//! end:
//!
//! appendages:
//! *ItemCode:"ABC"="Claim Type A"
//! end:
//!
//! due date additional days:14
//! new file name postfix:_fixed
//! ```
//!
//! Sections are independent: each is located on its own, lines before its
//! marker are ignored and `end:` closes it. The two scalar settings are
//! matched anywhere in the file. A bad line is reported and skipped; parsing
//! never stops early.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::{Issue, SettingsError, SettingsResult};
use crate::logs::RunLog;

const REPLACEMENTS_MARKER: &str = "replacements:";
const SORT_ORDER_MARKER: &str = "sort order:";
const APPENDAGES_MARKER: &str = "appendages:";
const END_MARKER: &str = "end:";

const DUE_DATE_DAYS_KEY: &str = "due date additional days:";
const POSTFIX_KEY: &str = "new file name postfix:";

/// Default output file name postfix.
pub const DEFAULT_POSTFIX: &str = "_new";

/// `"from"="to"`, either side may be empty.
static REPLACEMENT_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)"\s*=\s*"([^"]*)""#).expect("valid replacement pattern"));

/// `"trigger"="text"`, both sides non-empty.
static APPENDAGE_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"\s*=\s*"([^"]+)""#).expect("valid appendage pattern"));

/// Heading (no colon) then the rest of the line.
static APPENDAGE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:]+):(.+)$").expect("valid appendage line pattern"));

// =============================================================================
// Types
// =============================================================================

/// One literal substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacementPair {
    pub from: String,
    pub to: String,
}

/// Substitutions for one column, applied in listed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnReplacements {
    pub column: String,
    pub pairs: Vec<ReplacementPair>,
}

impl ColumnReplacements {
    /// Add a pair; a repeated `from` overrides the earlier `to` in place.
    fn upsert(&mut self, from: &str, to: &str) {
        match self.pairs.iter_mut().find(|p| p.from == from) {
            Some(pair) => pair.to = to.to_string(),
            None => self.pairs.push(ReplacementPair {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

/// Sort direction of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Exactly `asc` is ascending; every other token is descending.
    pub fn from_token(token: &str) -> Self {
        if token == "asc" {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// One sort key as written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
}

/// Text appended when `trigger` occurs in the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppendageRule {
    pub trigger: String,
    pub text: String,
}

/// Appendage rules for one column, checked in listed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnAppendages {
    pub column: String,
    pub rules: Vec<AppendageRule>,
}

/// Parsed settings, read once per run and shared by every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Per-column literal substitutions.
    pub replacements: Vec<ColumnReplacements>,
    /// Sort keys, most significant first.
    pub sort_order: Vec<SortKey>,
    /// Per-column conditional appendages.
    pub appendages: Vec<ColumnAppendages>,
    /// Whole days added to `*DueDate`; zero disables the stage.
    pub due_date_additional_days: i64,
    /// Inserted between the input file stem and its extension.
    pub new_file_name_postfix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            replacements: Vec::new(),
            sort_order: Vec::new(),
            appendages: Vec::new(),
            due_date_additional_days: 0,
            new_file_name_postfix: DEFAULT_POSTFIX.to_string(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl Settings {
    /// Read and parse a settings file.
    pub fn load<P: AsRef<Path>>(path: P, log: &mut RunLog) -> SettingsResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text, log))
    }

    /// Read a settings file, falling back to defaults if it is unreadable.
    pub fn load_or_default<P: AsRef<Path>>(path: P, log: &mut RunLog) -> Self {
        let path = path.as_ref();
        match Self::load(path, log) {
            Ok(settings) => settings,
            Err(e) => {
                log.report(Issue::MissingResource {
                    resource: path.display().to_string(),
                    reason: e.to_string(),
                });
                Self::default()
            }
        }
    }

    /// Parse settings text. Malformed lines are reported to `log`.
    pub fn parse(text: &str, log: &mut RunLog) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        Self {
            replacements: parse_replacements(text, log),
            sort_order: parse_sort_order(text, log),
            appendages: parse_appendages(text, log),
            due_date_additional_days: parse_due_date_days(text, log),
            new_file_name_postfix: scalar_value(text, POSTFIX_KEY)
                .map(|(_, value)| value.trim().to_string())
                .unwrap_or_else(|| DEFAULT_POSTFIX.to_string()),
        }
    }

    /// Replacement pairs configured for `column`.
    pub fn replacements_for(&self, column: &str) -> Option<&[ReplacementPair]> {
        self.replacements
            .iter()
            .find(|r| r.column == column)
            .map(|r| r.pairs.as_slice())
    }

    /// Appendage rules configured for `column`.
    pub fn appendages_for(&self, column: &str) -> Option<&[AppendageRule]> {
        self.appendages
            .iter()
            .find(|a| a.column == column)
            .map(|a| a.rules.as_slice())
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Non-blank lines of a section with their 1-based line numbers.
///
/// `None` when the marker never appears. An unterminated section runs to the
/// end of the file.
fn section_lines<'a>(text: &'a str, marker: &str) -> Option<Vec<(usize, &'a str)>> {
    let mut lines = text.lines().enumerate();
    lines.by_ref().find(|(_, line)| line.trim() == marker)?;

    Some(
        lines
            .filter(|(_, line)| !line.trim().is_empty())
            .take_while(|(_, line)| line.trim() != END_MARKER)
            .map(|(idx, line)| (idx + 1, line))
            .collect(),
    )
}

fn malformed(log: &mut RunLog, line: usize, content: &str, reason: &str) {
    log.report(Issue::MalformedConfigLine {
        line,
        content: content.to_string(),
        reason: reason.to_string(),
    });
}

fn parse_replacements(text: &str, log: &mut RunLog) -> Vec<ColumnReplacements> {
    let mut result: Vec<ColumnReplacements> = Vec::new();

    for (line_no, line) in section_lines(text, REPLACEMENTS_MARKER).unwrap_or_default() {
        let Some((heading, rest)) = line.split_once(':') else {
            malformed(log, line_no, line, "missing ':' after heading");
            continue;
        };

        let mut column = ColumnReplacements {
            column: heading.to_string(),
            pairs: Vec::new(),
        };
        let mut matched = false;
        for caps in REPLACEMENT_PAIR.captures_iter(rest) {
            matched = true;
            let (from, to) = (&caps[1], &caps[2]);
            if from.is_empty() {
                malformed(log, line_no, line, "empty search text in pair");
                continue;
            }
            column.upsert(from, to);
        }

        if !matched {
            malformed(log, line_no, line, "no \"from\"=\"to\" pairs");
            continue;
        }

        match result.iter_mut().find(|r| r.column == column.column) {
            Some(existing) => *existing = column,
            None => result.push(column),
        }
    }

    result
}

fn parse_sort_order(text: &str, log: &mut RunLog) -> Vec<SortKey> {
    let mut keys = Vec::new();

    for (line_no, line) in section_lines(text, SORT_ORDER_MARKER).unwrap_or_default() {
        let Some((heading, token)) = line.split_once(':') else {
            malformed(log, line_no, line, "expected <heading>:<asc|desc>");
            continue;
        };
        keys.push(SortKey {
            column: heading.trim().to_string(),
            direction: SortDirection::from_token(token.trim()),
        });
    }

    keys
}

fn parse_appendages(text: &str, log: &mut RunLog) -> Vec<ColumnAppendages> {
    let mut result: Vec<ColumnAppendages> = Vec::new();

    for (line_no, line) in section_lines(text, APPENDAGES_MARKER).unwrap_or_default() {
        let Some(caps) = APPENDAGE_LINE.captures(line) else {
            malformed(log, line_no, line, "invalid appendages line format");
            continue;
        };
        let column = &caps[1];

        let rules: Vec<AppendageRule> = APPENDAGE_PAIR
            .captures_iter(&caps[2])
            .map(|pair| AppendageRule {
                trigger: pair[1].to_string(),
                text: pair[2].to_string(),
            })
            .collect();

        if rules.is_empty() {
            malformed(log, line_no, line, "no \"trigger\"=\"text\" pairs");
            continue;
        }

        match result.iter_mut().find(|a| a.column == column) {
            Some(existing) => existing.rules.extend(rules),
            None => result.push(ColumnAppendages {
                column: column.to_string(),
                rules,
            }),
        }
    }

    result
}

// =============================================================================
// Scalars
// =============================================================================

/// Text after the first colon of the first line containing `key`.
fn scalar_value<'a>(text: &'a str, key: &str) -> Option<(usize, &'a str)> {
    text.lines().enumerate().find_map(|(idx, line)| {
        if !line.contains(key) {
            return None;
        }
        let colon = line.find(':')?;
        Some((idx + 1, &line[colon + 1..]))
    })
}

fn parse_due_date_days(text: &str, log: &mut RunLog) -> i64 {
    let Some((line_no, value)) = scalar_value(text, DUE_DATE_DAYS_KEY) else {
        return 0;
    };
    match parse_leading_int(value) {
        Some(days) => days,
        None => {
            malformed(log, line_no, value, "due date additional days is not an integer");
            0
        }
    }
}

/// Leading optionally-signed integer; trailing text is ignored.
fn parse_leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let sign_len = usize::from(value.starts_with(['+', '-']));
    let digits = value[sign_len..]
        .chars()
        .take_while(char::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    value[..sign_len + digits].parse().ok()
}
