//! Per-run log of pipeline progress and reported conditions.
//!
//! Every entry is mirrored to `tracing`, so the binary's subscriber shows
//! progress as it happens, while the [`RunLog`] keeps the full history for
//! the run summary and for tests.

use serde::Serialize;

use crate::error::Issue;

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
}

/// A single log entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Collects the entries and issues of one run.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
    issues: Vec<Issue>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry and forward it to `tracing`.
    pub fn log(&mut self, entry: LogEntry) {
        let indent = "  ".repeat(entry.indent as usize);
        match entry.level {
            LogLevel::Info => tracing::info!("{}{}", indent, entry.message),
            LogLevel::Success => tracing::info!("{}✓ {}", indent, entry.message),
            LogLevel::Warning => tracing::warn!("{}{}", indent, entry.message),
        }
        self.entries.push(entry);
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::info(msg));
    }

    pub fn info_indent(&mut self, msg: impl Into<String>, indent: u8) {
        self.log(LogEntry::info(msg).with_indent(indent));
    }

    pub fn success(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::success(msg));
    }

    /// Record a recoverable condition. Logged as a warning.
    pub fn report(&mut self, issue: Issue) {
        self.log(LogEntry::warning(issue.to_string()));
        self.issues.push(issue);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Issues of one class, see [`Issue::kind`].
    pub fn issues_of(&self, kind: &str) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.kind() == kind).collect()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
