//! Root-cause extraction from stack-trace text.
//!
//! Java-style stack traces bury the actionable message in the deepest
//! `Caused by:` clause. This module pulls that clause out of a log entry's
//! long text, finds the application frame where the failure surfaced, and
//! rolls recognized causes up per process for the report and for
//! persistence.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::process::resolve_process_name;
use crate::model::LogEntry;

/// Deepest `Caused by: ...Exception: ERROR: ...` clause. Preferred source.
static CAUSED_BY_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)Caused by:\s*(?:[a-z0-9_.]+\.)?([A-Za-z]+Exception)\s*:\s*ERROR:\s*(.+?)\n\s*at\s",
    )
    .unwrap()
});

/// Any `...Exception: ERROR: ...` clause. Fallback when no `Caused by:`
/// clause carries an ERROR message.
static GENERIC_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)(?:[a-z0-9_.]+\.)?([A-Za-z]+Exception)\s*:\s*ERROR:\s*(.+?)(?:\n\s*at\s|\z)",
    )
    .unwrap()
});

/// Application frame inside the deployed archive, nearest the failure.
static APP_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*at\s+deployment\.[A-Za-z0-9_.]+\.ear//([A-Za-z0-9_.$]+)\((.+?)\)\s*$")
        .unwrap()
});

/// The most specific exception message found in a stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCause {
    pub exception: String,
    pub message: String,
}

impl RootCause {
    /// Display / rollup key: `"IllegalArgumentException: Fee amount unallocated"`.
    pub fn label(&self) -> String {
        format!("{}: {}", self.exception, self.message)
    }
}

/// The application-layer frame where the failure surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailurePoint {
    pub component: String,
    pub location: String,
}

/// Extracts the most specific root cause from stack-trace text.
///
/// The last `Caused by:` ERROR clause wins (the deepest cause is printed
/// last); a plain ERROR exception line is the fallback.
pub fn extract_root_cause(long_text: &str) -> Option<RootCause> {
    let captures = CAUSED_BY_ERROR
        .captures_iter(long_text)
        .last()
        .or_else(|| GENERIC_ERROR.captures_iter(long_text).last())?;

    Some(RootCause {
        exception: captures[1].trim().to_string(),
        message: captures[2].trim().to_string(),
    })
}

/// Extracts the last application frame from stack-trace text.
///
/// Frames near the bottom of the trace are closest to where the error
/// originated.
pub fn extract_failure_point(long_text: &str) -> Option<FailurePoint> {
    let captures = APP_FRAME.captures_iter(long_text).last()?;
    Some(FailurePoint {
        component: captures[1].to_string(),
        location: captures[2].to_string(),
    })
}

/// Rolls recognized root causes up per process.
///
/// Entries without long text, or whose text carries no recognizable
/// pattern, contribute nothing. The nested map counts occurrences of each
/// cause label per process.
pub fn analyze_causes<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
) -> BTreeMap<String, BTreeMap<String, u64>> {
    let mut causes: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

    for entry in entries {
        let Some(text) = entry.long_text.as_deref() else {
            continue;
        };
        let Some(cause) = extract_root_cause(text) else {
            continue;
        };
        let name = resolve_process_name(entry);
        *causes
            .entry(name.to_string())
            .or_default()
            .entry(cause.label())
            .or_insert(0) += 1;
    }

    causes
}
