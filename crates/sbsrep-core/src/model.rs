//! Parsed SBS API response types and run-scoped aggregates.
//!
//! The SBS system service answers two calls: `searchJobHistory` (one row per
//! failed job) and `getSystemLog` (full log entries for one queue id). Both
//! responses are deserialized strictly at the boundary — a schema mismatch
//! surfaces as a parse error here instead of a missing-field panic deep in
//! the analysis code.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

/// One row of the `searchJobHistory` response.
///
/// Rows occasionally arrive without a queue id; they are tolerated at parse
/// time and skipped by the aggregator so that one malformed row cannot abort
/// a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub queue_id: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub execution_date: String,
}

/// Parsed `searchJobHistory` response.
///
/// `searchResults` is required — its absence means the response cannot be
/// trusted. `invocationSummary` is opaque and passed through untouched for
/// display.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub search_results: Vec<ErrorRecord>,
    #[serde(default)]
    pub invocation_summary: Option<serde_json::Value>,
}

/// One row of the `getSystemLog` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub log_id: i64,
    pub queue_id: i64,
    #[serde(default)]
    pub message_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_date: String,
    #[serde(default)]
    pub created_by: String,
    /// Full stack-trace text. May be absent; never truncated when present.
    #[serde(default)]
    pub long_text: Option<String>,
    /// Originating business process. Absent or empty groups under "Unknown".
    #[serde(default)]
    pub process_name: Option<String>,
}

/// Parsed `getSystemLog` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemLogResponse {
    pub system_logs: Vec<LogEntry>,
}

/// Error count per queue id.
///
/// Invariant: the counts sum to the number of records that carried a queue
/// id, and the keys are exactly the distinct ids observed. Iteration order
/// is unspecified; consumers that need a ranking sort explicitly.
pub type QueueCount = HashMap<i64, u64>;

/// One retained sample message for a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub message: String,
    pub queue_id: i64,
    pub created_date: String,
}

/// Per-process rollup across all fetched queues.
#[derive(Debug, Clone, Default)]
pub struct ProcessStat {
    /// Number of log entries attributed to this process.
    pub error_count: u64,
    /// Distinct queue ids among those entries.
    pub queue_ids: BTreeSet<i64>,
    /// First few messages in arrival order, capped so reports stay bounded.
    pub samples: Vec<Sample>,
}

/// Summary statistics derived from the process rollups. Never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_errors: u64,
    pub unique_queue_ids: usize,
    pub unique_processes: usize,
    /// Exact value; rendering rounds to one decimal.
    pub avg_errors_per_process: f64,
}
