//! Plain-text report rendering.
//!
//! Pure formatting only — every function returns a string for the caller to
//! place on the console, in a file, or both. Section layout follows the
//! classic report: a banner header, the queue-id statistics table, per-queue
//! detail blocks, the process analysis, and a summary of the fetch phase.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::analysis::{extract_failure_point, extract_root_cause, select_queues, sorted_processes};
use crate::client::{QUEUE_NAME, STATUS_ERROR};
use crate::fmt::{group_digits, join_ids, one_decimal};
use crate::model::{LogEntry, ProcessStat, QueueCount, RunSummary};

const BANNER: &str = "============================================================";
const RULE: &str = "------------------------------------------------------------";

/// Run metadata displayed in the report header.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    /// Date that was queried, `YYYY-MM-DD`.
    pub query_date: String,
    /// Local timestamp at which the report was generated.
    pub generated_at: String,
    /// Opaque `invocationSummary` from the search response, shown untouched.
    pub invocation_summary: Option<serde_json::Value>,
}

/// Renders the report header and the queue-id statistics table.
///
/// An empty count map still produces a well-formed report: the "no error
/// jobs" notice plus a zeroed totals footer.
pub fn render_summary(counts: &QueueCount, ctx: &ReportContext) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "SBS Error Job History Report");
    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "Generated: {}", ctx.generated_at);
    let _ = writeln!(out, "Query Date: {}", ctx.query_date);
    let _ = writeln!(out, "Queue: {}", QUEUE_NAME);
    let _ = writeln!(out, "Status: {} (Error)", STATUS_ERROR);

    if let Some(summary) = &ctx.invocation_summary {
        let version = summary.get("version").and_then(|v| v.as_str()).unwrap_or("N/A");
        let execution_time = summary
            .get("executionTime")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(out);
        let _ = writeln!(out, "API Response:");
        let _ = writeln!(out, "  Version: {}", version);
        let _ = writeln!(out, "  Execution Time: {}ms", execution_time);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "Queue ID Statistics");
    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out);

    if counts.is_empty() {
        let _ = writeln!(out, "No error jobs found for the specified date.");
        let _ = writeln!(out);
    } else {
        let _ = writeln!(out, "{:<20} | {:>10}", "Queue ID", "Count");
        let _ = writeln!(out, "{}", RULE);
        for queue_id in select_queues(counts, None) {
            let _ = writeln!(out, "{:<20} | {:>10}", queue_id, group_digits(counts[&queue_id]));
        }
    }

    let total_jobs: u64 = counts.values().sum();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "{:<20} | {:>10}",
        "Total Unique Queue IDs:",
        group_digits(counts.len() as u64)
    );
    let _ = writeln!(out, "{:<20} | {:>10}", "Total Error Jobs:", group_digits(total_jobs));
    let _ = writeln!(out, "{}", BANNER);

    out
}

/// Renders the numbered log-entry blocks for one queue.
pub fn render_details(queue_id: i64, entries: &[LogEntry]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "Detailed Logs for Queue ID: {}", queue_id);
    let _ = writeln!(out, "{}", BANNER);

    if entries.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No log entries returned for this queue.");
        return out;
    }

    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Log Entry #{}", i + 1);
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "Log ID: {}", entry.log_id);
        let _ = writeln!(out, "Created: {} by {}", entry.created_date, entry.created_by);
        if let Some(process) = entry.process_name.as_deref()
            && !process.is_empty()
        {
            let _ = writeln!(out, "Process: {}", process);
        }
        let _ = writeln!(out, "Message Code: {}", entry.message_code);
        let _ = writeln!(out, "Error Message: {}", entry.message);
        if let Some(long_text) = &entry.long_text {
            if let Some(cause) = extract_root_cause(long_text) {
                let _ = writeln!(out, "Root Cause: {}", cause.label());
            }
            if let Some(point) = extract_failure_point(long_text) {
                let _ = writeln!(out, "Failing Component: {} ({})", point.component, point.location);
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "Full Text:");
            let _ = writeln!(out, "{}", long_text);
        }
    }

    out
}

/// Renders the per-process rollups and the summary-statistics block.
pub fn render_process_analysis(
    stats: &BTreeMap<String, ProcessStat>,
    summary: &RunSummary,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "Process Analysis");
    let _ = writeln!(out, "{}", BANNER);

    for (name, stat) in sorted_processes(stats) {
        let _ = writeln!(out);
        let _ = writeln!(out, "Process: {}", name);
        let _ = writeln!(out, "  Errors: {}", group_digits(stat.error_count));
        let _ = writeln!(
            out,
            "  Affected Queues ({}): {}",
            stat.queue_ids.len(),
            join_ids(stat.queue_ids.iter())
        );
        if !stat.samples.is_empty() {
            let _ = writeln!(out, "  Sample Messages:");
            for (i, sample) in stat.samples.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "    {}. [queue {}, {}] {}",
                    i + 1,
                    sample.queue_id,
                    sample.created_date,
                    sample.message
                );
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "Summary Statistics");
    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "Total Errors Analyzed: {}", group_digits(summary.total_errors));
    let _ = writeln!(
        out,
        "Total Unique Queue IDs: {}",
        group_digits(summary.unique_queue_ids as u64)
    );
    let _ = writeln!(
        out,
        "Total Unique Processes: {}",
        group_digits(summary.unique_processes as u64)
    );
    let _ = writeln!(
        out,
        "Average Errors Per Process: {}",
        one_decimal(summary.avg_errors_per_process)
    );
    let _ = writeln!(out, "{}", BANNER);

    out
}

/// Renders the per-process root-cause rollups.
///
/// Processes are ordered by their total cause count descending, name
/// ascending on ties; causes within a process by count descending, text
/// ascending on ties.
pub fn render_root_causes(causes: &BTreeMap<String, BTreeMap<String, u64>>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "Root Cause Analysis");
    let _ = writeln!(out, "{}", BANNER);

    if causes.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No recognizable root-cause patterns found.");
        return out;
    }

    let mut processes: Vec<(&str, &BTreeMap<String, u64>)> =
        causes.iter().map(|(name, c)| (name.as_str(), c)).collect();
    processes.sort_by(|a, b| {
        let total_a: u64 = a.1.values().sum();
        let total_b: u64 = b.1.values().sum();
        total_b.cmp(&total_a).then(a.0.cmp(b.0))
    });

    for (name, process_causes) in processes {
        let _ = writeln!(out);
        let _ = writeln!(out, "Process: {}", name);
        let mut ordered: Vec<(&str, u64)> =
            process_causes.iter().map(|(label, &count)| (label.as_str(), count)).collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        for (i, (label, count)) in ordered.into_iter().enumerate() {
            let _ = writeln!(out, "  {}. ({}x) {}", i + 1, count, label);
        }
    }

    out
}

/// Renders the end-of-run accounting of the detail-fetch phase.
pub fn render_fetch_summary(succeeded: usize, failures: &[(i64, String)]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Queues processed: {} succeeded, {} failed",
        succeeded,
        failures.len()
    );
    for (queue_id, description) in failures {
        let _ = writeln!(out, "  queue {}: {}", queue_id, description);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze_entries, summarize};

    fn ctx() -> ReportContext {
        ReportContext {
            query_date: "2026-01-28".to_string(),
            generated_at: "2026-01-28 14:27:19".to_string(),
            invocation_summary: None,
        }
    }

    fn entry(process: &str, queue_id: i64, message: &str) -> LogEntry {
        LogEntry {
            log_id: 1,
            queue_id,
            message_code: "ERR".to_string(),
            message: message.to_string(),
            created_date: "2026-01-28T10:00:00Z".to_string(),
            created_by: "SYSTEM".to_string(),
            long_text: None,
            process_name: Some(process.to_string()),
        }
    }

    #[test]
    fn empty_summary_is_well_formed() {
        let report = render_summary(&QueueCount::new(), &ctx());
        assert!(report.contains("No error jobs found for the specified date."));
        for label in ["Total Unique Queue IDs:", "Total Error Jobs:"] {
            let line = report.lines().find(|l| l.starts_with(label)).unwrap();
            assert!(line.ends_with(" 0"), "expected zero total in {:?}", line);
        }
    }

    #[test]
    fn summary_table_ranks_and_groups_digits() {
        let counts = QueueCount::from([(185451684, 1_000), (185451685, 2)]);
        let report = render_summary(&counts, &ctx());

        let table_pos = report.find("185451684").unwrap();
        let second_pos = report.find("185451685").unwrap();
        assert!(table_pos < second_pos, "higher count listed first");
        assert!(report.contains("1,000"));
        assert!(report.contains("Queue: GENQ"));
        assert!(report.contains("Status: ERR (Error)"));
        assert!(report.contains("Query Date: 2026-01-28"));
    }

    #[test]
    fn summary_shows_invocation_summary_when_present() {
        let mut context = ctx();
        context.invocation_summary =
            Some(serde_json::json!({"version": "2.1", "executionTime": 42}));
        let report = render_summary(&QueueCount::new(), &context);
        assert!(report.contains("Version: 2.1"));
        assert!(report.contains("Execution Time: 42ms"));
    }

    #[test]
    fn details_numbers_entries_and_keeps_long_text_whole() {
        let mut first = entry("FeePosting", 185451684, "fee amount unallocated");
        first.long_text = Some("x".repeat(4000));
        let second = entry("FeePosting", 185451684, "second failure");

        let report = render_details(185451684, &[first, second]);
        assert!(report.contains("Detailed Logs for Queue ID: 185451684"));
        assert!(report.contains("Log Entry #1"));
        assert!(report.contains("Log Entry #2"));
        assert!(report.contains("Process: FeePosting"));
        assert!(report.contains(&"x".repeat(4000)));
    }

    #[test]
    fn details_handles_empty_queue() {
        let report = render_details(42, &[]);
        assert!(report.contains("No log entries returned for this queue."));
    }

    #[test]
    fn process_analysis_lists_samples_and_summary() {
        let entries = vec![
            entry("FeePosting", 100, "first"),
            entry("FeePosting", 200, "second"),
            entry("Settlement", 100, "third"),
        ];
        let stats = analyze_entries(&entries);
        let summary = summarize(&stats);
        let report = render_process_analysis(&stats, &summary);

        assert!(report.contains("Process: FeePosting"));
        assert!(report.contains("Affected Queues (2): 100, 200"));
        assert!(report.contains("1. [queue 100, 2026-01-28T10:00:00Z] first"));
        assert!(report.contains("Total Errors Analyzed: 3"));
        assert!(report.contains("Total Unique Processes: 2"));
        assert!(report.contains("Average Errors Per Process: 1.5"));
    }

    #[test]
    fn details_annotate_root_cause_from_long_text() {
        let mut first = entry("FeePosting", 185451684, "job failed");
        first.long_text = Some(
            "bravura.service.CallException: Could not invoke bravura.dao.FeeDao.execute\n\
\tat deployment.sonata.ear//bravura.engine.QueueRunner.run(QueueRunner.java:88)\n\
Caused by: java.lang.IllegalArgumentException: ERROR: Fee amount unallocated 100.00\n\
\tat deployment.sonata.ear//bravura.dao.FeeDao.execute(FeeDao.java:42)\n"
                .to_string(),
        );

        let report = render_details(185451684, &[first]);
        assert!(
            report.contains("Root Cause: IllegalArgumentException: Fee amount unallocated 100.00")
        );
        assert!(report.contains("Failing Component: bravura.dao.FeeDao.execute (FeeDao.java:42)"));
    }

    #[test]
    fn details_skip_root_cause_for_plain_text() {
        let mut first = entry("FeePosting", 1, "job failed");
        first.long_text = Some("plain message, no stack".to_string());
        let report = render_details(1, &[first]);
        assert!(!report.contains("Root Cause:"));
        assert!(!report.contains("Failing Component:"));
    }

    #[test]
    fn root_causes_section_orders_by_count() {
        let causes = BTreeMap::from([
            (
                "FeePosting".to_string(),
                BTreeMap::from([
                    ("IllegalArgumentException: Fee amount unallocated".to_string(), 5u64),
                    ("IllegalStateException: contribution base missing".to_string(), 2u64),
                ]),
            ),
            (
                "Settlement".to_string(),
                BTreeMap::from([("IllegalStateException: contribution base missing".to_string(), 9u64)]),
            ),
        ]);

        let report = render_root_causes(&causes);
        let settlement = report.find("Process: Settlement").unwrap();
        let fee = report.find("Process: FeePosting").unwrap();
        assert!(settlement < fee, "higher total listed first");
        assert!(report.contains("1. (5x) IllegalArgumentException: Fee amount unallocated"));
        assert!(report.contains("2. (2x) IllegalStateException: contribution base missing"));
    }

    #[test]
    fn root_causes_section_handles_no_matches() {
        let report = render_root_causes(&BTreeMap::new());
        assert!(report.contains("No recognizable root-cause patterns found."));
    }

    #[test]
    fn fetch_summary_lists_failures() {
        let failures = vec![(999, "transport error: connection refused".to_string())];
        let report = render_fetch_summary(3, &failures);
        assert!(report.contains("Queues processed: 3 succeeded, 1 failed"));
        assert!(report.contains("queue 999: transport error: connection refused"));
    }
}
