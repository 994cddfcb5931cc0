//! Per-process rollups and summary statistics.
//!
//! Groups detailed log entries by originating business process. The rollup
//! is an explicit accumulator folded over the input — nothing is retained
//! between runs, so parallel unit tests cannot contaminate each other.

use std::collections::BTreeMap;

use crate::model::{LogEntry, ProcessStat, RunSummary, Sample};

/// Group name for entries whose process name is absent or empty.
pub const UNKNOWN_PROCESS: &str = "Unknown";

/// Messages retained per process. Fixed policy so reports stay bounded
/// regardless of volume; entries beyond the cap are counted but not sampled.
pub const MAX_SAMPLES_PER_PROCESS: usize = 3;

/// Resolves the grouping name for an entry.
pub(crate) fn resolve_process_name(entry: &LogEntry) -> &str {
    match entry.process_name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => UNKNOWN_PROCESS,
    }
}

/// Rolls log entries up by process name.
///
/// Each entry contributes one unit to its process's error count and its
/// queue id to the affected-queue set. The first
/// [`MAX_SAMPLES_PER_PROCESS`] messages per process are kept in arrival
/// order. Messages are never truncated.
pub fn analyze_entries<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
) -> BTreeMap<String, ProcessStat> {
    let mut stats: BTreeMap<String, ProcessStat> = BTreeMap::new();

    for entry in entries {
        let name = resolve_process_name(entry);

        let stat = stats.entry(name.to_string()).or_default();
        stat.error_count += 1;
        stat.queue_ids.insert(entry.queue_id);
        if stat.samples.len() < MAX_SAMPLES_PER_PROCESS {
            stat.samples.push(Sample {
                message: entry.message.clone(),
                queue_id: entry.queue_id,
                created_date: entry.created_date.clone(),
            });
        }
    }

    stats
}

/// Orders processes by error count descending, name ascending on ties.
pub fn sorted_processes(stats: &BTreeMap<String, ProcessStat>) -> Vec<(&str, &ProcessStat)> {
    let mut ordered: Vec<(&str, &ProcessStat)> =
        stats.iter().map(|(name, stat)| (name.as_str(), stat)).collect();
    ordered.sort_by(|a, b| b.1.error_count.cmp(&a.1.error_count).then(a.0.cmp(b.0)));
    ordered
}

/// Derives summary statistics from the rollups.
///
/// The average is 0.0 when there are no processes.
pub fn summarize(stats: &BTreeMap<String, ProcessStat>) -> RunSummary {
    let total_errors: u64 = stats.values().map(|s| s.error_count).sum();
    let unique_queue_ids = stats
        .values()
        .flat_map(|s| s.queue_ids.iter())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let unique_processes = stats.len();

    let avg_errors_per_process = if unique_processes > 0 {
        total_errors as f64 / unique_processes as f64
    } else {
        0.0
    };

    RunSummary {
        total_errors,
        unique_queue_ids,
        unique_processes,
        avg_errors_per_process,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(process: Option<&str>, queue_id: i64, message: &str) -> LogEntry {
        LogEntry {
            log_id: 0,
            queue_id,
            message_code: "ERR".to_string(),
            message: message.to_string(),
            created_date: "2026-01-28T10:00:00Z".to_string(),
            created_by: "SYSTEM".to_string(),
            long_text: None,
            process_name: process.map(str::to_string),
        }
    }

    #[test]
    fn each_entry_counts_once_and_queue_ids_are_distinct() {
        let entries = vec![
            entry(Some("FeePosting"), 100, "a"),
            entry(Some("FeePosting"), 100, "b"),
            entry(Some("FeePosting"), 200, "c"),
            entry(Some("Settlement"), 100, "d"),
        ];

        let stats = analyze_entries(&entries);
        let fee = &stats["FeePosting"];
        assert_eq!(fee.error_count, 3);
        assert_eq!(fee.queue_ids.iter().copied().collect::<Vec<_>>(), vec![100, 200]);
        assert_eq!(stats["Settlement"].error_count, 1);
    }

    #[test]
    fn absent_or_empty_process_groups_under_unknown() {
        let entries = vec![entry(None, 5, "x"), entry(Some(""), 5, "y")];
        let stats = analyze_entries(&entries);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[UNKNOWN_PROCESS].error_count, 2);
    }

    #[test]
    fn samples_cap_at_three_keeping_first_in_arrival_order() {
        let entries: Vec<LogEntry> = (0..5)
            .map(|i| entry(Some("FeePosting"), i, &format!("msg{}", i)))
            .collect();

        let stats = analyze_entries(&entries);
        let samples = &stats["FeePosting"].samples;
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].message, "msg0");
        assert_eq!(samples[1].message, "msg1");
        assert_eq!(samples[2].message, "msg2");
        assert_eq!(stats["FeePosting"].error_count, 5);
    }

    #[test]
    fn long_messages_are_kept_whole() {
        let long = "x".repeat(2000);
        let entries = vec![entry(Some("FeePosting"), 1, &long)];
        let stats = analyze_entries(&entries);
        assert_eq!(stats["FeePosting"].samples[0].message.len(), 2000);
    }

    #[test]
    fn sorted_by_count_desc_then_name_asc() {
        let mut entries = Vec::new();
        entries.push(entry(Some("Beta"), 1, "a"));
        entries.push(entry(Some("Beta"), 1, "b"));
        entries.push(entry(Some("Alpha"), 1, "c"));
        entries.push(entry(Some("Alpha"), 1, "d"));
        entries.push(entry(Some("Gamma"), 1, "e"));

        let stats = analyze_entries(&entries);
        let ordered: Vec<&str> = sorted_processes(&stats).into_iter().map(|(n, _)| n).collect();
        assert_eq!(ordered, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn summarize_matches_rollups() {
        let entries = vec![
            entry(Some("FeePosting"), 100, "a"),
            entry(Some("FeePosting"), 200, "b"),
            entry(Some("Settlement"), 100, "c"),
        ];

        let stats = analyze_entries(&entries);
        let summary = summarize(&stats);
        assert_eq!(summary.total_errors, 3);
        assert_eq!(summary.unique_queue_ids, 2);
        assert_eq!(summary.unique_processes, 2);
        assert!((summary.avg_errors_per_process - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn summarize_empty_has_zero_average() {
        let stats = BTreeMap::new();
        let summary = summarize(&stats);
        assert_eq!(summary.total_errors, 0);
        assert_eq!(summary.avg_errors_per_process, 0.0);
    }
}
