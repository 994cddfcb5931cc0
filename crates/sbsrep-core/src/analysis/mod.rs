//! Aggregation and analysis engine.
//!
//! Turns the flat `searchJobHistory` result stream into per-queue error
//! counts, decides which queues warrant a follow-up `getSystemLog` fetch,
//! and rolls the fetched log entries up by originating process.
//!
//! Data flow:
//!
//! ```text
//! searchResults ──> queues::count_queue_ids ──> QueueCount
//!                                                  │
//!                              queues::select_queues (ranked, limited)
//!                                                  │
//!                        fetch::fetch_details (sequential, fault-tolerant)
//!                                                  │
//!                   process::analyze_entries ──> ProcessStat map ──> summarize
//!                   rootcause::analyze_causes ──> per-process cause counts
//! ```
//!
//! Everything here is pure apart from `tracing` progress output in the
//! fetch loop; all state is an explicit accumulator scoped to one run.

pub mod fetch;
pub mod process;
pub mod queues;
pub mod rootcause;

pub use fetch::{DetailFetcher, FetchOutcome, fetch_details};
pub use process::{MAX_SAMPLES_PER_PROCESS, UNKNOWN_PROCESS, analyze_entries, sorted_processes, summarize};
pub use queues::{count_queue_ids, select_queues};
pub use rootcause::{
    FailurePoint, RootCause, analyze_causes, extract_failure_point, extract_root_cause,
};
