//! Detail-fetch orchestration.
//!
//! Issues one `getSystemLog` call per selected queue, strictly sequentially
//! and in ranked order. Order matters: it decides which messages land in the
//! capped per-process sample window when counts tie. A failing queue is
//! recorded and skipped — one bad queue never aborts the run.

use tracing::{info, warn};

use crate::client::ClientError;
use crate::model::LogEntry;

/// Capability to fetch detailed log entries for one queue id.
///
/// The production implementation is [`crate::client::SbsClient`]; tests
/// substitute an in-memory mock.
pub trait DetailFetcher {
    fn fetch(&mut self, queue_id: i64) -> Result<Vec<LogEntry>, ClientError>;
}

/// Result of the detail-fetch phase.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Per-queue entries in fetch order, response order within a queue.
    pub queues: Vec<(i64, Vec<LogEntry>)>,
    /// Queues whose fetch failed, with a description of why.
    pub failures: Vec<(i64, String)>,
}

impl FetchOutcome {
    /// All collected entries in fetch order, flattened.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.queues.iter().flat_map(|(_, entries)| entries.iter())
    }

    /// Number of queues fetched successfully.
    pub fn succeeded(&self) -> usize {
        self.queues.len()
    }
}

/// Fetches detail logs for each queue id in order.
///
/// One call in flight at a time, no retries. Failures are collected into
/// the outcome rather than propagated.
pub fn fetch_details(queue_ids: &[i64], fetcher: &mut dyn DetailFetcher) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    let total = queue_ids.len();

    for (i, &queue_id) in queue_ids.iter().enumerate() {
        info!("Fetching details for queue {} ({} of {})", queue_id, i + 1, total);
        match fetcher.fetch(queue_id) {
            Ok(entries) => {
                info!("Queue {}: {} log entries", queue_id, entries.len());
                outcome.queues.push((queue_id, entries));
            }
            Err(e) => {
                warn!("Queue {}: detail fetch failed: {}", queue_id, e);
                outcome.failures.push((queue_id, e.to_string()));
            }
        }
    }

    outcome
}
