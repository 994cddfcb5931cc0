//! Per-queue error counting and ranked queue selection.

use crate::model::{ErrorRecord, QueueCount};

/// Counts error records per queue id.
///
/// Records without a queue id are skipped; an empty input yields an empty
/// map. The returned map carries no ordering — use [`select_queues`] for a
/// deterministic ranking.
pub fn count_queue_ids(records: &[ErrorRecord]) -> QueueCount {
    let mut counts = QueueCount::new();
    for record in records {
        if let Some(queue_id) = record.queue_id {
            *counts.entry(queue_id).or_insert(0) += 1;
        }
    }
    counts
}

/// Ranks queue ids by error count descending, queue id ascending on ties.
///
/// With `limit` set, only the top `limit` ids are returned; `None` or a
/// limit covering all distinct queues returns every id. A limit of zero
/// yields an empty selection, which skips the detail-fetch phase entirely.
pub fn select_queues(counts: &QueueCount, limit: Option<usize>) -> Vec<i64> {
    let mut ranked: Vec<(i64, u64)> = counts.iter().map(|(&id, &n)| (id, n)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut ids: Vec<i64> = ranked.into_iter().map(|(id, _)| id).collect();
    if let Some(limit) = limit
        && limit < ids.len()
    {
        ids.truncate(limit);
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(queue_id: Option<i64>) -> ErrorRecord {
        ErrorRecord {
            queue_id,
            status: "ERR".to_string(),
            execution_date: String::new(),
        }
    }

    #[test]
    fn counts_sum_to_records_with_queue_id() {
        let records = vec![
            record(Some(185451684)),
            record(Some(185451684)),
            record(Some(185451685)),
            record(None),
        ];

        let counts = count_queue_ids(&records);
        assert_eq!(counts.get(&185451684), Some(&2));
        assert_eq!(counts.get(&185451685), Some(&1));
        assert_eq!(counts.values().sum::<u64>(), 3);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(count_queue_ids(&[]).is_empty());
    }

    #[test]
    fn select_limit_one_returns_top_queue() {
        let records = vec![
            record(Some(185451684)),
            record(Some(185451684)),
            record(Some(185451685)),
        ];
        let counts = count_queue_ids(&records);
        assert_eq!(select_queues(&counts, Some(1)), vec![185451684]);
    }

    #[test]
    fn select_orders_by_count_then_id() {
        let counts = QueueCount::from([(30, 2), (10, 5), (20, 2), (40, 7)]);
        assert_eq!(select_queues(&counts, None), vec![40, 10, 20, 30]);
    }

    #[test]
    fn select_none_equals_full_limit() {
        let counts = QueueCount::from([(1, 1), (2, 3), (3, 2)]);
        let total = counts.len();
        assert_eq!(select_queues(&counts, None), select_queues(&counts, Some(total)));
        assert_eq!(select_queues(&counts, Some(total + 10)).len(), total);
    }

    #[test]
    fn select_limit_zero_is_empty() {
        let counts = QueueCount::from([(1, 1)]);
        assert!(select_queues(&counts, Some(0)).is_empty());
    }
}
