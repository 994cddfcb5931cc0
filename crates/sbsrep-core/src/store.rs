//! Optional PostgreSQL persistence for run results.
//!
//! One logical run maps to one `runs` row keyed by `(base_url, query_date)`,
//! with child rows for per-queue counts, per-process stats, per-process
//! affected-queue edges, per-process root-cause counts, and raw log
//! entries. Re-running the same day
//! upserts in place. Persistence is best-effort: a failure here never
//! invalidates the rendered report.
//!
//! Connects using the standard environment variables:
//! - PGHOST (default: localhost)
//! - PGPORT (default: 5432)
//! - PGUSER (default: $USER)
//! - PGPASSWORD (default: empty)
//! - PGDATABASE (default: same as PGUSER)
//! - PGSSLMODE ("require" enables TLS via native-tls)

use std::collections::BTreeMap;

use postgres::{Client, NoTls};
use postgres_native_tls::MakeTlsConnector;
use tracing::{debug, info};

use crate::model::{LogEntry, ProcessStat, QueueCount};

/// Error type for persistence.
#[derive(Debug)]
pub enum StoreError {
    /// Environment variable not set.
    EnvNotSet(String),
    /// TLS connector setup failed.
    Tls(String),
    /// Connection or query failure.
    Db(postgres::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::EnvNotSet(var) => write!(f, "PostgreSQL: {} not set", var),
            StoreError::Tls(msg) => write!(f, "PostgreSQL TLS error: {}", msg),
            StoreError::Db(e) => write!(f, "PostgreSQL error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<postgres::Error> for StoreError {
    fn from(e: postgres::Error) -> Self {
        StoreError::Db(e)
    }
}

/// Builds a libpq-style connection string from the individual parts.
fn conn_string(host: &str, port: &str, user: &str, password: &str, dbname: &str) -> String {
    let mut s = format!("host={} port={} user={} dbname={}", host, port, user, dbname);
    if !password.is_empty() {
        s.push_str(&format!(" password={}", password));
    }
    s
}

/// PostgreSQL store for run results.
pub struct PgStore {
    client: Client,
}

impl PgStore {
    /// Connects using the standard `PG*` environment variables.
    pub fn from_env() -> Result<Self, StoreError> {
        let user = std::env::var("PGUSER")
            .or_else(|_| std::env::var("USER"))
            .map_err(|_| StoreError::EnvNotSet("PGUSER or USER".to_string()))?;
        let host = std::env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string());
        let port = std::env::var("PGPORT").unwrap_or_else(|_| "5432".to_string());
        let password = std::env::var("PGPASSWORD").unwrap_or_default();
        let dbname = std::env::var("PGDATABASE").unwrap_or_else(|_| user.clone());
        let sslmode = std::env::var("PGSSLMODE").unwrap_or_default();

        let conn = conn_string(&host, &port, &user, &password, &dbname);
        debug!("Connecting to PostgreSQL at {}:{} db={}", host, port, dbname);

        let client = if sslmode == "require" {
            let connector = native_tls::TlsConnector::builder()
                .build()
                .map_err(|e| StoreError::Tls(e.to_string()))?;
            Client::connect(&conn, MakeTlsConnector::new(connector))?
        } else {
            Client::connect(&conn, NoTls)?
        };

        let mut store = Self { client };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Creates the schema when it does not exist yet.
    fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.client.batch_execute(
            "create table if not exists runs (
                run_id      bigserial primary key,
                base_url    text not null,
                query_date  text not null,
                unique (base_url, query_date)
            );
            create table if not exists queue_stats (
                run_id      bigint not null references runs (run_id),
                queue_id    bigint not null,
                error_count bigint not null,
                primary key (run_id, queue_id)
            );
            create table if not exists process_stats (
                run_id       bigint not null references runs (run_id),
                process_name text not null,
                error_count  bigint not null,
                primary key (run_id, process_name)
            );
            create table if not exists process_queue_ids (
                run_id       bigint not null references runs (run_id),
                process_name text not null,
                queue_id     bigint not null,
                primary key (run_id, process_name, queue_id)
            );
            create table if not exists process_error_causes (
                run_id       bigint not null references runs (run_id),
                process_name text not null,
                cause        text not null,
                cause_count  bigint not null,
                primary key (run_id, process_name, cause)
            );
            create table if not exists log_entries (
                run_id       bigint not null references runs (run_id),
                log_id       bigint not null,
                queue_id     bigint not null,
                process_name text,
                message_code text,
                message      text,
                created_date text,
                created_by   text,
                long_text    text,
                primary key (run_id, log_id, queue_id)
            );",
        )?;
        Ok(())
    }

    /// Persists one run. Returns the `run_id`.
    pub fn store_run<'a>(
        &mut self,
        base_url: &str,
        query_date: &str,
        counts: &QueueCount,
        stats: &BTreeMap<String, ProcessStat>,
        causes: &BTreeMap<String, BTreeMap<String, u64>>,
        entries: impl IntoIterator<Item = &'a LogEntry>,
    ) -> Result<i64, StoreError> {
        let mut tx = self.client.transaction()?;

        let row = tx.query_one(
            "insert into runs (base_url, query_date)
             values ($1, $2)
             on conflict (base_url, query_date)
             do update set base_url = excluded.base_url
             returning run_id",
            &[&base_url, &query_date],
        )?;
        let run_id: i64 = row.get(0);

        let queue_stmt = tx.prepare(
            "insert into queue_stats (run_id, queue_id, error_count)
             values ($1, $2, $3)
             on conflict (run_id, queue_id)
             do update set error_count = excluded.error_count",
        )?;
        for (&queue_id, &count) in counts {
            tx.execute(&queue_stmt, &[&run_id, &queue_id, &(count as i64)])?;
        }

        let process_stmt = tx.prepare(
            "insert into process_stats (run_id, process_name, error_count)
             values ($1, $2, $3)
             on conflict (run_id, process_name)
             do update set error_count = excluded.error_count",
        )?;
        let edge_stmt = tx.prepare(
            "insert into process_queue_ids (run_id, process_name, queue_id)
             values ($1, $2, $3)
             on conflict do nothing",
        )?;
        for (name, stat) in stats {
            tx.execute(&process_stmt, &[&run_id, &name, &(stat.error_count as i64)])?;
            for &queue_id in &stat.queue_ids {
                tx.execute(&edge_stmt, &[&run_id, &name, &queue_id])?;
            }
        }

        let cause_stmt = tx.prepare(
            "insert into process_error_causes (run_id, process_name, cause, cause_count)
             values ($1, $2, $3, $4)
             on conflict (run_id, process_name, cause)
             do update set cause_count = excluded.cause_count",
        )?;
        for (name, process_causes) in causes {
            for (cause, &count) in process_causes {
                tx.execute(&cause_stmt, &[&run_id, &name, &cause, &(count as i64)])?;
            }
        }

        let entry_stmt = tx.prepare(
            "insert into log_entries (
                run_id, log_id, queue_id, process_name, message_code,
                message, created_date, created_by, long_text
             )
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             on conflict do nothing",
        )?;
        let mut entry_count = 0u64;
        for entry in entries {
            tx.execute(
                &entry_stmt,
                &[
                    &run_id,
                    &entry.log_id,
                    &entry.queue_id,
                    &entry.process_name,
                    &entry.message_code,
                    &entry.message,
                    &entry.created_date,
                    &entry.created_by,
                    &entry.long_text,
                ],
            )?;
            entry_count += 1;
        }

        tx.commit()?;
        info!(
            "Stored run {} ({} queues, {} processes, {} log entries)",
            run_id,
            counts.len(),
            stats.len(),
            entry_count
        );
        Ok(run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conn_string_omits_empty_password() {
        assert_eq!(
            conn_string("localhost", "5432", "sbs", "", "sbsdb"),
            "host=localhost port=5432 user=sbs dbname=sbsdb"
        );
        assert_eq!(
            conn_string("db.example.com", "5433", "sbs", "secret", "sbsdb"),
            "host=db.example.com port=5433 user=sbs dbname=sbsdb password=secret"
        );
    }
}
