//! Synchronous HTTP client for the SBS system service.
//!
//! Two calls, one attempt each:
//! - `searchJobHistory` — failed jobs in the GENQ queue for one day
//! - `getSystemLog` — full log entries (including stack text) for one queue id
//!
//! The client is blocking by design; the whole run is single-threaded and
//! each call blocks until it completes or the 30 second timeout fires.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::analysis::DetailFetcher;
use crate::model::{LogEntry, SearchResponse, SystemLogResponse};

/// Queue searched for failed jobs.
pub const QUEUE_NAME: &str = "GENQ";
/// Job status filter for the search call.
pub const STATUS_ERROR: &str = "ERR";
/// Message code filter for the system-log call.
const MESSAGE_CODE: &str = "ERR";
/// Message id filter for the system-log call.
const MESSAGE_ID: i64 = 171;
/// Transport timeout for each call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for SBS API access.
#[derive(Debug)]
pub enum ClientError {
    /// Missing or invalid configuration. Fatal before any network call.
    Config(String),
    /// Connection failure or timeout.
    Transport(String),
    /// Non-2xx HTTP status.
    Http { status: u16, body: String },
    /// Malformed JSON or schema mismatch — the data cannot be trusted.
    Parse(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Config(msg) => write!(f, "configuration error: {}", msg),
            ClientError::Transport(msg) => write!(f, "transport error: {}", msg),
            ClientError::Http { status, body } => {
                if body.is_empty() {
                    write!(f, "HTTP error: status {}", status)
                } else {
                    write!(f, "HTTP error: status {}: {}", status, body)
                }
            }
            ClientError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    /// Process exit code for a fatal error on the primary search call.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Config(_) => 1,
            ClientError::Transport(_) | ClientError::Http { .. } => 2,
            ClientError::Parse(_) => 3,
        }
    }
}

/// Connection settings and caller identity for the SBS service.
#[derive(Debug, Clone)]
pub struct SbsConfig {
    pub base_url: String,
    pub username: String,
    pub country: String,
    pub language: String,
    pub database_id: String,
    /// When false, the TLS certificate is not verified (self-signed setups).
    pub verify_ssl: bool,
}

impl SbsConfig {
    /// Validates required fields. Empty values are configuration errors.
    pub fn validate(&self) -> Result<(), ClientError> {
        let required = [
            ("base URL", &self.base_url),
            ("username", &self.username),
            ("country", &self.country),
            ("language", &self.language),
            ("database identifier", &self.database_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ClientError::Config(format!("{} not provided", name)));
            }
        }
        Ok(())
    }
}

/// Client for the SBS job history API.
pub struct SbsClient {
    http: reqwest::blocking::Client,
    config: SbsConfig,
}

impl SbsClient {
    /// Creates a client from validated configuration.
    pub fn new(config: SbsConfig) -> Result<Self, ClientError> {
        config.validate()?;

        if !config.verify_ssl {
            warn!("SSL certificate verification is DISABLED");
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: SbsConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    fn caller_details(&self) -> serde_json::Value {
        json!({
            "username": self.config.username,
            "country": self.config.country,
            "language": self.config.language,
            "databaseIdentifier": self.config.database_id,
        })
    }

    fn search_payload(&self, date: &str) -> serde_json::Value {
        json!({
            "callerDetails": self.caller_details(),
            "startDate": format!("{}T00:00:00.000Z", date),
            "endDate": format!("{}T23:59:59.000Z", date),
            "status": STATUS_ERROR,
            "queue": { "name": QUEUE_NAME },
        })
    }

    fn system_log_payload(&self, queue_id: i64) -> serde_json::Value {
        json!({
            "callerDetails": self.caller_details(),
            "queueId": queue_id,
            "message": { "code": MESSAGE_CODE, "id": MESSAGE_ID },
            "includeLongText": true,
            "includeProcessName": true,
        })
    }

    fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("POST {}", url);

        let response = self.http.post(&url).json(payload).send().map_err(|e| {
            if e.is_timeout() {
                ClientError::Transport(format!("request timeout calling {}", url))
            } else {
                ClientError::Transport(format!("could not reach {}: {}", url, e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Searches for failed GENQ jobs on the given day (`YYYY-MM-DD`).
    pub fn search_job_history(&self, date: &str) -> Result<SearchResponse, ClientError> {
        self.post("/sbs/systemService/searchJobHistory", &self.search_payload(date))
    }

    /// Fetches full log entries for one queue id.
    pub fn get_system_log(&self, queue_id: i64) -> Result<SystemLogResponse, ClientError> {
        self.post("/sbs/systemService/getSystemLog", &self.system_log_payload(queue_id))
    }
}

impl DetailFetcher for SbsClient {
    fn fetch(&mut self, queue_id: i64) -> Result<Vec<LogEntry>, ClientError> {
        self.get_system_log(queue_id).map(|r| r.system_logs)
    }
}
