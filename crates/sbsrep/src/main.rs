//! sbsrep - SBS error job history reporter.
//!
//! Queries the SBS system service for failed GENQ jobs on a given day,
//! aggregates the failures by queue and originating process, and prints a
//! plain-text report (optionally persisted to a file and/or PostgreSQL).

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Parser;
use sbsrep_core::analysis::{
    FetchOutcome, analyze_causes, analyze_entries, count_queue_ids, fetch_details, select_queues,
    summarize,
};
use sbsrep_core::client::{SbsClient, SbsConfig};
use sbsrep_core::report::{
    ReportContext, render_details, render_fetch_summary, render_process_analysis,
    render_root_causes, render_summary,
};
use sbsrep_core::store::PgStore;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// SBS error job history reporter.
#[derive(Parser)]
#[command(name = "sbsrep", about = "Query SBS for error job history and generate reports", version)]
struct Args {
    /// SBS base URL.
    #[arg(long, env = "SBS_BASE_URL")]
    base_url: Option<String>,

    /// Username for the caller details.
    #[arg(long, env = "SBS_USERNAME")]
    username: Option<String>,

    /// Country code for the caller details.
    #[arg(long, env = "SBS_COUNTRY")]
    country: Option<String>,

    /// Language code for the caller details.
    #[arg(long, env = "SBS_LANGUAGE")]
    language: Option<String>,

    /// Database identifier for the caller details.
    #[arg(long = "db-id", env = "SBS_DATABASE_ID")]
    db_id: Option<String>,

    /// Date to query (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    date: Option<String>,

    /// Maximum number of queues to fetch detailed logs for.
    /// Highest error counts first; all queues when omitted.
    #[arg(long)]
    limit: Option<usize>,

    /// Fetch detailed logs and run process analysis (the default).
    #[arg(long, overrides_with = "no_details")]
    details: bool,

    /// Skip the detail-fetch phase and process analysis.
    #[arg(long, overrides_with = "details")]
    no_details: bool,

    /// Write the report to this file in addition to stdout.
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Persist the run to PostgreSQL (connection via PG* env variables).
    #[arg(long)]
    store: bool,

    /// Validate configuration without making any API call.
    #[arg(long)]
    dry_run: bool,

    /// Disable SSL certificate verification (use for self-signed certs).
    #[arg(long)]
    no_verify_ssl: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("sbsrep={}", level).parse().unwrap())
        .add_directive(format!("sbsrep_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// True if the env variable holds a truthy value ("true", "1", "yes").
fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).unwrap_or_default().to_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Writes the report text to a file.
fn write_report(path: &Path, report: &str) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(report.as_bytes())
}

fn main() {
    let env_loaded = dotenvy::dotenv().is_ok();
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if env_loaded {
        debug!("Loaded configuration from .env file");
    }

    std::process::exit(run(args));
}

fn run(args: Args) -> i32 {
    let verify_ssl = !args.no_verify_ssl && !env_flag("SBS_NO_VERIFY_SSL");

    let config = SbsConfig {
        base_url: args.base_url.clone().unwrap_or_default(),
        username: args.username.clone().unwrap_or_default(),
        country: args.country.clone().unwrap_or_default(),
        language: args.language.clone().unwrap_or_default(),
        database_id: args.db_id.clone().unwrap_or_default(),
        verify_ssl,
    };

    if let Err(e) = config.validate() {
        error!("{}", e);
        error!("Provide the value as an argument or set the SBS_* environment variable");
        return e.exit_code();
    }

    let query_date = match &args.date {
        Some(date) => {
            if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                error!("Invalid date '{}': expected YYYY-MM-DD", date);
                return 1;
            }
            date.clone()
        }
        None => Utc::now().format("%Y-%m-%d").to_string(),
    };

    debug!(
        "Config: base_url={}, username={}, country={}, language={}, db_id={}, verify_ssl={}",
        config.base_url,
        config.username,
        config.country,
        config.language,
        config.database_id,
        config.verify_ssl
    );

    if args.dry_run {
        println!("Configuration validated successfully!");
        println!("  Base URL: {}", config.base_url);
        println!("  Username: {}", config.username);
        println!("  Country: {}", config.country);
        println!("  Language: {}", config.language);
        println!("  Database ID: {}", config.database_id);
        return 0;
    }

    let base_url = config.base_url.clone();
    let mut client = match SbsClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            return e.exit_code();
        }
    };

    info!("Querying SBS for error jobs on {}", query_date);
    let response = match client.search_job_history(&query_date) {
        Ok(response) => response,
        Err(e) => {
            error!("Search failed: {}", e);
            return e.exit_code();
        }
    };
    info!("Search returned {} job records", response.search_results.len());

    let counts = count_queue_ids(&response.search_results);
    let ctx = ReportContext {
        query_date: query_date.clone(),
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        invocation_summary: response.invocation_summary,
    };

    let mut report = render_summary(&counts, &ctx);

    let selection = select_queues(&counts, args.limit);
    let details = !args.no_details;
    let mut stats = BTreeMap::new();
    let mut causes = BTreeMap::new();
    let mut outcome = FetchOutcome::default();
    let detail_phase = details && !selection.is_empty();

    if detail_phase {
        info!(
            "Fetching detailed logs for {} of {} queues",
            selection.len(),
            counts.len()
        );
        outcome = fetch_details(&selection, &mut client);

        for (queue_id, entries) in &outcome.queues {
            report.push('\n');
            report.push_str(&render_details(*queue_id, entries));
        }

        stats = analyze_entries(outcome.entries());
        causes = analyze_causes(outcome.entries());
        let summary = summarize(&stats);
        report.push('\n');
        report.push_str(&render_process_analysis(&stats, &summary));
        report.push('\n');
        report.push_str(&render_root_causes(&causes));
        report.push('\n');
        report.push_str(&render_fetch_summary(outcome.succeeded(), &outcome.failures));
    } else if details {
        debug!("No queues selected, skipping detail fetch");
    }

    println!("{}", report);

    if let Some(path) = &args.output {
        match write_report(path, &report) {
            Ok(()) => info!("Report written to {}", path.display()),
            Err(e) => {
                error!("Failed to write report to {}: {}", path.display(), e);
                return 1;
            }
        }
    }

    if args.store {
        match PgStore::from_env() {
            Ok(mut store) => {
                match store.store_run(
                    &base_url,
                    &query_date,
                    &counts,
                    &stats,
                    &causes,
                    outcome.entries(),
                ) {
                    Ok(run_id) => info!("Run persisted as run_id={}", run_id),
                    Err(e) => warn!("Persistence failed: {}", e),
                }
            }
            Err(e) => warn!("Persistence unavailable: {}", e),
        }
    }

    0
}

#[cfg(test)]
mod tests {
    use super::{Args, write_report};
    use clap::Parser;

    #[test]
    fn detail_phase_is_on_by_default_and_off_with_no_details() {
        let args = Args::try_parse_from(["sbsrep"]).unwrap();
        assert!(!args.no_details);

        let args = Args::try_parse_from(["sbsrep", "--no-details"]).unwrap();
        assert!(args.no_details);

        // Bare --details is valid and keeps the phase enabled.
        let args = Args::try_parse_from(["sbsrep", "--details"]).unwrap();
        assert!(!args.no_details);

        // Later flag wins.
        let args = Args::try_parse_from(["sbsrep", "--no-details", "--details"]).unwrap();
        assert!(!args.no_details);
    }

    #[test]
    fn write_report_creates_file_with_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        write_report(&path, "SBS Error Job History Report\n").unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "SBS Error Job History Report\n");
    }
}
