//! Agency client for the lottery aggregation server.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod duration;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use lotto::{BetReader, Cancel, Config, ConnectionMode, Outcome, Retry, Session, TracingSink};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lotto", version, about = "Submit an agency's lottery bets and fetch its winners")]
struct Cli {
    /// Agency identifier.
    #[arg(long, env = "CLI_ID")]
    id: String,

    /// Server address (`host:port`).
    #[arg(long, env = "CLI_SERVER_ADDRESS")]
    server_address: String,

    /// Bet file (`first,last,document,birthdate,number` per line).
    /// Defaults to `/data/agency-<id>.csv`.
    #[arg(long, env = "CLI_BETS_FILE")]
    bets_file: Option<PathBuf>,

    /// Maximum bets per batch.
    #[arg(long, env = "CLI_BATCH_MAXAMOUNT", default_value_t = 100)]
    batch_max_amount: usize,

    /// Pause between batches (e.g. `200ms`, `1s`).
    #[arg(long, env = "CLI_LOOP_PERIOD", default_value = "0s", value_parser = duration::parse)]
    loop_period: Duration,

    /// Attempts for connecting and for the winners query.
    #[arg(long, env = "CLI_RETRY_ATTEMPTS", default_value_t = 3)]
    retry_attempts: u32,

    /// Pause between attempts.
    #[arg(long, env = "CLI_RETRY_DELAY", default_value = "2s", value_parser = duration::parse)]
    retry_delay: Duration,

    /// Bound on each connect, send or receive.
    #[arg(long, env = "CLI_IO_TIMEOUT", default_value = "10s", value_parser = duration::parse)]
    io_timeout: Duration,

    /// `persistent` or `per-batch`.
    #[arg(long, env = "CLI_CONNECTION_MODE", default_value = "persistent")]
    connection_mode: ConnectionMode,

    /// Log filter (`error`, `warn`, `info`, `debug`, `trace` or a directive).
    #[arg(long, env = "CLI_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// How to print the outcome.
    #[arg(long, env = "CLI_OUTPUT_FORMAT", default_value = "table")]
    format: OutputFormat,
}

/// Output format for the run outcome.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = Cli::parse().run().await {
        eprintln!("lotto: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    async fn run(self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("invalid log level {:?}", self.log_level))?;
        tracing_subscriber::fmt().with_env_filter(filter).init();

        let retry = Retry::new(self.retry_attempts, self.retry_delay);
        let config = Config::new(&self.id, &self.server_address)
            .batch_max_amount(self.batch_max_amount)
            .loop_period(self.loop_period)
            .connect_retry(retry)
            .query_retry(retry)
            .io_timeout(self.io_timeout)
            .connection_mode(self.connection_mode);

        let path = self
            .bets_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("/data/agency-{}.csv", self.id)));
        let bets = BetReader::open(&path, &self.id)
            .with_context(|| format!("failed to open bet file {}", path.display()))?;

        let mut session = Session::new(config, TracingSink::default())?;
        let cancel = Cancel::new();
        tokio::spawn(cancel_on_signal(cancel.clone()));

        let outcome = session.run(bets, &cancel).await?;
        print_outcome(&outcome, self.format)
    }
}

fn print_outcome(outcome: &Outcome, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    match outcome {
        Outcome::Completed {
            batches,
            bets,
            winners,
        } => {
            println!("{bets} bets sent in {batches} batches, {} winners", winners.len());
            for document in winners {
                println!("  {document}");
            }
        }
        Outcome::Cancelled { phase } => println!("cancelled while {phase}"),
        _ => println!("{outcome:?}"),
    }
    Ok(())
}

/// Cancels the session on Ctrl-C or SIGTERM.
async fn cancel_on_signal(cancel: Cancel) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!(action = "signal", result = "success");
    cancel.cancel();
}
