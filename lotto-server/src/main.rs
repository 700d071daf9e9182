//! Lottery aggregation server.

#![allow(clippy::print_stderr, clippy::missing_docs_in_private_items)]

use anyhow::{Context, Result};
use clap::Parser;
use lotto::Cancel;
use lotto_server::{DEFAULT_WINNING_NUMBER, Server, ServerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lotto-server", version, about = "Lottery aggregation server")]
struct Cli {
    /// Interface to listen on.
    #[arg(long, env = "SERVER_IP", default_value = "0.0.0.0")]
    ip: String,

    /// TCP port to listen on.
    #[arg(long, env = "SERVER_PORT", default_value_t = 12345)]
    port: u16,

    /// Agencies that must finish before the draw.
    #[arg(long, env = "SERVER_AGENCIES", default_value_t = 5)]
    agencies: usize,

    /// Number that wins the lottery.
    #[arg(long, env = "SERVER_WINNING_NUMBER", default_value_t = DEFAULT_WINNING_NUMBER)]
    winning_number: u32,

    /// Log filter (`error`, `warn`, `info`, `debug`, `trace` or a directive).
    #[arg(long, env = "SERVER_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = Cli::parse().run().await {
        eprintln!("lotto-server: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    async fn run(self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("invalid log level {:?}", self.log_level))?;
        tracing_subscriber::fmt().with_env_filter(filter).init();

        let listen = format!("{}:{}", self.ip, self.port);
        let config = ServerConfig::new(&listen, self.agencies).winning_number(self.winning_number);
        let server = Server::bind(config)
            .await
            .with_context(|| format!("failed to listen on {listen}"))?;

        let cancel = Cancel::new();
        tokio::spawn(shutdown_on_signal(cancel.clone()));
        server.run(&cancel).await.context("server stopped")
    }
}

/// Cancels on Ctrl-C or SIGTERM.
async fn shutdown_on_signal(cancel: Cancel) {
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
