//! Beacon - status and balance dashboard for the solar platform.
//!
//! ```text
//! main() -> BeaconConfig::load() -> serve | snapshot | watch
//!                                      |
//!                                      v
//!                     GET / -> Aggregator::handle() -> TemplateRenderer
//! ```
//!
//! `serve` is the default command. Every page view builds a fresh snapshot;
//! nothing is cached between requests.

mod server;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use beacon_config::BeaconConfig;
use beacon_engine::{Aggregator, DeviceWatcher, SmtpNotifier, WatchOutcome};
use beacon_upstream::http_client;

#[derive(Debug, Parser)]
#[command(name = "beacon", version, about = "Platform status and balance dashboard")]
struct Cli {
    /// Config file (defaults to ~/.beacon/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the dashboard.
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        /// Plain HTTP instead of TLS.
        #[arg(short, long)]
        insecure: bool,
    },
    /// Build one snapshot and print it as JSON.
    Snapshot {
        #[arg(long)]
        pretty: bool,
    },
    /// Watch the IoT hub and mail alerts when it goes offline.
    Watch {
        /// Run a single check and exit.
        #[arg(long)]
        once: bool,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout is reserved for `snapshot` output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = BeaconConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let http = http_client(&config.http).context("failed to build HTTP client")?;

    match cli.command.unwrap_or(Command::Serve {
        port: None,
        insecure: false,
    }) {
        Command::Serve { port, insecure } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            config.server.insecure |= insecure;

            let aggregator = Aggregator::new(http, config.aggregator);
            let state = server::AppState::new(aggregator, &config.server);
            let app = server::router(state, &config.server);
            server::serve(app, &config.server).await
        }
        Command::Snapshot { pretty } => {
            let aggregator = Aggregator::new(http, config.aggregator);
            let snapshot = aggregator.snapshot().await?;
            let json = if pretty {
                serde_json::to_string_pretty(&snapshot)?
            } else {
                serde_json::to_string(&snapshot)?
            };
            println!("{json}");
            Ok(())
        }
        Command::Watch { once } => {
            let Some(watcher) = config.watcher else {
                bail!("no [watcher] section in config");
            };
            let Some(smtp) = config.smtp else {
                bail!("no [smtp] section in config");
            };
            let notifier = SmtpNotifier::new(&smtp).context("invalid SMTP settings")?;
            let watcher = DeviceWatcher::new(http, watcher, notifier);

            if once {
                return match watcher.tick(chrono::Utc::now()).await {
                    WatchOutcome::Healthy | WatchOutcome::Alerted => Ok(()),
                    WatchOutcome::AlertFailed(e) => Err(e).context("alert delivery failed"),
                    WatchOutcome::CheckFailed(e) => Err(e).context("device check failed"),
                };
            }

            tokio::select! {
                () = watcher.run() => Ok(()),
                result = tokio::signal::ctrl_c() => {
                    result.context("failed to listen for ctrl-c")?;
                    tracing::info!("Watcher stopped");
                    Ok(())
                }
            }
        }
    }
}
