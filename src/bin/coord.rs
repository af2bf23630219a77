//! Coordinator binary

use clap::{Parser, Subcommand};
use minijudge::common::{parse_duration, LivenessMode};
use minijudge::{Config, Coordinator};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minijudge-coord")]
#[command(about = "minijudge cluster coordinator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the coordinator and its RPC boundary
    Serve {
        /// Config file (TOML); `./minijudge.toml` is read when present
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address for the RPC boundary
        #[arg(long)]
        bind: Option<String>,

        /// Concurrent executions per node
        #[arg(long)]
        workers: Option<usize>,

        /// Submission timeout, e.g. `2s` or `1500ms`
        #[arg(long)]
        timeout: Option<String>,

        /// Election probe policy: always, never, random, http
        #[arg(long)]
        liveness: Option<String>,
    },
}

fn parse_liveness(mode: &str) -> anyhow::Result<LivenessMode> {
    match mode.to_lowercase().as_str() {
        "always" => Ok(LivenessMode::Always),
        "never" => Ok(LivenessMode::Never),
        "random" => Ok(LivenessMode::Random),
        "http" => Ok(LivenessMode::Http),
        other => anyhow::bail!("unknown liveness mode: {}", other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            workers,
            timeout,
            liveness,
        } => {
            // Load config from file, then override with CLI arguments
            let mut config = Config::load_from(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind_addr = bind.parse()?;
            }
            if let Some(workers) = workers {
                config.cluster.workers_per_node = workers;
            }
            if let Some(timeout) = timeout {
                config.cluster.submission_timeout_ms =
                    u64::try_from(parse_duration(&timeout)?.as_millis())?;
            }
            if let Some(liveness) = liveness {
                config.cluster.liveness.mode = parse_liveness(&liveness)?;
            }
            config.validate()?;

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| config.log_level.clone().into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            Coordinator::new(config).serve().await?;
        }
    }

    Ok(())
}
