use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snowkarma::channels::TranscriptChannel;
use snowkarma::config::{default_config_path, Config};
use snowkarma::karma_cli::{self, KarmaCommands};

#[derive(Parser)]
#[command(name = "snowkarma")]
#[command(about = "Karma tracking for chat bots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value_t = default_config_path())]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed chat events to the karma module (stdin unless --transcript)
    Run {
        /// Read events from this file instead of stdin
        #[arg(short, long)]
        transcript: Option<PathBuf>,
    },
    #[command(flatten)]
    Karma(KarmaCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load_from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    config.expand_paths();

    // Initialize logging
    init_logging(&config.logging.level)?;

    // Validate configuration
    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    // Default to run command if no subcommand specified
    let command = cli.command.unwrap_or(Commands::Run { transcript: None });

    match command {
        Commands::Run { transcript } => run_host(&config, transcript).await,
        Commands::Karma(cmd) => karma_cli::handle_command(cmd, &config),
    }
}

async fn run_host(config: &Config, transcript: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting snowkarma v{}", env!("CARGO_PKG_VERSION"));
    let mut stdout = tokio::io::stdout();

    match transcript {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open transcript {}", path.display()))?;
            let channel = TranscriptChannel::new(path.display().to_string(), BufReader::new(file));
            snowkarma::run(config, channel, &mut stdout).await?;
        }
        None => {
            let channel = TranscriptChannel::new("stdin", BufReader::new(tokio::io::stdin()));
            snowkarma::run(config, channel, &mut stdout).await?;
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter.to_string())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}
