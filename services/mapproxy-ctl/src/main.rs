//! Tile-cache proxy configuration tool.
//!
//! Builds the proxy configuration from a cache catalog, refreshes layer
//! temporal dimensions and manages cache directories.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mapproxy_common::{parse_clean_targets, parse_layer_list, ResolveMode};
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mapproxy_ctl::{commands, Settings};

#[derive(Parser, Debug)]
#[command(name = "mapproxy-ctl")]
#[command(about = "Create and maintain a tile-cache proxy configuration", version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Log level
    #[arg(long, env = "MAPPROXY_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Append logs to this file instead of stderr
    #[arg(long, env = "MAPPROXY_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the proxy configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage the tile cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Create the configuration from the cache catalog
    Create {
        /// Where temporal dimensions are read from: wms, mapfile or xml
        #[arg(long, default_value = "wms")]
        mode: ResolveMode,
    },

    /// Refresh temporal dimensions in the existing configuration
    Update {
        /// Comma-separated layer names, or "all"
        #[arg(long)]
        layers: Option<String>,

        /// Where temporal dimensions are read from: wms, mapfile or xml
        #[arg(long, default_value = "wms")]
        mode: ResolveMode,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Create the cache base directory
    Create,

    /// Delete cached tiles
    Clean {
        /// Comma-separated layer names, or "all"
        #[arg(long)]
        layers: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_format, cli.log_file.as_ref())?;
    debug!(command = ?cli.command, "Starting mapproxy-ctl");

    let settings = &cli.settings;
    match cli.command {
        Commands::Config(ConfigCommand::Create { mode }) => {
            println!("Creating configuration ({} mode)", mode);
            let report = commands::config_create(settings, mode).await?;
            println!(
                "Wrote {} ({} layer entries)",
                report.path.display(),
                report.layers
            );
            println!("Done");
        }
        Commands::Config(ConfigCommand::Update { layers, mode }) => {
            let layers = parse_layer_list(layers.as_deref());
            match &layers {
                Some(names) => println!("Updating layers: {}", names.join(", ")),
                None => println!("Updating all layers"),
            }
            let report = commands::config_update(settings, layers, mode).await?;
            println!("Updated {}", report.path.display());
            println!("Done");
        }
        Commands::Cache(CacheCommand::Create) => {
            if commands::cache_create(settings)? {
                println!("Done");
            } else {
                println!("Directory already exists");
            }
        }
        Commands::Cache(CacheCommand::Clean { layers, force }) => {
            let layers = parse_clean_targets(&layers)?;
            let dirs = commands::cache_clean_plan(settings, layers.as_deref())?;

            if !force && !confirm("Continue?")? {
                println!("Exiting");
                return Ok(());
            }

            println!("Removing cache directories");
            let report = commands::cache_clean(settings, &dirs)?;
            for dir in &report.removed {
                println!("Deleted {}", dir.display());
            }
            if report.recreated {
                println!("Recreated {}", settings.cache_data_dir()?.display());
            }
            println!("Removed {} cached tiles", report.tiles);
        }
    }

    Ok(())
}

fn init_tracing(level: &str, format: LogFormat, file: Option<&PathBuf>) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    match file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let builder = builder.with_writer(Mutex::new(file)).with_ansi(false);
            match format {
                LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
                LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
            }
        }
        None => {
            let builder = builder.with_writer(io::stderr);
            match format {
                LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
                LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
            }
        }
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
