use clap::{Parser, Subcommand};
use cli::{DirectoryFrameSource, GeoJsonOverlaySink, JsonLinesSink, TracingSink, load_config, save_config};
use color_eyre::eyre::Result;
use hand_guard::{FrameOrchestrator, GuardConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor a directory of frames for hands approaching the hazard zone
    Run {
        /// Path to the TOML or JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of frame images, processed in file name order
        #[arg(short, long)]
        frames: PathBuf,
        /// Write one JSON result per frame to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write a GeoJSON overlay per frame into this directory
        #[arg(long)]
        overlay_dir: Option<PathBuf>,
    },
    /// Print the JSON schema of the configuration file
    Schema,
    /// Write the default configuration
    InitConfig {
        /// Destination file (.toml or .json)
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            config,
            frames,
            output,
            overlay_dir,
        } => {
            run(config, frames, output.as_deref(), overlay_dir.as_deref())?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&GuardConfig::schema())?);
        }
        Commands::InitConfig { output } => {
            save_config(&GuardConfig::default(), output)?;
            info!("Default configuration saved to: {:?}", output);
        }
    }

    Ok(())
}

fn run(config_path: &Path, frames: &Path, output: Option<&Path>, overlay_dir: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    info!("Loaded configuration from {:?}", config_path);

    let mut builder = FrameOrchestrator::builder()
        .with_config(config)
        .add_sink(TracingSink);
    if let Some(path) = output {
        builder = builder.add_sink(JsonLinesSink::create(path)?);
    }
    if let Some(dir) = overlay_dir {
        builder = builder.add_sink(GeoJsonOverlaySink::create(dir)?);
    }
    let mut orchestrator = builder.build()?;

    let mut source = DirectoryFrameSource::open(frames)?;
    let summary = orchestrator.run(&mut source);

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
