use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::info;

use flowsentry::capture::{choose_interface, PcapCapture};
use flowsentry::config::Config;
use flowsentry::engine::Engine;
use flowsentry::ml::ModelScorer;

#[derive(Parser)]
#[command(name = "flowsentry")]
#[command(author, version, about = "Live network traffic anomaly monitor")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start capturing and analyzing traffic
    Run {
        /// Capture interface (overrides config and auto-selection)
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// List capture interfaces and show which one would be selected
    Interfaces,

    /// Generate default configuration file
    GenConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn run_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    match cli.command {
        Commands::Run { interface } => run_monitor(config, interface).await,
        Commands::Interfaces => list_interfaces(&config),
        Commands::GenConfig { output } => gen_config(output),
    }
}

async fn run_monitor(mut config: Config, interface: Option<String>) -> Result<()> {
    if interface.is_some() {
        config.capture.interface = interface;
    }

    // The scorer must be up before the first analysis cycle; a missing or
    // malformed model aborts startup.
    let scorer = ModelScorer::load(&config.model.path)
        .with_context(|| format!("Failed to load model from {}", config.model.path.display()))?;
    let threshold = scorer.threshold();

    let capture = PcapCapture::open(&config.capture).context("Failed to open capture")?;

    info!(
        "flowsentry monitoring {} (window {}s, cycle {}ms)",
        capture.interface(),
        config.analysis.window_secs,
        config.analysis.cycle_ms
    );

    let engine = Arc::new(Engine::new(&config, Arc::new(scorer), threshold));
    engine.run(Box::new(capture)).await;

    Ok(())
}

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Interface")]
    name: String,
    #[tabled(rename = "IPv4")]
    ipv4: String,
    #[tabled(rename = "Selected")]
    selected: String,
}

fn list_interfaces(config: &Config) -> Result<()> {
    let selected = choose_interface(&config.capture)
        .map(|d| d.name)
        .unwrap_or_default();

    let devices = pcap::Device::list().context("Failed to list capture devices")?;
    let rows: Vec<InterfaceRow> = devices
        .iter()
        .map(|d| InterfaceRow {
            name: d.name.clone(),
            ipv4: d
                .addresses
                .iter()
                .find(|a| a.addr.is_ipv4())
                .map(|a| a.addr.to_string())
                .unwrap_or_else(|| "-".to_string()),
            selected: if d.name == selected {
                "*".green().to_string()
            } else {
                String::new()
            },
        })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}

fn gen_config(output: Option<PathBuf>) -> Result<()> {
    let config = Config::default();

    match output {
        Some(path) => {
            config.save(&path)?;
            println!("Wrote default config to {}", path.display());
        }
        None => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
