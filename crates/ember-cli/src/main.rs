//! Ember CLI - Headless inspection of particle effects

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{list, simulate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Inspect and simulate 2D particle effects", long_about = None)]
#[command(version)]
struct Cli {
    /// Effects config file (fps, seed, extra catalogs)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered effects
    List {
        /// Extra TOML effect catalogs to load
        #[arg(long)]
        catalog: Vec<PathBuf>,

        /// Show sub-system details
        #[arg(long)]
        verbose: bool,
    },

    /// Spawn one effect and step it headlessly
    Simulate {
        /// Effect name
        effect: String,

        /// Simulated time in seconds
        #[arg(long, default_value = "2.0")]
        seconds: f64,

        /// Frame rate of the driving loop (defaults to the config's rate)
        #[arg(long)]
        fps: Option<u32>,

        /// Random seed (defaults to the config's seed)
        #[arg(long)]
        seed: Option<u32>,

        /// Target offset for travelling effects (comma-separated x,y)
        #[arg(long, value_parser = parse_vec2)]
        target: Option<[f32; 2]>,

        /// First scalar effect parameter
        #[arg(long)]
        param: Option<f32>,

        /// Extra TOML effect catalogs to load
        #[arg(long)]
        catalog: Vec<PathBuf>,

        /// Print the final quads as JSON instead of per-frame counts
        #[arg(long)]
        json: bool,
    },
}

fn parse_vec2(s: &str) -> Result<[f32; 2], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("expected 2 comma-separated values, got {}", parts.len()));
    }
    let x: f32 = parts[0].trim().parse().map_err(|e| format!("invalid x: {}", e))?;
    let y: f32 = parts[1].trim().parse().map_err(|e| format!("invalid y: {}", e))?;
    Ok([x, y])
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List { catalog, verbose } => list::run(&config, &catalog, verbose),
        Commands::Simulate {
            effect,
            seconds,
            fps,
            seed,
            target,
            param,
            catalog,
            json,
        } => simulate::run(
            &config,
            simulate::SimulateArgs {
                effect,
                seconds,
                fps,
                seed,
                target,
                param,
                catalog,
                json,
            },
        ),
    }
}
