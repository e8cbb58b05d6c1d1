//! Soundscape CLI - Command-line interface for soundscape generation
//!
//! This binary provides commands for validating scene documents,
//! generating soundscapes (annotations + mix specifications, optionally
//! rendered audio), and checking external dependencies.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use soundscape_cli::commands;

/// Soundscape - Probabilistic Soundscape Generation
#[derive(Parser)]
#[command(name = "soundscape")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scene document without generating anything
    Validate {
        /// Path to the scene JSON document
        #[arg(short, long)]
        scene: String,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Generate soundscapes from a scene document
    Generate {
        /// Path to the scene JSON document
        #[arg(short, long)]
        scene: String,

        /// Base generation seed
        #[arg(long, default_value = "0")]
        seed: u32,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        out_dir: Option<String>,

        /// Number of variations; seeds beyond the first derive from the base seed
        #[arg(long, default_value = "1")]
        count: u32,

        /// Also render audio through the external SoX tool
        #[arg(long)]
        render: bool,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Check external dependencies and configuration
    Doctor,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { scene, json } => commands::validate::run(&scene, json),
        Commands::Generate {
            scene,
            seed,
            out_dir,
            count,
            render,
            json,
        } => commands::generate::run(&scene, seed, out_dir.as_deref(), count, render, json),
        Commands::Doctor => commands::doctor::run(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
