//! Command line interface definition for the `signease` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "signease", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// History database file (overrides the configured path)
    #[arg(long, global = true)]
    pub history: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Replay a recorded landmark trace through the lip reader
    Replay {
        /// Trace file (.json, otherwise YAML)
        trace: PathBuf,

        /// Frame rate used to timestamp replayed frames
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Session id the replay is recorded under
        #[arg(long, default_value = "replay")]
        session: String,

        /// Print every frame outcome as a JSON line
        #[arg(long)]
        json: bool,
    },

    /// Convert text to ASL words and animations
    Translate {
        /// Text to convert
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List the words the lip reader can detect
    Words,

    /// Show conversion history
    History {
        /// Maximum number of records
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only show records of this kind ("all" for every kind)
        #[arg(short, long)]
        kind: Option<String>,

        /// Show aggregate statistics instead of records
        #[arg(long)]
        stats: bool,
    },

    /// Print an example configuration file
    Config,
}
