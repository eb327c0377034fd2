//! Command-Line Interface

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Motion Map - Drive keyboard and mouse input with body gestures
#[derive(Parser, Debug)]
#[command(name = "motion-map")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Where injected input goes
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Log every action and print them at the end
    Record,
    /// Discard all input
    Noop,
    /// Inject real OS input (requires the `enigo` feature)
    Os,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run gesture detection over a stream of pose frames
    Run {
        /// JSON Lines file with one pose frame per line
        #[arg(short, long)]
        input: PathBuf,

        /// Replay as fast as possible instead of at the recorded pace.
        /// Release timers still run on the wall clock, so held inputs stop
        /// matching the recording.
        #[arg(long)]
        fast: bool,

        /// Detect and record gestures without injecting input
        #[arg(long)]
        dry_run: bool,

        /// Input backend
        #[arg(short, long, value_enum, default_value = "record")]
        backend: Backend,
    },

    /// List the gesture library
    Gestures {
        /// Show checkpoints and mappings
        #[arg(short, long)]
        detailed: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or reset configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,

    /// Get a specific configuration value
    Get {
        /// Dotted key (e.g., "mouse.speed", "mappings.jump.modifier")
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
