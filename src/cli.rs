use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidforge")]
#[command(author, version, about = "Compile named video operations into a single ffmpeg run")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP upload/process server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Process a single local file
    Process {
        /// Input media file
        #[arg(required = true)]
        input: PathBuf,

        /// Operation such as `resize:width=1280` (repeatable, applied in order)
        #[arg(short = 'o', long = "op")]
        ops: Vec<String>,

        /// Where to write the result (defaults to the current directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the ffmpeg command a job would run, without running it
    Plan {
        /// Input media file
        #[arg(required = true)]
        input: PathBuf,

        /// Operation (repeatable)
        #[arg(short = 'o', long = "op")]
        ops: Vec<String>,
    },

    /// Check that ffmpeg is available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
