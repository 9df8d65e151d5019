mod cache;

use clap::{Parser, Subcommand};
use cxref_core::Format;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cxref",
    version,
    about = "Inspect and maintain cxref index caches",
    long_about = "cxref keeps one versioned cache file per indexed C/C++/Objective-C source. \
                  These commands locate, decode, convert and clean up those files. \
                  The cache directory defaults to ~/.cxref/cache and can be moved with CXREF_CACHE_DIR."
)]
pub struct Cli {
    /// Also log to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the cache file path for a source file
    Path {
        #[arg(value_name = "SOURCE")]
        source: PathBuf,
    },
    /// Decode a cache file and summarize its contents
    #[command(
        long_about = "Decodes a .json or .mpack cache file (compressed or not) and prints its \
                            header fields and entity counts."
    )]
    Inspect {
        #[arg(value_name = "CACHE_FILE")]
        file: PathBuf,

        /// Also list every type, function and variable
        #[arg(long)]
        entities: bool,
    },
    /// Print a cache file as pretty JSON
    Dump {
        #[arg(value_name = "CACHE_FILE")]
        file: PathBuf,
    },
    /// Re-encode a cache file in another format
    Convert {
        #[arg(value_name = "CACHE_FILE")]
        file: PathBuf,

        /// Target format: json or msgpack
        #[arg(long)]
        to: Format,

        /// Output path. Defaults to the input path with the target extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove every cache file in the cache directory
    Clear,
    /// Show cache directory statistics
    Stats,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = cxref_core::logging::init_logging("cli", cli.verbose);

    match cli.command {
        Commands::Path { source } => cache::path(&source),
        Commands::Inspect { file, entities } => cache::inspect(&file, entities),
        Commands::Dump { file } => cache::dump(&file),
        Commands::Convert { file, to, output } => cache::convert(&file, to, output),
        Commands::Clear => cache::clear(),
        Commands::Stats => cache::stats(),
    }
}
