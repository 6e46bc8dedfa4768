use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// symdex - multi-language symbol extraction
#[derive(Parser, Debug)]
#[command(name = "symdex", version, about)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract symbol entries from files or directories
    Extract(ExtractArgs),

    /// List supported languages and their file extensions
    Languages,
}

#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    /// Files or directories to extract (defaults to the root)
    pub paths: Vec<PathBuf>,

    /// Project root that entry paths are relative to (defaults to the
    /// current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Output results as JSON Lines
    #[arg(long)]
    pub json: bool,

    /// Only output entries of these context types (e.g. function,call)
    #[arg(long, value_delimiter = ',')]
    pub kind: Vec<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
