//! Command-line argument parsing for ELERAG
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Profile;
use crate::ingest::SourceMode;

/// ELERAG - hybrid dense + entity retrieval over a local corpus
#[derive(Parser, Debug)]
#[command(name = "elerag")]
#[command(version)]
#[command(about = "Entity-linked retrieval-augmented QA over local CSV and text corpora", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.elerag/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Configuration profile
    #[arg(long, value_enum, global = true)]
    pub profile: Option<Profile>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors and final result only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the memory file from a CSV or text source
    Ingest(IngestArgs),

    /// Retrieve passages for a question and generate a one-sentence answer
    Query(QueryArgs),

    /// Display the effective configuration as TOML
    Config,
}

#[derive(ClapArgs, Debug)]
pub struct IngestArgs {
    /// Source file (.csv, or any text file)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Split text files into sentence-aligned overlapping chunks
    #[arg(long, conflicts_with = "paragraphs")]
    pub prose: bool,

    /// Split text files on blank lines
    #[arg(long)]
    pub paragraphs: bool,
}

impl IngestArgs {
    pub fn source_mode(&self) -> SourceMode {
        if self.prose {
            SourceMode::Prose
        } else if self.paragraphs {
            SourceMode::Paragraphs
        } else {
            SourceMode::Auto
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct QueryArgs {
    /// Question text; multiple words are joined with spaces
    #[arg(value_name = "QUESTION", required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Print retrieved passages without running the generator
    #[arg(long)]
    pub passages_only: bool,
}

impl QueryArgs {
    pub fn question_text(&self) -> String {
        self.question.join(" ")
    }
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Default tracing filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
