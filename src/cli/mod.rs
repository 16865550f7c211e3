//! CLI module for ELERAG
//!
//! Handles command-line argument parsing and verbosity control.

pub mod args;

pub use args::{Args, Commands, IngestArgs, QueryArgs, Verbosity};
