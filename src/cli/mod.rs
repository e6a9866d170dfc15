//! Command-line interface for ceprace.

mod commands;
mod signal;

pub use commands::{is_verbose, run, Cli};
