//! Command-line interface for rolerun
//!
//! - `args`: argument definitions (clap)
//! - `run`: entry point, signal wiring, exit-code mapping

pub mod args;
mod run;

pub use args::Cli;
pub use run::run;
