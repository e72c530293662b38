// src/bin/gosh.rs

use clap::Parser;
use colored::Colorize;
use gosh::cli::{self, Cli};

/// Sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = cli::dispatch(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
