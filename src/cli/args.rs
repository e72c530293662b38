// src/cli/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gosh: resolve a shell, assemble a Go-aware environment, run commands.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a TOML settings file (shell template, path separator, extra env).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run a command through the resolved shell and print its output.
    Run {
        /// Working directory for the child process (created if missing).
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Text fed to the child's stdin.
        #[arg(long)]
        input: Option<String>,

        /// Tokenize the command and spawn it directly, bypassing the shell template.
        #[arg(long)]
        no_shell: bool,

        /// The command line to execute.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        cmd: Vec<String>,
    },

    /// Probe the login shell and Go toolchain, printing what was discovered.
    Probe,

    /// Resolve a command name against the assembled PATH.
    Which {
        /// The command name to resolve.
        name: String,
    },

    /// Print the assembled environment, one KEY=VALUE per line.
    Env,
}
