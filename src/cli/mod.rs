// src/cli/mod.rs

pub mod args;
pub use args::{Cli, CliCommand};

use crate::core::environment;
use crate::models::Settings;
use crate::session::Session;
use crate::system::{executor::Job, probe};
use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Routes a parsed command line to its handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from '{}'", path.display()))?,
        None => Settings::default(),
    };
    let mut session = Session::new(settings);

    match cli.command {
        CliCommand::Run {
            dir,
            input,
            no_shell,
            cmd,
        } => handle_run(&session, dir, input, no_shell, cmd),
        CliCommand::Probe => handle_probe(&mut session),
        CliCommand::Which { name } => handle_which(&session, &name),
        CliCommand::Env => handle_env(&session),
    }
}

fn handle_run(
    session: &Session,
    dir: Option<PathBuf>,
    input: Option<String>,
    no_shell: bool,
    cmd: Vec<String>,
) -> Result<()> {
    let command_line = cmd.join(" ");
    let mut job = if no_shell {
        let argv = shlex::split(&command_line)
            .ok_or_else(|| anyhow!("command could not be parsed: {command_line}"))?;
        Job::argv(session, argv)
    } else {
        Job::shell(session, command_line.as_str())
    };
    if let Some(dir) = dir {
        job = job.working_dir(dir);
    }
    if let Some(input) = input {
        job = job.input(input.into_bytes());
    }

    let result = job.run();
    print!("{}", result.stdout);
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr.red());
    }

    match result.cause {
        None => Ok(()),
        Some(cause) => Err(anyhow::Error::new(cause)),
    }
}

fn handle_probe(session: &mut Session) -> Result<()> {
    probe::init(session);

    let mut discovered: Vec<_> = session.overrides().iter().collect();
    discovered.sort();
    for (key, value) in discovered {
        println!("{key}={value}");
    }
    println!("go version: {}", session.go_version());
    Ok(())
}

fn handle_which(session: &Session, name: &str) -> Result<()> {
    match environment::which(session, name) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => Err(anyhow!("cannot find command `{name}`")),
    }
}

fn handle_env(session: &Session) -> Result<()> {
    let mut entries: Vec<_> = environment::assemble(session, &HashMap::new())
        .into_iter()
        .collect();
    entries.sort();
    for (key, value) in entries {
        println!("{key}={value}");
    }
    Ok(())
}
