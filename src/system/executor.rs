// src/system/executor.rs

use crate::core::{environment, paths};
use crate::models::{CommandSpec, ExecutionResult, ProcessHandle};
use crate::session::Session;
use crate::system::shell;
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command as StdCommand, Output, Stdio};
use thiserror::Error;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Cannot find command `{0}`")]
    CommandNotFound(String),
    #[error("Command `{0}` could not be started: {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("I/O failure while talking to `{0}`: {1}")]
    Communication(String, #[source] std::io::Error),
}

/// A single external command prepared for synchronous execution.
///
/// Two entry points mirror [`CommandSpec`]: a raw shell string routed
/// through the resolved shell template, or a pre-tokenized argv spawned
/// directly. Either way the process itself is started from an explicit
/// argument vector; no OS-level shell interpretation is involved.
#[derive(Debug)]
pub struct Job<'a> {
    session: &'a Session,
    spec: CommandSpec,
    input: Option<Vec<u8>>,
    wd: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl<'a> Job<'a> {
    /// A job for a raw shell-syntax command string.
    pub fn shell(session: &'a Session, command: impl Into<String>) -> Self {
        Self::new(session, CommandSpec::Shell(command.into()))
    }

    /// A job for an already-tokenized argument list.
    pub fn argv(session: &'a Session, argv: Vec<String>) -> Self {
        Self::new(session, CommandSpec::Argv(argv))
    }

    fn new(session: &'a Session, spec: CommandSpec) -> Self {
        Self {
            session,
            spec,
            input: None,
            wd: None,
            env: HashMap::new(),
        }
    }

    /// Bytes written to the child's stdin before reading its output.
    pub fn input(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.input = Some(bytes.into());
        self
    }

    /// Working directory for the child; created (best-effort) if missing.
    pub fn working_dir(mut self, wd: impl Into<PathBuf>) -> Self {
        self.wd = Some(wd.into());
        self
    }

    /// Adds a per-call environment override.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Resolves everything needed to start the process and spawns it.
    ///
    /// Setup failures never propagate as errors here; they are captured as
    /// the handle's cause so callers inspect a single value. An unresolvable
    /// command fails without a spawn attempt.
    pub fn prepare(self) -> ProcessHandle {
        if let Some(wd) = &self.wd {
            // best effort: an unusable directory surfaces as a spawn failure
            let _ = fs::create_dir_all(wd);
        }

        let env = environment::assemble(self.session, &self.env);
        let mut argv = match self.spec {
            CommandSpec::Shell(command) => shell::command_line(self.session, &command, &env),
            CommandSpec::Argv(argv) => argv,
        };

        let Some(requested) = argv.first().cloned() else {
            return ProcessHandle {
                child: None,
                input: self.input,
                requested: String::new(),
                argv,
                env,
                wd: self.wd,
                cause: Some(ExecError::EmptyCommand),
            };
        };

        let path_list = env.get("PATH").cloned().unwrap_or_default();
        let psep = environment::shell_pathsep(self.session);
        let resolved = paths::which(&requested, &path_list, &psep);

        let (child, cause) = match resolved {
            None => (None, Some(ExecError::CommandNotFound(requested.clone()))),
            Some(exe) => {
                let exe_str = exe.to_string_lossy().into_owned();
                if let Some(first) = argv.first_mut() {
                    *first = exe_str;
                }

                let mut cmd = StdCommand::new(&exe);
                cmd.args(argv.iter().skip(1))
                    .env_clear()
                    .envs(&env)
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                if let Some(wd) = &self.wd {
                    cmd.current_dir(dunce::simplified(wd));
                }
                #[cfg(windows)]
                {
                    use std::os::windows::process::CommandExt;
                    cmd.creation_flags(CREATE_NO_WINDOW);
                }

                match cmd.spawn() {
                    Ok(child) => (Some(child), None),
                    Err(e) => (None, Some(ExecError::Spawn(requested.clone(), e))),
                }
            }
        };

        ProcessHandle {
            child,
            input: self.input,
            requested,
            argv,
            env,
            wd: self.wd,
            cause,
        }
    }

    /// Runs the command to completion, feeding the optional input and
    /// capturing stdout and stderr.
    ///
    /// Output is decoded leniently; bytes that are not valid UTF-8 never
    /// fail the run. Any communication failure becomes the result's cause.
    pub fn run(self) -> ExecutionResult {
        let session = self.session;
        let handle = self.prepare();

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut cause = handle.cause;

        if cause.is_none() {
            session.debug(
                "exec.run",
                json!({
                    "requested": &handle.requested,
                    "argv": &handle.argv,
                    "wd": handle.wd.as_ref().map(|wd| wd.display().to_string()),
                }),
            );
        }

        if let Some(child) = handle.child {
            match communicate(child, handle.input.as_deref()) {
                Ok(output) => {
                    stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                    stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                }
                Err(e) => cause = Some(ExecError::Communication(handle.requested.clone(), e)),
            }
        }

        ExecutionResult {
            stdout,
            stderr,
            argv: handle.argv,
            cause,
        }
    }
}

/// Writes `input` to the child's stdin, closes it, and blocks until exit.
fn communicate(mut child: Child, input: Option<&[u8]>) -> std::io::Result<Output> {
    let stdin = child.stdin.take();
    if let (Some(mut stdin), Some(bytes)) = (stdin, input) {
        stdin.write_all(bytes)?;
        // dropping the handle closes the pipe so the child sees EOF
    }
    child.wait_with_output()
}
