// src/models.rs

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Child;
use thiserror::Error;

use crate::system::executor::ExecError;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings file: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Read-only settings for the execution pipeline.
///
/// Every field has a default, so a missing file or an empty TOML table is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Shell invocation template, e.g. `["bash", "-l", "-c", "${CMD}"]`.
    /// Empty means "detect from the environment".
    pub shell: Vec<String>,

    /// Separator the invoking shell expects in PATH-like variables.
    /// `None` means the host's native separator.
    pub shell_pathsep: Option<String>,

    /// Extra environment variables. Values are templates expanded against
    /// the environment assembled so far (`$VAR` / `${VAR}` syntax).
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from a TOML file. Absent fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// How a command was specified by the caller.
#[derive(Debug, Clone)]
pub enum CommandSpec {
    /// A raw shell-syntax string, routed through the resolved shell template.
    Shell(String),
    /// An already-tokenized argument list, spawned as-is.
    Argv(Vec<String>),
}

/// A command prepared for execution: the spawned child (absent when setup
/// failed), the input still to be written, and everything needed for
/// diagnostics. Consumed once by the blocking-read step.
#[derive(Debug)]
pub struct ProcessHandle {
    pub child: Option<Child>,
    pub input: Option<Vec<u8>>,
    /// The command name as requested, before executable resolution.
    pub requested: String,
    /// The final, resolved argument list.
    pub argv: Vec<String>,
    pub env: HashMap<String, String>,
    pub wd: Option<PathBuf>,
    pub cause: Option<ExecError>,
}

impl ProcessHandle {
    /// True iff setup succeeded; `cause` is present exactly when this is false.
    pub fn ok(&self) -> bool {
        self.cause.is_none()
    }
}

/// Captured outcome of a completed command. Immutable once produced.
#[derive(Debug)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// The resolved argument list, kept for diagnostics.
    pub argv: Vec<String>,
    pub cause: Option<ExecError>,
}

impl ExecutionResult {
    /// True iff neither setup nor communication failed; `cause` is present
    /// exactly when this is false.
    pub fn ok(&self) -> bool {
        self.cause.is_none()
    }
}
