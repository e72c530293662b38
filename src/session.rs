// src/session.rs

use crate::constants::DEFAULT_GO_VERSION;
use crate::models::Settings;
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Fire-and-forget sink for structured diagnostics.
///
/// Events never affect control flow; a sink that drops everything is a valid
/// implementation.
pub trait DebugSink {
    fn debug(&self, tag: &str, payload: Value);
}

/// Default sink: forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DebugSink for LogSink {
    fn debug(&self, tag: &str, payload: Value) {
        log::debug!("{tag}: {payload}");
    }
}

/// Explicit context for the command-execution API.
///
/// Replaces process-wide mutable state: the settings collaborator, the
/// variables discovered once at startup by [`crate::system::probe::init`],
/// the detected Go version, and the editor-side context (active file,
/// working directory).
///
/// Initialization contract: run the probe once, before the session is shared.
/// Afterwards the discovered state is only read; nothing here synchronizes
/// concurrent writes.
pub struct Session {
    pub settings: Settings,
    overrides: HashMap<String, String>,
    go_version: String,
    active_file: String,
    last_active_go_file: String,
    working_dir: PathBuf,
    sink: Box<dyn DebugSink>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            overrides: HashMap::new(),
            go_version: DEFAULT_GO_VERSION.to_string(),
            active_file: String::new(),
            last_active_go_file: String::new(),
            working_dir: env::current_dir().unwrap_or_default(),
            sink: Box::new(LogSink),
        }
    }

    /// Replaces the debug sink.
    pub fn with_sink(mut self, sink: Box<dyn DebugSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Variables discovered by the startup probe (`GOROOT` etc.).
    pub fn overrides(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    pub(crate) fn publish_override(&mut self, key: &str, value: &str) {
        self.overrides.insert(key.to_string(), value.to_string());
    }

    /// The detected Go toolchain version, or the default until probed.
    pub fn go_version(&self) -> &str {
        &self.go_version
    }

    pub(crate) fn set_go_version(&mut self, version: &str) {
        self.go_version = version.to_string();
    }

    /// The path of the currently active file, if any.
    pub fn active_file(&self) -> &str {
        &self.active_file
    }

    /// The last active file whose name ended in `.go`.
    pub fn last_active_go_file(&self) -> &str {
        &self.last_active_go_file
    }

    /// Records the active file. Files named `*.go` also become the last
    /// active Go file, which drives the `GS_GOPATH` derivation.
    pub fn set_active_file(&mut self, path: impl Into<String>) {
        let path = path.into();
        if path.to_lowercase().ends_with(".go") {
            self.last_active_go_file = path.clone();
        }
        self.active_file = path;
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn set_working_dir(&mut self, wd: impl Into<PathBuf>) {
        self.working_dir = wd.into();
    }

    /// Emits a structured debug event through the configured sink.
    pub fn debug(&self, tag: &str, payload: Value) {
        self.sink.debug(tag, payload);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("settings", &self.settings)
            .field("overrides", &self.overrides)
            .field("go_version", &self.go_version)
            .field("active_file", &self.active_file)
            .field("last_active_go_file", &self.last_active_go_file)
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}
