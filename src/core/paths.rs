// src/core/paths.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The separator the host OS uses in PATH-like variables.
pub fn native_pathsep() -> &'static str {
    if cfg!(windows) { ";" } else { ":" }
}

/// Rejoins a separator-delimited list using a different separator.
///
/// The inherited environment may carry `PATH`-style values joined with the
/// native separator while the invoking shell expects another one (a POSIX
/// shell under a Windows host, for instance).
pub fn translate_pathsep(value: &str, from: &str, to: &str) -> String {
    if from == to {
        return value.to_string();
    }
    value.split(from).collect::<Vec<_>>().join(to)
}

/// Whether `path` is an existing regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(path) {
            Ok(m) => m.is_file() && (m.permissions().mode() & 0o111 != 0),
            Err(_) => false,
        }
    }

    #[cfg(windows)]
    {
        std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }
}

/// Resolves a command name to an absolute executable path by scanning the
/// segments of `path_list` in order.
///
/// An absolute input is accepted only if it already names an executable
/// regular file. On Windows a bare name gets a `.exe` suffix appended at
/// most once; PATHEXT-style extension lists are not supported.
pub fn which(cmd: &str, path_list: &str, pathsep: &str) -> Option<PathBuf> {
    which_in(cmd, path_list, pathsep, cfg!(windows))
}

fn which_in(cmd: &str, path_list: &str, pathsep: &str, windows: bool) -> Option<PathBuf> {
    let cmd_path = Path::new(cmd);
    if cmd_path.is_absolute() {
        return is_executable(cmd_path).then(|| cmd_path.to_path_buf());
    }

    let name = if windows && !cmd.ends_with(".exe") {
        format!("{cmd}.exe")
    } else {
        cmd.to_string()
    };

    let mut seen = HashSet::new();
    for segment in path_list.split(pathsep) {
        let candidate = Path::new(segment).join(&name);
        if seen.insert(candidate.clone()) && is_executable(&candidate) {
            return Some(candidate);
        }
    }

    None
}
