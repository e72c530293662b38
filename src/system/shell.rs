// src/system/shell.rs

use crate::constants::{CMD_PLACEHOLDER, CMD_VAR};
use crate::core::template;
use crate::session::Session;
use std::collections::HashMap;
use std::path::Path;

/// Invocation pattern of a recognized shell family.
///
/// The shell-name lookup is an explicit mapping: every POSIX-style shell
/// shares one template and only `cmd` differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    /// POSIX-style shells, invoked as a login shell running a command string.
    Posix,
    /// Windows `cmd.exe`.
    Cmd,
}

impl Dialect {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sh" | "bash" | "zsh" | "fish" | "rc" => Some(Self::Posix),
            "cmd" => Some(Self::Cmd),
            _ => None,
        }
    }

    /// The invocation template, with `program` as issued by the environment
    /// (a full path when `SHELL`/`COMSPEC` carried one).
    fn template(self, program: &str) -> Vec<String> {
        match self {
            Self::Posix => vec![
                program.to_string(),
                "-l".to_string(),
                "-c".to_string(),
                CMD_PLACEHOLDER.to_string(),
            ],
            Self::Cmd => vec![
                program.to_string(),
                "/C".to_string(),
                CMD_PLACEHOLDER.to_string(),
            ],
        }
    }
}

/// Returns the shell invocation template for this session as an ordered
/// token list containing the literal `${CMD}` placeholder.
///
/// Resolution order: the configured template, then `SHELL`/`COMSPEC` from
/// `env` if the base name is a recognized shell, then the platform default.
pub fn shell_template(session: &Session, env: &HashMap<String, String>) -> Vec<String> {
    if !session.settings.shell.is_empty() {
        return session.settings.shell.clone();
    }

    let configured = env
        .get("SHELL")
        .filter(|s| !s.is_empty())
        .or_else(|| env.get("COMSPEC").filter(|s| !s.is_empty()));
    if let Some(program) = configured {
        let name = Path::new(program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if let Some(dialect) = Dialect::from_name(name) {
            return dialect.template(program);
        }
    }

    default_template()
}

fn default_template() -> Vec<String> {
    if cfg!(windows) {
        Dialect::Cmd.template("cmd")
    } else {
        Dialect::Posix.template("sh")
    }
}

/// Expands the shell template into the final argument list for `command`.
///
/// Substitution is safe: unrelated `${...}` sequences inside the template
/// pass through untouched, and tokens that expand to nothing are dropped.
pub fn command_line(session: &Session, command: &str, env: &HashMap<String, String>) -> Vec<String> {
    let vars = HashMap::from([(CMD_VAR.to_string(), command.to_string())]);

    shell_template(session, env)
        .into_iter()
        .filter_map(|token| {
            let expanded = match template::expand(&token, &vars) {
                Ok(expanded) => expanded,
                Err(_) => token,
            };
            (!expanded.is_empty()).then_some(expanded)
        })
        .collect()
}
