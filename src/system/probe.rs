// src/system/probe.rs

use crate::constants::PROBED_VARS;
use crate::session::Session;
use crate::system::executor::Job;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use std::time::Instant;

lazy_static! {
    // Probe tokens wrap each variable in both POSIX (`$VAR`) and Windows
    // (`%VAR%`) expansion syntax, so one shell round-trip answers for either.
    static ref PROBE_TOKEN: Regex = Regex::new(&format!(
        r"\[\[\[(.*?)\]\]({})\[\[(.*?)\]\]\]",
        PROBED_VARS.join("|")
    ))
    .expect("probe pattern is valid");
    static ref GOROOT_LINE: Regex = Regex::new(r"\bGOROOT=(.+)").expect("GOROOT pattern is valid");
    static ref GO_VERSION_OUTPUT: Regex =
        Regex::new(r"(?i)go\s+version\s+(\S+)").expect("version pattern is valid");
}

/// Discovers `PATH`/`GOBIN`/`GOPATH`/`GOROOT` through one blocking shell
/// round-trip and detects the Go toolchain version, publishing the results
/// into the session's override cache.
///
/// Call once, before the session is shared. Every probe is allowed to fail;
/// failures are logged and the affected variables keep their defaults.
pub fn init(session: &mut Session) {
    let start = Instant::now();

    let tokens: Vec<String> = PROBED_VARS
        .iter()
        .map(|k| format!("[[[${k}]]{k}[[%{k}%]]]"))
        .collect();
    let cmd_str = format!("echo \"{}\"", tokens.join(" "));

    let cr = Job::shell(&*session, cmd_str.as_str()).run();
    if let Some(cause) = &cr.cause {
        log::error!("error loading env vars: {cause}");
    }

    let combined = format!("{}{}", cr.stdout, cr.stderr);
    for (key, value) in parse_probe_output(&combined) {
        session.publish_override(&key, &value);
    }

    // the login shell may not export GOROOT; the toolchain itself knows it
    if session.overrides().get("GOROOT").is_none_or(|v| v.is_empty()) {
        let out = go(&*session, "env");
        if let Some(goroot) = parse_goroot(&out) {
            session.publish_override("GOROOT", &goroot);
        }
    }

    let cr_go = Job::shell(&*session, "go version").run();
    let go_out = format!("{}{}", cr_go.stdout, cr_go.stderr);
    if let Some(version) = parse_go_version(&go_out) {
        session.set_go_version(&version);
    }

    let dur = start.elapsed();
    session.debug(
        "exec.init",
        json!({
            "env": session.overrides(),
            "go_version": session.go_version(),
            "probe_argv": redact(&cr.argv, &cmd_str),
            "go_argv": &cr_go.argv,
            "dur_s": dur.as_secs_f64(),
        }),
    );

    log::info!(
        "load env vars {:?}: go version: {:?} -> `{}`: {:.3}s",
        redact(&cr.argv, &cmd_str),
        cr_go.argv,
        session.go_version(),
        dur.as_secs_f64()
    );
}

/// Runs `go <subcmd>` through the shell pipeline and returns the trimmed,
/// combined output.
pub fn go(session: &Session, subcmd: &str) -> String {
    let cr = Job::shell(session, format!("go {subcmd}")).run();
    format!("{}\n{}", cr.stdout.trim(), cr.stderr.trim())
        .trim()
        .to_string()
}

/// Extracts the variables that actually expanded on either side of a probe
/// token. A token untouched by both expansion syntaxes yields nothing.
fn parse_probe_output(out: &str) -> Vec<(String, String)> {
    let mut found = Vec::new();
    for caps in PROBE_TOKEN.captures_iter(out) {
        let posix = caps.get(1).map_or("", |m| m.as_str());
        let key = caps.get(2).map_or("", |m| m.as_str());
        let windows = caps.get(3).map_or("", |m| m.as_str());

        let value = if posix != format!("${key}") {
            posix
        } else if windows != format!("%{key}%") {
            windows
        } else {
            ""
        };
        if !value.is_empty() {
            found.push((key.to_string(), value.to_string()));
        }
    }
    found
}

fn parse_goroot(out: &str) -> Option<String> {
    GOROOT_LINE
        .captures(out)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

fn parse_go_version(out: &str) -> Option<String> {
    let raw = GO_VERSION_OUTPUT.captures(out)?.get(1)?.as_str();
    Some(raw.strip_prefix("go").unwrap_or(raw).to_string())
}

fn redact(argv: &[String], cmd_str: &str) -> Vec<String> {
    argv.iter()
        .map(|v| v.replace(cmd_str, "echo \"...\""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_posix_expansion() {
        let out = "[[[/usr/local/go]]GOROOT[[%GOROOT%]]]";
        assert_eq!(
            parse_probe_output(out),
            vec![("GOROOT".to_string(), "/usr/local/go".to_string())]
        );
    }

    #[test]
    fn test_parse_probe_windows_expansion() {
        let out = r"[[[$GOPATH]]GOPATH[[C:\gopath]]]";
        assert_eq!(
            parse_probe_output(out),
            vec![("GOPATH".to_string(), r"C:\gopath".to_string())]
        );
    }

    #[test]
    fn test_parse_probe_unexpanded_token_yields_nothing() {
        let out = "[[[$GOBIN]]GOBIN[[%GOBIN%]]]";
        assert!(parse_probe_output(out).is_empty());
    }

    #[test]
    fn test_parse_probe_multiple_tokens_on_one_line() {
        let out = "[[[/usr/bin:/bin]]PATH[[%PATH%]]] [[[$GOBIN]]GOBIN[[%GOBIN%]]] [[[/go]]GOPATH[[%GOPATH%]]]";
        assert_eq!(
            parse_probe_output(out),
            vec![
                ("PATH".to_string(), "/usr/bin:/bin".to_string()),
                ("GOPATH".to_string(), "/go".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_go_version_normalizes() {
        assert_eq!(
            parse_go_version("go version go1.22.3 linux/amd64").as_deref(),
            Some("1.22.3")
        );
        assert_eq!(
            parse_go_version("sh: go: command not found"),
            None
        );
    }

    #[test]
    fn test_parse_goroot_trims_quotes() {
        assert_eq!(
            parse_goroot("GOROOT=\"/usr/local/go\"").as_deref(),
            Some("/usr/local/go")
        );
        assert_eq!(parse_goroot("nothing here"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_init_discovers_path_from_the_login_shell() {
        let mut session = Session::default();
        init(&mut session);

        let path = session.overrides().get("PATH");
        assert!(
            path.is_some_and(|p| !p.is_empty()),
            "probe must discover PATH, got overrides {:?}",
            session.overrides()
        );
    }
}
