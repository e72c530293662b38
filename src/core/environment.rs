// src/core/environment.rs

use crate::core::{paths, template};
use crate::session::Session;
use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Separator the invoking shell expects in PATH-like variables.
pub fn shell_pathsep(session: &Session) -> String {
    session
        .settings
        .shell_pathsep
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| paths::native_pathsep().to_string())
}

/// Assembles the full environment for a spawned process.
///
/// Starts from the inherited environment, folds in the session's discovered
/// variables and the caller's `overrides` (override wins), derives
/// `GS_GOPATH` from the last active Go file, expands the user-configured
/// env templates, and rebuilds `PATH` so that every directory expected to
/// contain Go binaries is searchable. No step is fatal: malformed entries
/// are skipped with a warning, never abort the whole assembly.
pub fn assemble(session: &Session, overrides: &HashMap<String, String>) -> HashMap<String, String> {
    let psep = shell_pathsep(session);
    let native = paths::native_pathsep();

    let mut e: HashMap<String, String> = HashMap::new();
    for (key, value) in std::env::vars_os() {
        match (key.to_str(), value.to_str()) {
            (Some(key), Some(value)) => {
                e.insert(key.to_string(), value.to_string());
            }
            _ => log::debug!("skipping non-UTF-8 environment entry"),
        }
    }

    // the inherited values may be joined for the host OS rather than for the
    // shell, so fix the vars that depend on shell_pathsep
    for key in ["PATH", "GOPATH"] {
        let value = e.get(key).cloned().unwrap_or_default();
        e.insert(key.to_string(), paths::translate_pathsep(&value, native, &psep));
    }

    for (key, value) in session.overrides() {
        e.insert(key.clone(), value.clone());
    }
    for (key, value) in overrides {
        e.insert(key.clone(), value.clone());
    }

    let mut roots: Vec<String> = e
        .get("GOPATH")
        .cloned()
        .unwrap_or_default()
        .split(psep.as_str())
        .map(str::to_string)
        .collect();
    roots.push(e.get("GOROOT").cloned().unwrap_or_default());
    let gs_gopath = derive_gs_gopath(
        session.last_active_go_file(),
        &roots,
        MAIN_SEPARATOR,
        native,
    );
    e.insert("GS_GOPATH".to_string(), gs_gopath);

    // user-configured extras are templates over the environment built so far
    let mut uenv = HashMap::new();
    for (key, raw) in &session.settings.env {
        match template::expand(raw, &e) {
            Ok(value) => {
                uenv.insert(key.clone(), value);
            }
            Err(err) => log::warn!("Cannot expand env var `{key}`: {err}"),
        }
    }
    e.extend(uenv);
    for (key, value) in overrides {
        e.insert(key.clone(), value.clone());
    }

    let add_path = additive_bin_paths(&e, &psep);
    e.insert("PATH".to_string(), add_path.join(&psep));

    let wd = session.working_dir().to_string_lossy().into_owned();
    let active = session.active_file().to_string();
    let base = active
        .replace('\\', "/")
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    e.insert("PWD".to_string(), wd.clone());
    e.insert("_wd".to_string(), wd);
    e.insert("_fn".to_string(), active);
    e.insert("_nm".to_string(), base);

    let mut clean = HashMap::with_capacity(e.len());
    for (key, value) in e {
        match sanitize_pair(&key, &value) {
            Ok(()) => {
                clean.insert(key, value);
            }
            Err(reason) => log::warn!("Bad env entry `{key}`: {reason}"),
        }
    }
    clean
}

/// Convenience lookup over a fresh assembly.
pub fn getenv(session: &Session, name: &str, default: &str) -> String {
    assemble(session, &HashMap::new())
        .get(name)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Resolves `cmd` against the `PATH` of a fresh assembly.
pub fn which(session: &Session, cmd: &str) -> Option<PathBuf> {
    let e = assemble(session, &HashMap::new());
    let path_list = e.get("PATH").cloned().unwrap_or_default();
    paths::which(cmd, &path_list, &shell_pathsep(session))
}

/// Builds the ordered, deduplicated list of binary directories for `PATH`.
///
/// `go install` drops binaries into the `bin` dir of the corresponding
/// `GOPATH` entry, so each of those dirs has to be searchable, ahead of
/// whatever `PATH` already carried.
fn additive_bin_paths(e: &HashMap<String, String>, psep: &str) -> Vec<String> {
    let mut add_path: Vec<String> = Vec::new();
    fn push_unique(list: &mut Vec<String>, entry: String) {
        if !list.iter().any(|p| *p == entry) {
            list.push(entry);
        }
    }

    if let Some(home) = dirs::home_dir() {
        push_unique(&mut add_path, home.join("bin").to_string_lossy().into_owned());
    }

    let mut bin_roots: Vec<String> = vec![e.get("GOROOT").cloned().unwrap_or_default()];
    bin_roots.extend(
        e.get("GOPATH")
            .cloned()
            .unwrap_or_default()
            .split(psep)
            .map(str::to_string),
    );
    for root in bin_roots {
        if !root.is_empty() {
            let bin = Path::new(&root).join("bin").to_string_lossy().into_owned();
            push_unique(&mut add_path, bin);
        }
    }

    if let Some(gobin) = e.get("GOBIN")
        && !gobin.is_empty()
    {
        push_unique(&mut add_path, gobin.clone());
    }

    let conventional: &[&str] = if cfg!(windows) {
        &["~\\bin", "~\\go\\bin", "C:\\Go\\bin"]
    } else {
        &[
            "~/bin",
            "~/go/bin",
            "/usr/local/go/bin",
            "/usr/local/opt/go/bin",
            "/usr/local/bin",
            "/usr/bin",
        ]
    };
    for entry in conventional {
        push_unique(&mut add_path, shellexpand::tilde(entry).into_owned());
    }

    for segment in e.get("PATH").cloned().unwrap_or_default().split(psep) {
        if !segment.is_empty() {
            push_unique(&mut add_path, segment.to_string());
        }
    }

    add_path
}

/// Walks the directory components of `file`, collecting the prefix before
/// every `src` component (case-insensitive) that is not already a known
/// GOPATH/GOROOT root. The ancestor closest to the file comes first.
fn derive_gs_gopath(file: &str, roots: &[String], dir_sep: char, list_sep: &str) -> String {
    let comps: Vec<&str> = file.split(dir_sep).collect();
    let sep = dir_sep.to_string();

    let mut found: Vec<String> = Vec::new();
    for (i, comp) in comps.iter().enumerate() {
        if comp.eq_ignore_ascii_case("src") {
            let prefix = comps.iter().take(i).cloned().collect::<Vec<_>>().join(&sep);
            if !roots.iter().any(|r| *r == prefix) {
                found.push(prefix);
            }
        }
    }
    found.reverse();
    found.join(list_sep)
}

fn sanitize_pair(key: &str, value: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        Err("empty key")
    } else if key.contains('=') {
        Err("key contains `=`")
    } else if key.contains('\0') || value.contains('\0') {
        Err("embedded NUL byte")
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // --- GS_GOPATH derivation ---

    #[test]
    fn test_gs_gopath_single_src_ancestor() {
        let derived = derive_gs_gopath("/home/u/proj/src/pkg/main.go", &[], '/', ":");
        assert_eq!(derived, "/home/u/proj");
    }

    #[test]
    fn test_gs_gopath_closest_ancestor_first() {
        let derived = derive_gs_gopath("/a/src/b/src/c.go", &[], '/', ":");
        assert_eq!(derived, "/a/src/b:/a");
    }

    #[test]
    fn test_gs_gopath_known_roots_excluded() {
        let roots = vec!["/home/u/proj".to_string()];
        let derived = derive_gs_gopath("/home/u/proj/src/pkg/main.go", &roots, '/', ":");
        assert_eq!(derived, "");
    }

    #[test]
    fn test_gs_gopath_src_match_is_case_insensitive() {
        let derived = derive_gs_gopath("/home/u/proj/SRC/pkg/main.go", &[], '/', ":");
        assert_eq!(derived, "/home/u/proj");
    }

    #[test]
    fn test_gs_gopath_empty_file_is_empty() {
        assert_eq!(derive_gs_gopath("", &[], '/', ":"), "");
    }

    // --- additive PATH ---

    #[test]
    fn test_additive_paths_dedup_preserves_first_seen_order() {
        let e = map(&[
            ("GOROOT", "/gosh-test-goroot"),
            ("GOPATH", "/gosh-test-gp1:/gosh-test-gp2:/gosh-test-gp1"),
            ("PATH", "/gosh-test-x:/gosh-test-goroot/bin:/gosh-test-x"),
        ]);
        let add_path = additive_bin_paths(&e, ":");

        for dir in [
            "/gosh-test-goroot/bin",
            "/gosh-test-gp1/bin",
            "/gosh-test-gp2/bin",
            "/gosh-test-x",
        ] {
            let count = add_path.iter().filter(|p| *p == dir).count();
            assert_eq!(count, 1, "`{dir}` must appear exactly once: {add_path:?}");
        }

        let goroot_bin = add_path.iter().position(|p| p == "/gosh-test-goroot/bin");
        let gp1_bin = add_path.iter().position(|p| p == "/gosh-test-gp1/bin");
        let plain = add_path.iter().position(|p| p == "/gosh-test-x");
        assert!(goroot_bin < gp1_bin, "GOROOT bin comes before GOPATH bins");
        assert!(gp1_bin < plain, "inherited PATH entries come last");
    }

    #[test]
    fn test_additive_paths_gobin_and_determinism() {
        let e = map(&[("GOBIN", "/gosh-test-gobin"), ("PATH", "/gosh-test-a")]);
        let first = additive_bin_paths(&e, ":");
        assert!(first.iter().any(|p| p == "/gosh-test-gobin"));

        let second = additive_bin_paths(&e, ":");
        assert_eq!(first, second);
    }

    // --- sanitization ---

    #[test]
    fn test_sanitize_pair() {
        assert!(sanitize_pair("KEY", "value").is_ok());
        assert!(sanitize_pair("", "value").is_err());
        assert!(sanitize_pair("A=B", "value").is_err());
        assert!(sanitize_pair("KEY", "a\0b").is_err());
    }

    // --- full assembly ---

    #[test]
    fn test_assemble_sets_context_vars() {
        let mut session = Session::new(Settings::default());
        session.set_working_dir("/tmp");
        session.set_active_file("/w/app/src/pkg/main.go");

        let e = assemble(&session, &HashMap::new());
        assert_eq!(e.get("PWD").map(String::as_str), Some("/tmp"));
        assert_eq!(e.get("_wd").map(String::as_str), Some("/tmp"));
        assert_eq!(e.get("_fn").map(String::as_str), Some("/w/app/src/pkg/main.go"));
        assert_eq!(e.get("_nm").map(String::as_str), Some("main.go"));
        assert!(!e.get("PATH").map(String::as_str).unwrap_or_default().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_assemble_derives_gs_gopath_from_last_go_file() {
        let mut session = Session::new(Settings::default());
        session.set_active_file("/gosh-test-home/u/proj/src/pkg/main.go");

        let e = assemble(&session, &HashMap::new());
        assert_eq!(
            e.get("GS_GOPATH").map(String::as_str),
            Some("/gosh-test-home/u/proj")
        );
    }

    #[test]
    fn test_assemble_override_wins_over_settings_env() {
        let mut settings = Settings::default();
        settings
            .env
            .insert("GOSH_TEST_K".to_string(), "from-settings".to_string());
        let session = Session::new(settings);

        let overrides = map(&[("GOSH_TEST_K", "from-override")]);
        let e = assemble(&session, &overrides);
        assert_eq!(
            e.get("GOSH_TEST_K").map(String::as_str),
            Some("from-override")
        );
    }

    #[test]
    fn test_assemble_expands_settings_env_templates() {
        let mut settings = Settings::default();
        settings
            .env
            .insert("GOSH_TEST_T".to_string(), "v-${GOSH_TEST_BASE}".to_string());
        let session = Session::new(settings);

        let overrides = map(&[("GOSH_TEST_BASE", "42")]);
        let e = assemble(&session, &overrides);
        assert_eq!(e.get("GOSH_TEST_T").map(String::as_str), Some("v-42"));
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let session = Session::new(Settings::default());
        let first = assemble(&session, &HashMap::new());
        let second = assemble(&session, &HashMap::new());
        assert_eq!(first.get("PATH"), second.get("PATH"));
    }
}
