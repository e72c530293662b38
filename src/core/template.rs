// src/core/template.rs

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Invalid `${{` placeholder in template `{0}`.")]
    InvalidPlaceholder(String),
}

lazy_static! {
    // `$$` escape, `${name}`, `$name`, then a stray `${` with no valid name.
    static ref PLACEHOLDER: Regex = Regex::new(
        r"\$(?:(\$)|\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*)|(\{))"
    )
    .expect("placeholder pattern is valid");
}

/// Expands `$name` / `${name}` placeholders from `vars`.
///
/// Substitution is safe: a placeholder whose name is not in `vars` passes
/// through unchanged, and `$$` collapses to a literal `$`. The only rejected
/// input is a `${` that never forms a valid placeholder, reported as a typed
/// error so callers can log and skip.
pub fn expand(template: &str, vars: &HashMap<String, String>) -> Result<String, TemplateError> {
    let mut invalid = false;

    let expanded = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        if caps.get(1).is_some() {
            return "$".to_string();
        }
        if let Some(name) = caps.get(2).or_else(|| caps.get(3)) {
            return match vars.get(name.as_str()) {
                Some(value) => value.clone(),
                None => full_match(caps),
            };
        }
        invalid = true;
        full_match(caps)
    });

    if invalid {
        return Err(TemplateError::InvalidPlaceholder(template.to_string()));
    }
    Ok(expanded.into_owned())
}

fn full_match(caps: &Captures<'_>) -> String {
    caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expand_braced_and_bare() {
        let v = vars(&[("CMD", "go build")]);
        assert_eq!(expand("${CMD}", &v).expect("expand"), "go build");
        assert_eq!(expand("run: $CMD now", &v).expect("expand"), "run: go build now");
    }

    #[test]
    fn test_unknown_placeholders_pass_through() {
        let v = vars(&[("CMD", "ls")]);
        assert_eq!(
            expand("echo ${HOME_DIR} and $OTHER", &v).expect("expand"),
            "echo ${HOME_DIR} and $OTHER"
        );
    }

    #[test]
    fn test_dollar_escape() {
        let v = vars(&[]);
        assert_eq!(expand("cost: $$5", &v).expect("expand"), "cost: $5");
    }

    #[test]
    fn test_trailing_dollar_is_untouched() {
        let v = vars(&[]);
        assert_eq!(expand("done$", &v).expect("expand"), "done$");
        assert_eq!(expand("a $ b", &v).expect("expand"), "a $ b");
    }

    #[test]
    fn test_unterminated_brace_is_an_error_not_a_panic() {
        let v = vars(&[("CMD", "ls")]);
        assert!(matches!(
            expand("echo ${CMD", &v),
            Err(TemplateError::InvalidPlaceholder(_))
        ));
        assert!(expand("echo ${}", &v).is_err());
    }

    #[test]
    fn test_substituted_value_is_not_re_expanded() {
        let v = vars(&[("CMD", "echo $HOME")]);
        assert_eq!(expand("${CMD}", &v).expect("expand"), "echo $HOME");
    }
}
