//! Secret references in `config.toml`.
//!
//! Credential values may point outside the file:
//!
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - `pass::path/in/store` runs `pass show path/in/store` and keeps the first line
//! - anything else is the secret itself

use std::fmt;
use std::process::Command;

const ENV_PREFIX: &str = "env::";
const PASS_PREFIX: &str = "pass::";
const MASK: &str = "********";

/// Why a secret reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// The referenced environment variable is unset or not unicode.
    MissingEnv(String),
    /// `pass` could not be run or did not produce a secret.
    Pass { path: String, reason: String },
    /// The reference resolved to an empty string.
    Empty,
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEnv(var) => write!(f, "environment variable `{}` is not set", var),
            Self::Pass { path, reason } => write!(f, "`pass show {}` failed: {}", path, reason),
            Self::Empty => write!(f, "secret is empty"),
        }
    }
}

impl std::error::Error for SecretError {}

/// Resolves a value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    let resolved = if let Some(var) = value.strip_prefix(ENV_PREFIX) {
        std::env::var(var).map_err(|_| SecretError::MissingEnv(var.to_string()))?
    } else if let Some(path) = value.strip_prefix(PASS_PREFIX) {
        pass_show(path)?
    } else {
        value.to_string()
    };

    if resolved.trim().is_empty() {
        return Err(SecretError::Empty);
    }
    Ok(resolved)
}

/// Returns true if `value` points at a secret instead of containing it.
pub fn is_reference(value: &str) -> bool {
    value.starts_with(ENV_PREFIX) || value.starts_with(PASS_PREFIX)
}

/// Masks plain-text secrets for display; references are shown as written.
pub fn redact(value: &str) -> String {
    if is_reference(value) || value.is_empty() {
        value.to_string()
    } else {
        MASK.to_string()
    }
}

fn pass_show(path: &str) -> Result<String, SecretError> {
    let failed = |reason: String| SecretError::Pass {
        path: path.to_string(),
        reason,
    };

    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| failed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(failed(format!("exit {}: {}", output.status, stderr.trim())));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| failed("no output".to_string()))
}
