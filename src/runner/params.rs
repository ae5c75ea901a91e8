//! Profile argument resolution
//!
//! Converts a profile's ordered argument map into the CLI token sequence
//! handed to the App, in two parallel renderings: `unmasked` for the
//! actual invocation and `masked` for anything printed. The two sequences
//! always line up position for position so a printed command can be
//! audited against the real one.
//!
//! Scalar values may reference process environment variables:
//! `$env.NAME` substitutes in the clear, `$envs.NAME` substitutes but is
//! replaced by a same-length `x` run in the masked rendering.

use serde_json::{Map, Value};
use std::env;

use crate::common::{Error, Result};

/// Character used when redacting secret-derived values
const MASK_CHAR: char = 'x';

/// Parallel CLI token sequences for one profile's arguments
#[derive(Debug, Default)]
pub struct ResolvedParams {
    /// Tokens passed to the spawned process
    pub unmasked: Vec<String>,
    /// Tokens used for display, secrets redacted and values quoted
    pub masked: Vec<String>,
}

/// Resolve an argument map into CLI tokens, in declared key order.
///
/// - `true` emits a bare `--key` flag; `false` emits nothing.
/// - Lists emit alternating `--key value` pairs per element.
/// - Objects are not expressible as CLI arguments and fail.
/// - Other scalars emit `--key value`, with env references substituted.
pub fn resolve(args: &Map<String, Value>, unmask: bool) -> Result<ResolvedParams> {
    let mut params = ResolvedParams::default();

    for (key, value) in args {
        let flag = format!("--{key}");
        match value {
            Value::Bool(true) => {
                params.unmasked.push(flag.clone());
                params.masked.push(flag);
            }
            Value::Bool(false) => {}
            Value::Array(items) => {
                for item in items {
                    let rendered = scalar_str(item);
                    params.unmasked.push(flag.clone());
                    params.masked.push(flag.clone());
                    params.unmasked.push(rendered.clone());
                    params.masked.push(quoted(&rendered));
                }
            }
            Value::Object(_) => {
                return Err(Error::UnsupportedParameterType(key.clone()));
            }
            _ => {
                let rendered = scalar_str(value);
                let (resolved, secret) = resolve_env_ref(&rendered);

                params.unmasked.push(flag.clone());
                params.masked.push(flag);
                params.unmasked.push(resolved.clone());
                if secret && !unmask {
                    let redacted: String =
                        std::iter::repeat(MASK_CHAR).take(resolved.chars().count()).collect();
                    params.masked.push(quoted(&redacted));
                } else {
                    params.masked.push(quoted(&resolved));
                }
            }
        }
    }

    Ok(params)
}

/// Substitute `$env.NAME` / `$envs.NAME` references.
///
/// Returns the resolved value and whether it came from a secret-tagged
/// reference. Unset variables leave the original token untouched.
fn resolve_env_ref(value: &str) -> (String, bool) {
    if let Some(name) = value.strip_prefix("$envs.") {
        (env::var(name).unwrap_or_else(|_| value.to_string()), true)
    } else if let Some(name) = value.strip_prefix("$env.") {
        (env::var(name).unwrap_or_else(|_| value.to_string()), false)
    } else {
        (value.to_string(), false)
    }
}

/// String form of a scalar JSON value, without JSON quoting for strings
fn scalar_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Quote display values containing whitespace or shell-special characters
fn quoted(value: &str) -> String {
    if value
        .chars()
        .any(|c| c.is_whitespace() || c == '!' || c == '-' || c == '$')
    {
        format!("'{value}'")
    } else {
        value.to_string()
    }
}
