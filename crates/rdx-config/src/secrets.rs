//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"RAINDROP_RPC_API_KEY"`).
//! - At startup, callers invoke [`resolve_secrets`] once and pass the result
//!   into constructors; never scatter `std::env::var` calls across the code.
//! - `Debug` on [`ResolvedSecrets`] **redacts** values.
//! - Error messages reference the env var **NAME**, never the value.
//!
//! The RPC API key is required only when `network.rpc_url` contains the
//! `{api_key}` placeholder. A public endpoint needs no key.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::API_KEY_PLACEHOLDER;

/// Default env var consulted when the config names none.
pub const DEFAULT_RPC_API_KEY_ENV: &str = "RAINDROP_RPC_API_KEY";

/// All runtime-resolved secrets for one client process.
///
/// **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct ResolvedSecrets {
    /// RPC provider API key. `None` if the named env var was absent or empty.
    pub rpc_api_key: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "rpc_api_key",
                &self.rpc_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Read a non-empty string value at `pointer` from a JSON config.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Resolve a named environment variable; blank counts as unset.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve secrets named by the loaded config.
///
/// # Errors
/// `SECRETS_MISSING` (naming the env var) when the RPC URL carries the
/// `{api_key}` placeholder and the key is not set.
pub fn resolve_secrets(config_json: &Value) -> Result<ResolvedSecrets> {
    let key_var = read_str_at(config_json, "/network/rpc_api_key_env")
        .unwrap_or_else(|| DEFAULT_RPC_API_KEY_ENV.to_string());
    let needs_key = read_str_at(config_json, "/network/rpc_url")
        .map(|u| u.contains(API_KEY_PLACEHOLDER))
        .unwrap_or(false);

    let rpc_api_key = resolve_env(&key_var);

    if needs_key && rpc_api_key.is_none() {
        bail!(
            "SECRETS_MISSING: required env var '{}' (rpc api key) is not set or empty. \
             Add it to your environment or .env.local",
            key_var,
        );
    }

    Ok(ResolvedSecrets { rpc_api_key })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sentinel names are never set in any environment, so no env mutation is needed.
    #[test]
    fn placeholder_url_requires_key() {
        let cfg = serde_json::json!({
            "network": {
                "rpc_url": "https://rpc.example/{api_key}",
                "rpc_api_key_env": "RDX_SENTINEL_RPC_KEY_MISSING_1"
            }
        });
        let err = resolve_secrets(&cfg).unwrap_err().to_string();
        assert!(err.contains("SECRETS_MISSING"));
        assert!(err.contains("RDX_SENTINEL_RPC_KEY_MISSING_1"));
    }

    #[test]
    fn public_url_needs_no_key() {
        let cfg = serde_json::json!({
            "network": {
                "rpc_url": "http://127.0.0.1:8545",
                "rpc_api_key_env": "RDX_SENTINEL_RPC_KEY_MISSING_2"
            }
        });
        let s = resolve_secrets(&cfg).unwrap();
        assert!(s.rpc_api_key.is_none());
    }

    #[test]
    fn debug_is_redacted() {
        let s = ResolvedSecrets {
            rpc_api_key: Some("super-secret-value".to_string()),
        };
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("super-secret-value"));
        assert!(dbg.contains("<REDACTED>"));
    }
}
