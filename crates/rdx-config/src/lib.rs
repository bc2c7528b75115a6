//! Layered client configuration.
//!
//! YAML documents are deep-merged in order (earlier = base, later = override),
//! converted to JSON, checked for literal secrets and hashed over their
//! canonical JSON form. The merged JSON is then read into a typed
//! [`ClientConfig`].
//!
//! Secrets never live in YAML. The config stores env var NAMES; see
//! [`secrets`] for resolution.

pub mod secrets;

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use rdx_schemas::Address;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// Known secret-like prefixes. A leaf string starting with one of these aborts
/// loading with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
];

/// Placeholder substituted with the resolved RPC API key.
pub const API_KEY_PLACEHOLDER: &str = "{api_key}";

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

// ---------------------------------------------------------------------------
// Loading + hashing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document deserializes to Null; treat it as "no overrides".
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default Map is ordered by key, so serialization is stable
    // regardless of the key order in the source YAML.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            if prefix.is_empty() {
                // A scalar root has pointer "" in RFC 6901.
                out.push(String::new());
            } else {
                out.push(prefix.to_string());
            }
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

/// Network selection. Static for the life of the process.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    /// JSON-RPC endpoint. May contain `{api_key}`.
    pub rpc_url: String,
    /// NAME of the env var holding the RPC API key.
    #[serde(default)]
    pub rpc_api_key_env: Option<String>,
    /// Block explorer prefix for transaction links, e.g. `https://basescan.org/tx/`.
    #[serde(default)]
    pub explorer_tx_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    pub escrow: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleConfig {
    /// IANA zone for scheduled date-times. Host local zone when absent.
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Typed client configuration read from the merged JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl ClientConfig {
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let cfg: ClientConfig = serde_json::from_value(config_json.clone())
            .context("config does not match the client schema")?;
        if cfg.confirmation.poll_interval_ms == 0 {
            bail!("CONFIG_INVALID: confirmation.poll_interval_ms must be > 0");
        }
        if cfg.network.rpc_url.contains(API_KEY_PLACEHOLDER)
            && cfg.network.rpc_api_key_env.is_none()
        {
            bail!(
                "CONFIG_INVALID: network.rpc_url contains {} but network.rpc_api_key_env is not set",
                API_KEY_PLACEHOLDER
            );
        }
        // Surface a bad zone at load time rather than at first use.
        cfg.schedule_zone()?;
        Ok(cfg)
    }

    /// Parsed schedule zone; `None` means the host local zone.
    pub fn schedule_zone(&self) -> Result<Option<Tz>> {
        match self.schedule.timezone.as_deref() {
            None => Ok(None),
            Some(name) => name
                .parse::<Tz>()
                .map(Some)
                .map_err(|e| anyhow::anyhow!("CONFIG_INVALID: schedule.timezone '{name}': {e}")),
        }
    }

    /// RPC endpoint with the API key substituted.
    ///
    /// Never log the returned string; it may carry the key.
    pub fn rpc_endpoint(&self, secrets: &secrets::ResolvedSecrets) -> Result<String> {
        let url = &self.network.rpc_url;
        if !url.contains(API_KEY_PLACEHOLDER) {
            return Ok(url.clone());
        }
        match secrets.rpc_api_key.as_deref() {
            Some(key) => Ok(url.replace(API_KEY_PLACEHOLDER, key)),
            None => bail!(
                "SECRETS_MISSING: network.rpc_url requires an API key but '{}' is not set",
                self.network.rpc_api_key_env.as_deref().unwrap_or("<unset>")
            ),
        }
    }

    /// Explorer link for a transaction, when an explorer is configured.
    pub fn explorer_link(&self, tx_hash: &str) -> Option<String> {
        self.network
            .explorer_tx_url
            .as_deref()
            .map(|base| format!("{}{}", base, tx_hash))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
