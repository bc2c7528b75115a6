//! Command handler modules for rdx-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod create;
pub mod manage;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use rdx_config::secrets::resolve_secrets;
use rdx_config::ClientConfig;
use rdx_execution::{format_units, TxHandle, WalletSession, TOKEN_DECIMALS};
use rdx_rpc::{RpcClient, NODE_CONNECTOR_ID};
use rdx_schemas::{Address, RaindropDetails};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// A loaded config plus the node adapter built from it.
pub struct Client {
    pub config: ClientConfig,
    pub rpc: Arc<RpcClient>,
}

impl Client {
    /// Load layered config, resolve secrets and build the RPC adapter.
    /// Nothing touches the network here.
    pub fn load(config_paths: &[String]) -> Result<Self> {
        let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
        let loaded = rdx_config::load_layered_yaml(&path_refs)?;
        let config = ClientConfig::from_config_json(&loaded.config_json)?;
        let secrets = resolve_secrets(&loaded.config_json)?;
        let endpoint = config.rpc_endpoint(&secrets)?;

        tracing::debug!(
            network = %config.network.name,
            chain_id = config.network.chain_id,
            config_hash = %loaded.config_hash,
            "config loaded"
        );

        let rpc = Arc::new(RpcClient::new(endpoint, config.network.chain_id));
        Ok(Self { config, rpc })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.confirmation.poll_interval_ms)
    }

    /// Connect the node's first account.
    pub async fn connect(&self) -> Result<Address> {
        self.rpc
            .connect(NODE_CONNECTOR_ID)
            .await
            .with_context(|| format!("wallet connect failed on {}", self.config.network.name))
    }

    /// Print a `<label>_tx=<hash>` line, with the explorer link when configured.
    pub fn print_tx(&self, handle: &TxHandle) {
        let Some(hash) = handle.hash else {
            return;
        };
        let hash = hash.to_string();
        match self.config.explorer_link(&hash) {
            Some(link) => {
                tracing::info!(slot = handle.label, explorer = %link, "transaction link");
                println!("{}_tx={} explorer={}", handle.label, hash, link)
            }
            None => println!("{}_tx={}", handle.label, hash),
        }
    }
}

pub fn config_hash(paths: &[String]) -> Result<()> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = rdx_config::load_layered_yaml(&path_refs)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

pub async fn account(config_paths: &[String]) -> Result<()> {
    let client = Client::load(config_paths)?;
    for c in client.rpc.connectors() {
        println!("connector id={} name={}", c.id, c.name);
    }
    let account = client.connect().await?;
    println!("network={} chain_id={}", client.config.network.name, client.rpc.chain_id());
    println!("account={} full={}", account.short(), account);
    Ok(())
}

pub fn print_details(id: &str, d: &RaindropDetails) {
    println!("id={id}");
    println!("host={} full={}", d.host.short(), d.host);
    println!("token={}", d.token);
    println!("total_amount={}", format_units(d.total_amount, TOKEN_DECIMALS));
    match i64::try_from(d.scheduled_at)
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
    {
        Some(at) => println!("scheduled_at={} ({})", d.scheduled_at, at.to_rfc3339()),
        None => println!("scheduled_at={}", d.scheduled_at),
    }
    println!("participants={}", d.participant_count);
    println!("status={}", d.status().label());
}
