//! Scenario: layered config hash is stable.
//!
//! GREEN when:
//! - Loading the same YAML twice yields the same hash.
//! - Key order inside the YAML does not change the hash.
//! - Different values produce different hashes.
//! - Overlays take effect and merge deterministically.

use rdx_config::{load_layered_yaml, load_layered_yaml_from_strings, ClientConfig};

const BASE_YAML: &str = r#"
network:
  name: "base"
  chain_id: 8453
  rpc_url: "https://base-mainnet.g.alchemy.com/v2/{api_key}"
  rpc_api_key_env: "RAINDROP_RPC_API_KEY"
  explorer_tx_url: "https://basescan.org/tx/"
contracts:
  escrow: "0x00000000000000000000000000000000000000e5"
confirmation:
  poll_interval_ms: 1000
"#;

const BASE_YAML_REORDERED: &str = r#"
confirmation:
  poll_interval_ms: 1000
contracts:
  escrow: "0x00000000000000000000000000000000000000e5"
network:
  explorer_tx_url: "https://basescan.org/tx/"
  rpc_api_key_env: "RAINDROP_RPC_API_KEY"
  rpc_url: "https://base-mainnet.g.alchemy.com/v2/{api_key}"
  chain_id: 8453
  name: "base"
"#;

const SEPOLIA_OVERLAY: &str = r#"
network:
  name: "sepolia"
  chain_id: 11155111
  rpc_url: "https://eth-sepolia.g.alchemy.com/v2/{api_key}"
  explorer_tx_url: "https://sepolia.etherscan.io/tx/"
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(
        original.config_hash, reordered.config_hash,
        "reordering keys in YAML must not change the hash"
    );
}

#[test]
fn different_values_produce_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, "confirmation:\n  poll_interval_ms: 2000\n"])
        .unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_switches_network_and_keeps_base_keys() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML, SEPOLIA_OVERLAY]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, SEPOLIA_OVERLAY]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);

    let cfg = ClientConfig::from_config_json(&a.config_json).unwrap();
    assert_eq!(cfg.network.name, "sepolia");
    assert_eq!(cfg.network.chain_id, 11_155_111);
    // Not overridden by the overlay.
    assert_eq!(
        cfg.network.rpc_api_key_env.as_deref(),
        Some("RAINDROP_RPC_API_KEY")
    );
    assert_eq!(cfg.confirmation.poll_interval_ms, 1000);
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn files_load_in_merge_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let overlay = dir.path().join("sepolia.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&overlay, SEPOLIA_OVERLAY).unwrap();

    let base_s = base.to_string_lossy().to_string();
    let overlay_s = overlay.to_string_lossy().to_string();

    let from_files = load_layered_yaml(&[base_s.as_str(), overlay_s.as_str()]).unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE_YAML, SEPOLIA_OVERLAY]).unwrap();
    assert_eq!(from_files.config_hash, from_strings.config_hash);

    let missing = dir.path().join("missing.yaml");
    let missing_s = missing.to_string_lossy().to_string();
    let err = load_layered_yaml(&[missing_s.as_str()]).unwrap_err();
    assert!(err.to_string().contains("failed to read yaml path"));
}
