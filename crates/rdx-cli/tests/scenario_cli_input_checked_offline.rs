//! Scenario: bad CLI input is refused before any node is contacted.
//!
//! The config points at a closed local port, so any network attempt would
//! surface as a connect error instead of the expected validation message.
//!
//! GREEN when:
//! - a malformed token or a non-numeric amount fails with INPUT_INVALID;
//! - an empty id fails the same way for the manage commands;
//! - an RPC URL needing an unset API key fails with SECRETS_MISSING.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const OFFLINE_YAML: &str = r#"
network:
  name: "offline"
  chain_id: 31337
  rpc_url: "http://127.0.0.1:9"
contracts:
  escrow: "0x00000000000000000000000000000000000000e5"
schedule:
  timezone: "UTC"
"#;

fn workspace(yaml: &str) -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.yaml");
    std::fs::write(&path, yaml).unwrap();
    let path = path.to_string_lossy().to_string();
    (dir, path)
}

fn raindrop(cwd: &Path, config: &str) -> Command {
    let mut cmd = Command::cargo_bin("raindrop").unwrap();
    // Keep a developer's .env.local out of the picture.
    cmd.current_dir(cwd).arg("--config").arg(config);
    cmd
}

#[test]
fn malformed_token_is_rejected_offline() {
    let (dir, cfg) = workspace(OFFLINE_YAML);
    raindrop(dir.path(), &cfg)
        .args([
            "create",
            "--id",
            "drop-1",
            "--token",
            "0xnot-an-address",
            "--amount",
            "1000",
            "--at",
            "2025-01-01T00:00",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("INPUT_INVALID"))
        .stderr(predicate::str::contains("token"))
        .stderr(predicate::str::contains("connect").not());
}

#[test]
fn non_numeric_amount_is_rejected_offline() {
    let (dir, cfg) = workspace(OFFLINE_YAML);
    raindrop(dir.path(), &cfg)
        .args([
            "create",
            "--id",
            "drop-1",
            "--token",
            "0x00000000000000000000000000000000000000aa",
            "--amount",
            "lots",
            "--at",
            "2025-01-01T00:00",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("INPUT_INVALID"))
        .stderr(predicate::str::contains("lots"));
}

#[test]
fn empty_id_is_rejected_for_manage_commands() {
    let (dir, cfg) = workspace(OFFLINE_YAML);
    for args in [
        vec!["details", "--id", ""],
        vec!["execute", "--id", ""],
        vec!["add-participants", "--id", "", "--addresses", "0xabc"],
    ] {
        raindrop(dir.path(), &cfg)
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("INPUT_INVALID"));
    }
}

#[test]
fn missing_api_key_fails_at_startup() {
    let yaml = r#"
network:
  name: "keyed"
  chain_id: 8453
  rpc_url: "https://rpc.example/v2/{api_key}"
  rpc_api_key_env: "RDX_CLI_SENTINEL_KEY_NEVER_SET"
contracts:
  escrow: "0x00000000000000000000000000000000000000e5"
"#;
    let (dir, cfg) = workspace(yaml);
    raindrop(dir.path(), &cfg)
        .env_remove("RDX_CLI_SENTINEL_KEY_NEVER_SET")
        .args(["details", "--id", "drop-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SECRETS_MISSING"))
        .stderr(predicate::str::contains("RDX_CLI_SENTINEL_KEY_NEVER_SET"));
}
