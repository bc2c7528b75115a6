//! Scenario: approve → create → refresh against the paper chain
//!
//! GREEN when:
//! - `run_to_completion` drives the flow to `Created` with auto-mining;
//! - the boundary saw exactly approve, createRaindrop, then one details read;
//! - the escrow holds the raindrop with the scaled amount and schedule, and
//!   the approval allowance was consumed;
//! - amounts wider than 128 bits survive the whole round trip;
//! - a details fixture on disk loads into the same read model.

use std::time::Duration;

use rdx_execution::{format_units, CreatePhase, TOKEN_DECIMALS, U256};
use rdx_testkit::{create_form, load_details_json, PaperWorld, ESCROW, HOST, TOKEN};

#[tokio::test]
async fn happy_path_completes() {
    let world = PaperWorld::new();
    world.chain.set_auto_mine(true);
    let mut flow = world.create_flow();

    assert_eq!(flow.phase().label(), "Approve & Create Raindrop");
    flow.submit_prerequisite(&create_form("drop-1")).await.unwrap();
    let phase = flow.run_to_completion(Duration::from_millis(1)).await.unwrap();
    assert_eq!(phase, CreatePhase::Created);

    assert_eq!(world.client.writes(), vec!["approve", "createRaindrop"]);
    assert_eq!(world.client.read_count(), 1);

    let details = flow.details().unwrap();
    assert_eq!(details.host, HOST);
    assert_eq!(details.token, TOKEN);
    assert_eq!(format_units(details.total_amount, TOKEN_DECIMALS), "1000");
    assert_eq!(details.scheduled_at, 1_735_689_600);
    assert_eq!(world.chain.allowance(TOKEN, HOST, ESCROW), U256::ZERO);
}

#[tokio::test]
async fn amount_wider_than_u128_round_trips() {
    let world = PaperWorld::new();
    world.chain.set_auto_mine(true);
    let mut flow = world.create_flow();
    let mut form = create_form("whale");
    form.amount = "1000000000000000000000".into();

    flow.submit_prerequisite(&form).await.unwrap();
    let phase = flow.run_to_completion(Duration::from_millis(1)).await.unwrap();
    assert_eq!(phase, CreatePhase::Created);

    let details = flow.details().unwrap();
    assert!(details.total_amount > U256::from(u128::MAX));
    assert_eq!(
        format_units(details.total_amount, TOKEN_DECIMALS),
        "1000000000000000000000"
    );
}

#[tokio::test]
async fn duplicate_id_reverts_creation() {
    let world = PaperWorld::new();
    world.chain.set_auto_mine(true);

    let mut first = world.create_flow();
    first.submit_prerequisite(&create_form("drop-1")).await.unwrap();
    first.run_to_completion(Duration::from_millis(1)).await.unwrap();

    let mut second = world.create_flow();
    second.submit_prerequisite(&create_form("drop-1")).await.unwrap();
    let phase = second.run_to_completion(Duration::from_millis(1)).await.unwrap();
    assert_eq!(phase, CreatePhase::Failed);
    assert_eq!(
        second.creation().and_then(|h| h.failure.as_ref()).map(|f| f.message.as_str()),
        Some("transaction reverted")
    );
}

#[test]
fn details_fixture_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("details.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"host":"{HOST}","token":"{TOKEN}","total_amount":"0x5","scheduled_at":10,
               "executed":false,"cancelled":true,"participant_count":2}}"#
        ),
    )
    .unwrap();
    let d = load_details_json(path.to_str().unwrap()).unwrap();
    assert!(d.is_closed());
    assert_eq!(d.participant_count, 2);
}
