//! Scenario: creation is only ever issued from a confirmed approval
//!
//! # Invariants under test
//!
//! 1. For any sequence of approval receipts, `createRaindrop` writes never
//!    exceed approval confirmations, and equal one only after confirmation.
//! 2. A reverted approval never produces a creation.
//! 3. The creation carries exactly the amount that was approved.
//! 4. Against the paper chain, polling before the approval is mined does not
//!    create; mining it does, exactly once.

use rdx_execution::abi::AbiValue;
use rdx_execution::{CreatePhase, ReceiptStatus, U256};
use rdx_testkit::{create_form, PaperWorld, ESCROW};

const P: ReceiptStatus = ReceiptStatus::Pending;
const S: ReceiptStatus = ReceiptStatus::Success;
const R: ReceiptStatus = ReceiptStatus::Reverted;

#[tokio::test]
async fn every_receipt_interleaving_respects_the_gate() {
    let sequences: &[&[ReceiptStatus]] = &[
        &[],
        &[P],
        &[P, P, P],
        &[S],
        &[P, S],
        &[S, S],
        &[P, S, S, S],
        &[R],
        &[P, R],
    ];

    for seq in sequences {
        let world = PaperWorld::new();
        let mut flow = world.create_flow();
        flow.submit_prerequisite(&create_form("drop-1")).await.unwrap();

        let mut confirmed = false;
        for status in seq.iter() {
            // Edges after a terminal revert are illegal transitions; stop there.
            if flow.on_prerequisite_receipt(*status).await.is_err() {
                break;
            }
            confirmed |= *status == S;
            let creates = world.client.write_count("createRaindrop");
            assert!(creates <= usize::from(confirmed), "{seq:?}");
        }

        let creates = world.client.write_count("createRaindrop");
        assert_eq!(creates, usize::from(confirmed), "{seq:?}");
        if seq.contains(&R) {
            assert_eq!(flow.phase(), CreatePhase::Failed);
        }
    }
}

#[tokio::test]
async fn creation_uses_the_approved_amount() {
    let world = PaperWorld::new();
    let mut flow = world.create_flow();
    let mut form = create_form("drop-1");
    form.amount = "12.5".into();
    flow.submit_prerequisite(&form).await.unwrap();

    let approve_args = world.client.last_write_args().unwrap();
    assert_eq!(approve_args[0], AbiValue::Address(ESCROW));
    assert_eq!(approve_args[1], AbiValue::Uint(U256::from(12_500_000_000_000_000_000u128)));

    flow.on_prerequisite_receipt(ReceiptStatus::Success).await.unwrap();
    let create_args = world.client.last_write_args().unwrap();
    assert_eq!(create_args[0], AbiValue::String("drop-1".into()));
    assert_eq!(create_args[2], approve_args[1]);
    assert_eq!(create_args[3], AbiValue::uint(1_735_689_600));
}

#[tokio::test]
async fn polling_paper_chain_creates_once_after_mining() {
    let world = PaperWorld::new();
    let mut flow = world.create_flow();
    flow.submit_prerequisite(&create_form("drop-1")).await.unwrap();

    for _ in 0..3 {
        flow.poll().await.unwrap();
    }
    assert_eq!(world.client.write_count("createRaindrop"), 0);
    assert_eq!(flow.phase(), CreatePhase::ConfirmingApproval);

    world.chain.mine();
    flow.poll().await.unwrap();
    assert_eq!(world.client.write_count("createRaindrop"), 1);
    assert_eq!(flow.phase(), CreatePhase::Finalizing);

    // The creation is still queued; further polls must not create again.
    flow.poll().await.unwrap();
    flow.poll().await.unwrap();
    assert_eq!(world.client.write_count("createRaindrop"), 1);

    world.chain.mine();
    flow.poll().await.unwrap();
    assert_eq!(flow.phase(), CreatePhase::Created);
    assert!(world.chain.raindrop("drop-1").is_some());
}
