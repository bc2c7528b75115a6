//! Scenario: malformed create input never reaches the network
//!
//! GREEN when:
//! - a malformed token address is refused with a validation error;
//! - a non-numeric, zero, negative or over-precise amount is refused;
//! - an unparseable schedule is refused;
//! - in every case the boundary saw no write and no read, and the flow is
//!   still `Ready`.

use rdx_execution::{CoordinatorError, CreatePhase, ValidationError};
use rdx_testkit::{create_form, PaperWorld};

#[tokio::test]
async fn malformed_fields_fail_locally() {
    let world = PaperWorld::new();
    let mut flow = world.create_flow();

    let mut cases = Vec::new();
    for token in ["", "0x12", "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed", "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"] {
        let mut f = create_form("drop-1");
        f.token = token.to_string();
        cases.push(f);
    }
    for amount in ["", "abc", "0", "-5", "1e3", "0.0000000000000000001"] {
        let mut f = create_form("drop-1");
        f.amount = amount.to_string();
        cases.push(f);
    }
    for at in ["", "next friday", "2025-13-01T00:00"] {
        let mut f = create_form("drop-1");
        f.scheduled_at = at.to_string();
        cases.push(f);
    }

    for form in &cases {
        let err = flow.submit_prerequisite(form).await.unwrap_err();
        assert!(
            matches!(err, CoordinatorError::Validation(_)),
            "{form:?} gave {err:?}"
        );
        assert_eq!(flow.phase(), CreatePhase::Ready);
    }

    assert_eq!(world.client.network_calls(), 0);
    assert_eq!(world.chain.pending_count(), 0);
}

#[tokio::test]
async fn address_error_names_the_field() {
    let world = PaperWorld::new();
    let mut flow = world.create_flow();
    let mut f = create_form("drop-1");
    f.token = "0xnot-an-address".into();

    match flow.submit_prerequisite(&f).await {
        Err(CoordinatorError::Validation(ValidationError::InvalidAddress { field, raw })) => {
            assert_eq!(field, "token");
            assert_eq!(raw, "0xnot-an-address");
        }
        other => panic!("expected invalid address, got {other:?}"),
    }
    assert!(world.client.calls().is_empty());
}
