//! Scenario: createRaindrop calldata layout
//!
//! GREEN when:
//! - the selector is derived from the canonical signature;
//! - the dynamic id is referenced by offset and carried in the tail;
//! - token, amount and schedule sit inline in the head.

use rdx_execution::abi::keccak256;
use rdx_execution::surface::{create_call, CREATE_RAINDROP};
use rdx_schemas::{Address, U256};

fn word(data: &[u8], i: usize) -> &[u8] {
    &data[4 + i * 32..4 + (i + 1) * 32]
}

fn uint(data: &[u8], i: usize) -> U256 {
    U256::from_be_bytes::<32>(word(data, i).try_into().unwrap())
}

fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64.pow(18))
}

#[test]
fn create_raindrop_head_and_tail() {
    let escrow = Address::from_bytes([0xee; 20]);
    let token = Address::from_bytes([0x22; 20]);
    let id = "a-raindrop-id-longer-than-thirty-two-bytes";

    let call = create_call(escrow, id, token, tokens(5), 1_735_689_600);
    assert_eq!(call.to, escrow);
    let data = call.calldata().unwrap();

    let sig = keccak256(b"createRaindrop(string,address,uint256,uint256)");
    assert_eq!(&data[..4], &sig[..4]);
    assert_eq!(CREATE_RAINDROP.selector(), [sig[0], sig[1], sig[2], sig[3]]);

    assert_eq!(uint(&data, 0), U256::from(4u8 * 32));
    assert_eq!(&word(&data, 1)[12..], token.as_bytes());
    assert_eq!(uint(&data, 2), tokens(5));
    assert_eq!(uint(&data, 3), U256::from(1_735_689_600u64));

    // Tail: length, then the id padded to two words.
    assert_eq!(uint(&data, 4), U256::from(id.len()));
    let tail = &data[4 + 5 * 32..];
    assert_eq!(tail.len(), 64);
    assert_eq!(&tail[..id.len()], id.as_bytes());
    assert!(tail[id.len()..].iter().all(|b| *b == 0));
}

#[test]
fn amount_above_u128_fills_the_whole_word() {
    let escrow = Address::from_bytes([0xee; 20]);
    let token = Address::from_bytes([0x22; 20]);
    // 1e21 tokens: more base units than u128 can hold.
    let amount = tokens(1_000_000_000_000_000_000) * U256::from(1000u16);

    let data = create_call(escrow, "big", token, amount, 1).calldata().unwrap();
    assert!(word(&data, 2)[..16].iter().any(|b| *b != 0));
    assert_eq!(uint(&data, 2), amount);
}
