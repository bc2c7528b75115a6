//! Fixed function descriptors for the token and escrow contracts, plus the
//! call builders the coordinators use.

use rdx_schemas::{Address, RaindropDetails, U256};

use crate::abi::{AbiFunction, AbiType, AbiValue};
use crate::contract::{ClientError, ContractCall};

pub static ERC20_APPROVE: AbiFunction = AbiFunction {
    name: "approve",
    inputs: &[AbiType::Address, AbiType::Uint256],
    outputs: &[AbiType::Bool],
};

pub static CREATE_RAINDROP: AbiFunction = AbiFunction {
    name: "createRaindrop",
    inputs: &[AbiType::String, AbiType::Address, AbiType::Uint256, AbiType::Uint256],
    outputs: &[],
};

/// Returns `(host, token, totalAmount, scheduledTime, executed, cancelled,
/// participantCount)`.
pub static GET_RAINDROP_DETAILS: AbiFunction = AbiFunction {
    name: "getRaindropDetails",
    inputs: &[AbiType::String],
    outputs: &[
        AbiType::Address,
        AbiType::Address,
        AbiType::Uint256,
        AbiType::Uint256,
        AbiType::Bool,
        AbiType::Bool,
        AbiType::Uint256,
    ],
};

pub static ADD_PARTICIPANTS: AbiFunction = AbiFunction {
    name: "addParticipants",
    inputs: &[AbiType::String, AbiType::AddressArray],
    outputs: &[],
};

pub static EXECUTE_RAINDROP: AbiFunction = AbiFunction {
    name: "executeRaindrop",
    inputs: &[AbiType::String],
    outputs: &[],
};

pub fn approve_call(token: Address, spender: Address, amount: U256) -> ContractCall {
    ContractCall::new(
        token,
        &ERC20_APPROVE,
        vec![AbiValue::Address(spender), AbiValue::Uint(amount)],
    )
}

pub fn create_call(
    escrow: Address,
    id: &str,
    token: Address,
    amount: U256,
    scheduled_at: u64,
) -> ContractCall {
    ContractCall::new(
        escrow,
        &CREATE_RAINDROP,
        vec![
            AbiValue::String(id.to_string()),
            AbiValue::Address(token),
            AbiValue::Uint(amount),
            AbiValue::uint(scheduled_at),
        ],
    )
}

pub fn details_call(escrow: Address, id: &str) -> ContractCall {
    ContractCall::new(
        escrow,
        &GET_RAINDROP_DETAILS,
        vec![AbiValue::String(id.to_string())],
    )
}

pub fn add_participants_call(escrow: Address, id: &str, participants: Vec<Address>) -> ContractCall {
    ContractCall::new(
        escrow,
        &ADD_PARTICIPANTS,
        vec![
            AbiValue::String(id.to_string()),
            AbiValue::AddressArray(participants),
        ],
    )
}

pub fn execute_call(escrow: Address, id: &str) -> ContractCall {
    ContractCall::new(
        escrow,
        &EXECUTE_RAINDROP,
        vec![AbiValue::String(id.to_string())],
    )
}

/// Map the positional details tuple onto the read model.
pub fn decode_details(values: &[AbiValue]) -> Result<RaindropDetails, ClientError> {
    match values {
        [AbiValue::Address(host), AbiValue::Address(token), AbiValue::Uint(total), AbiValue::Uint(at), AbiValue::Bool(executed), AbiValue::Bool(cancelled), AbiValue::Uint(count)] => {
            let scheduled_at = u64::try_from(*at)
                .map_err(|_| ClientError::Decode(format!("scheduled time {at} out of range")))?;
            let participant_count = u64::try_from(*count)
                .map_err(|_| ClientError::Decode(format!("participant count {count} out of range")))?;
            Ok(RaindropDetails {
                host: *host,
                token: *token,
                total_amount: *total,
                scheduled_at,
                executed: *executed,
                cancelled: *cancelled,
                participant_count,
            })
        }
        other => Err(ClientError::Decode(format!(
            "getRaindropDetails returned unexpected shape: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encode_call;

    #[test]
    fn approve_selector_is_the_erc20_one() {
        assert_eq!(hex::encode(ERC20_APPROVE.selector()), "095ea7b3");
    }

    #[test]
    fn signatures_are_canonical() {
        assert_eq!(
            CREATE_RAINDROP.signature(),
            "createRaindrop(string,address,uint256,uint256)"
        );
        assert_eq!(ADD_PARTICIPANTS.signature(), "addParticipants(string,address[])");
        assert_eq!(GET_RAINDROP_DETAILS.signature(), "getRaindropDetails(string)");
        assert_eq!(EXECUTE_RAINDROP.signature(), "executeRaindrop(string)");
    }

    #[test]
    fn builders_encode_cleanly() {
        let a = Address::from_bytes([7u8; 20]);
        for call in [
            approve_call(a, a, U256::from(1u8)),
            create_call(a, "drop", a, U256::from(1u8), 1_735_689_600),
            details_call(a, "drop"),
            add_participants_call(a, "drop", vec![a, a]),
            execute_call(a, "drop"),
        ] {
            assert!(encode_call(call.function, &call.args).is_ok(), "{}", call.function.name);
        }
    }

    #[test]
    fn details_decode_maps_positions() {
        let host = Address::from_bytes([1u8; 20]);
        let token = Address::from_bytes([2u8; 20]);
        let d = decode_details(&[
            AbiValue::Address(host),
            AbiValue::Address(token),
            AbiValue::uint(500),
            AbiValue::uint(1_735_689_600),
            AbiValue::Bool(false),
            AbiValue::Bool(true),
            AbiValue::uint(3),
        ])
        .unwrap();
        assert_eq!(d.host, host);
        assert_eq!(d.token, token);
        assert_eq!(d.total_amount, U256::from(500u16));
        assert_eq!(d.scheduled_at, 1_735_689_600);
        assert!(!d.executed && d.cancelled);
        assert_eq!(d.participant_count, 3);
    }

    #[test]
    fn details_total_above_u128_is_readable() {
        let a = Address::from_bytes([1u8; 20]);
        let total = U256::from(u128::MAX) + U256::from(1u8);
        let d = decode_details(&[
            AbiValue::Address(a),
            AbiValue::Address(a),
            AbiValue::Uint(total),
            AbiValue::uint(1),
            AbiValue::Bool(false),
            AbiValue::Bool(false),
            AbiValue::uint(0),
        ])
        .unwrap();
        assert_eq!(d.total_amount, total);

        let too_late = decode_details(&[
            AbiValue::Address(a),
            AbiValue::Address(a),
            AbiValue::Uint(total),
            AbiValue::Uint(total),
            AbiValue::Bool(false),
            AbiValue::Bool(false),
            AbiValue::uint(0),
        ]);
        assert!(matches!(too_late, Err(ClientError::Decode(_))));
    }

    #[test]
    fn details_decode_rejects_wrong_shape() {
        assert!(matches!(
            decode_details(&[AbiValue::Bool(true)]),
            Err(ClientError::Decode(_))
        ));
    }
}
