use rdx_execution::ContractCall;
use rdx_schemas::{Address, RaindropDetails, TxHash, U256};

/// Escrow-side record of one raindrop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaperRaindrop {
    pub host: Address,
    pub token: Address,
    pub total_amount: U256,
    pub scheduled_at: u64,
    pub executed: bool,
    pub cancelled: bool,
    pub participants: Vec<Address>,
}

impl PaperRaindrop {
    pub fn details(&self) -> RaindropDetails {
        RaindropDetails {
            host: self.host,
            token: self.token,
            total_amount: self.total_amount,
            scheduled_at: self.scheduled_at,
            executed: self.executed,
            cancelled: self.cancelled,
            participant_count: self.participants.len() as u64,
        }
    }
}

/// A broadcast transaction waiting for the next `mine()`.
#[derive(Clone, Debug)]
pub struct PendingTx {
    pub hash: TxHash,
    pub from: Address,
    pub call: ContractCall,
}

/// Why a mined transaction reverted. Kept for test assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Revert {
    UnknownFunction(&'static str),
    WrongContract,
    BadArguments,
    AlreadyExists,
    NotFound,
    ZeroAmount,
    InsufficientAllowance { allowance: U256, needed: U256 },
    NotHost,
    AlreadyExecuted,
    AlreadyCancelled,
    TooEarly { now: u64, scheduled_at: u64 },
}
