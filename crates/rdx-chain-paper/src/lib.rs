//! Deterministic in-memory "paper" chain.
//!
//! Implements [`ContractClient`] and [`WalletSession`] over a token allowance
//! table and a minimal escrow, so coordinators can be exercised end to end
//! without a node.
//!
//! Design decisions (kept intentionally simple/deterministic):
//! - Transaction hashes are `keccak256("paper:tx:" ++ nonce)`. No randomness.
//! - Writes are queued; nothing is included until [`PaperChain::mine`] runs,
//!   unless auto-mining is switched on.
//! - Block time only moves through [`PaperChain::set_time`].
//! - Token balances are not modelled; `createRaindrop` consumes allowance.
//! - Unknown ids read back as an all-zero record, like the real escrow.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rdx_execution::abi::{keccak256, AbiValue};
use rdx_execution::surface::{
    ADD_PARTICIPANTS, CREATE_RAINDROP, ERC20_APPROVE, EXECUTE_RAINDROP, GET_RAINDROP_DETAILS,
};
use rdx_execution::{ClientError, Connector, ContractCall, ContractClient, ReceiptStatus, WalletSession};
use rdx_schemas::{Address, RaindropDetails, TxHash, U256};

pub mod types;

use types::{PaperRaindrop, PendingTx, Revert};

pub const PAPER_CONNECTOR_ID: &str = "paper";

/// Message returned when a scripted wallet rejection fires.
pub const USER_REJECTED: &str = "User rejected the request.";

#[derive(Debug, Default)]
struct ChainState {
    now: u64,
    nonce: u64,
    auto_mine: bool,
    reject_next_write: bool,
    fail_reads: bool,
    /// (token, owner, spender) → allowance
    allowances: BTreeMap<(Address, Address, Address), U256>,
    raindrops: BTreeMap<String, PaperRaindrop>,
    mempool: Vec<PendingTx>,
    receipts: BTreeMap<TxHash, ReceiptStatus>,
    reverts: BTreeMap<TxHash, Revert>,
}

#[derive(Debug)]
pub struct PaperChain {
    escrow: Address,
    wallet: Address,
    connected: Mutex<Option<Address>>,
    state: Mutex<ChainState>,
}

impl PaperChain {
    /// A chain with `escrow` deployed and `wallet` connected.
    pub fn new(escrow: Address, wallet: Address) -> Self {
        Self {
            escrow,
            wallet,
            connected: Mutex::new(Some(wallet)),
            state: Mutex::new(ChainState::default()),
        }
    }

    pub fn escrow(&self) -> Address {
        self.escrow
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn connected_slot(&self) -> MutexGuard<'_, Option<Address>> {
        self.connected.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Include every queued transaction at once, in submission order.
    pub fn set_auto_mine(&self, on: bool) {
        self.state().auto_mine = on;
    }

    /// The next write is refused as if the user dismissed the prompt.
    pub fn reject_next_write(&self) {
        self.state().reject_next_write = true;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    pub fn set_time(&self, now: u64) {
        self.state().now = now;
    }

    pub fn pending_count(&self) -> usize {
        self.state().mempool.len()
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn raindrop(&self, id: &str) -> Option<PaperRaindrop> {
        self.state().raindrops.get(id).cloned()
    }

    pub fn revert_reason(&self, hash: TxHash) -> Option<Revert> {
        self.state().reverts.get(&hash).cloned()
    }

    /// Seed a raindrop directly, bypassing the approve/create path.
    pub fn insert_raindrop(&self, id: &str, raindrop: PaperRaindrop) {
        self.state().raindrops.insert(id.to_string(), raindrop);
    }

    /// Mark a raindrop cancelled. The escrow's own cancel path is outside
    /// the client surface, so tests flip the flag directly.
    pub fn cancel_raindrop(&self, id: &str) -> bool {
        match self.state().raindrops.get_mut(id) {
            Some(r) => {
                r.cancelled = true;
                true
            }
            None => false,
        }
    }

    /// Include all queued transactions. Returns how many were mined.
    pub fn mine(&self) -> usize {
        let mut st = self.state();
        mine_locked(&mut st, self.escrow)
    }

    /// Include only the oldest queued transaction.
    pub fn mine_one(&self) -> bool {
        let mut st = self.state();
        if st.mempool.is_empty() {
            return false;
        }
        let tx = st.mempool.remove(0);
        include(&mut st, self.escrow, tx);
        true
    }
}

fn mine_locked(st: &mut ChainState, escrow: Address) -> usize {
    let batch: Vec<PendingTx> = st.mempool.drain(..).collect();
    let n = batch.len();
    for tx in batch {
        include(st, escrow, tx);
    }
    n
}

fn include(st: &mut ChainState, escrow: Address, tx: PendingTx) {
    let status = match execute(st, escrow, &tx) {
        Ok(()) => ReceiptStatus::Success,
        Err(reason) => {
            tracing::debug!(hash = %tx.hash, ?reason, "paper tx reverted");
            st.reverts.insert(tx.hash, reason);
            ReceiptStatus::Reverted
        }
    };
    tracing::debug!(hash = %tx.hash, function = tx.call.function.name, ?status, "paper tx mined");
    st.receipts.insert(tx.hash, status);
}

fn execute(st: &mut ChainState, escrow: Address, tx: &PendingTx) -> Result<(), Revert> {
    let call = &tx.call;
    let f = call.function;

    if f == &ERC20_APPROVE {
        let [AbiValue::Address(spender), AbiValue::Uint(amount)] = call.args.as_slice() else {
            return Err(Revert::BadArguments);
        };
        st.allowances.insert((call.to, tx.from, *spender), *amount);
        return Ok(());
    }

    if call.to != escrow {
        return Err(Revert::WrongContract);
    }

    if f == &CREATE_RAINDROP {
        let [AbiValue::String(id), AbiValue::Address(token), AbiValue::Uint(amount), AbiValue::Uint(at)] =
            call.args.as_slice()
        else {
            return Err(Revert::BadArguments);
        };
        if st.raindrops.contains_key(id) {
            return Err(Revert::AlreadyExists);
        }
        if amount.is_zero() {
            return Err(Revert::ZeroAmount);
        }
        let key = (*token, tx.from, escrow);
        let allowance = st.allowances.get(&key).copied().unwrap_or(U256::ZERO);
        if allowance < *amount {
            return Err(Revert::InsufficientAllowance {
                allowance,
                needed: *amount,
            });
        }
        let scheduled_at = u64::try_from(*at).map_err(|_| Revert::BadArguments)?;
        st.allowances.insert(key, allowance - *amount);
        st.raindrops.insert(
            id.clone(),
            PaperRaindrop {
                host: tx.from,
                token: *token,
                total_amount: *amount,
                scheduled_at,
                executed: false,
                cancelled: false,
                participants: Vec::new(),
            },
        );
        return Ok(());
    }

    if f == &ADD_PARTICIPANTS {
        let [AbiValue::String(id), AbiValue::AddressArray(list)] = call.args.as_slice() else {
            return Err(Revert::BadArguments);
        };
        let r = open_raindrop(st, id, tx.from)?;
        r.participants.extend(list.iter().copied());
        return Ok(());
    }

    if f == &EXECUTE_RAINDROP {
        let [AbiValue::String(id)] = call.args.as_slice() else {
            return Err(Revert::BadArguments);
        };
        let now = st.now;
        let r = open_raindrop(st, id, tx.from)?;
        if now < r.scheduled_at {
            return Err(Revert::TooEarly {
                now,
                scheduled_at: r.scheduled_at,
            });
        }
        r.executed = true;
        return Ok(());
    }

    Err(Revert::UnknownFunction(f.name))
}

fn open_raindrop<'a>(
    st: &'a mut ChainState,
    id: &str,
    from: Address,
) -> Result<&'a mut PaperRaindrop, Revert> {
    let r = st.raindrops.get_mut(id).ok_or(Revert::NotFound)?;
    if r.host != from {
        return Err(Revert::NotHost);
    }
    if r.executed {
        return Err(Revert::AlreadyExecuted);
    }
    if r.cancelled {
        return Err(Revert::AlreadyCancelled);
    }
    Ok(r)
}

fn details_values(d: &RaindropDetails) -> Vec<AbiValue> {
    vec![
        AbiValue::Address(d.host),
        AbiValue::Address(d.token),
        AbiValue::Uint(d.total_amount),
        AbiValue::uint(d.scheduled_at),
        AbiValue::Bool(d.executed),
        AbiValue::Bool(d.cancelled),
        AbiValue::uint(d.participant_count),
    ]
}

fn empty_details() -> RaindropDetails {
    RaindropDetails {
        host: Address::ZERO,
        token: Address::ZERO,
        total_amount: U256::ZERO,
        scheduled_at: 0,
        executed: false,
        cancelled: false,
        participant_count: 0,
    }
}

#[async_trait]
impl ContractClient for PaperChain {
    async fn write(&self, from: Address, call: &ContractCall) -> Result<TxHash, ClientError> {
        // Same guard a node applies before signing.
        call.calldata()
            .map_err(|e| ClientError::Rpc(format!("invalid calldata: {e}")))?;

        let mut st = self.state();
        if std::mem::take(&mut st.reject_next_write) {
            return Err(ClientError::WalletRejected(USER_REJECTED.to_string()));
        }

        st.nonce += 1;
        let mut seed = b"paper:tx:".to_vec();
        seed.extend(st.nonce.to_be_bytes());
        let hash = TxHash::from_bytes(keccak256(&seed));

        st.mempool.push(PendingTx {
            hash,
            from,
            call: call.clone(),
        });
        st.receipts.insert(hash, ReceiptStatus::Pending);
        if st.auto_mine {
            mine_locked(&mut st, self.escrow);
        }
        Ok(hash)
    }

    async fn read(&self, call: &ContractCall) -> Result<Vec<AbiValue>, ClientError> {
        let st = self.state();
        if st.fail_reads {
            return Err(ClientError::Rpc("paper chain: reads unavailable".to_string()));
        }
        if call.function != &GET_RAINDROP_DETAILS || call.to != self.escrow {
            return Err(ClientError::Rpc(format!(
                "paper chain: no view {} at {}",
                call.function.name, call.to
            )));
        }
        let [AbiValue::String(id)] = call.args.as_slice() else {
            return Err(ClientError::Rpc("paper chain: bad arguments".to_string()));
        };
        let details = st
            .raindrops
            .get(id)
            .map(PaperRaindrop::details)
            .unwrap_or_else(empty_details);
        Ok(details_values(&details))
    }

    async fn receipt(&self, hash: TxHash) -> Result<ReceiptStatus, ClientError> {
        self.state()
            .receipts
            .get(&hash)
            .copied()
            .ok_or_else(|| ClientError::Rpc(format!("paper chain: unknown transaction {hash}")))
    }
}

#[async_trait]
impl WalletSession for PaperChain {
    fn account(&self) -> Option<Address> {
        *self.connected_slot()
    }

    fn connectors(&self) -> Vec<Connector> {
        vec![Connector {
            id: PAPER_CONNECTOR_ID.to_string(),
            name: "Paper Wallet".to_string(),
        }]
    }

    async fn connect(&self, connector_id: &str) -> Result<Address, ClientError> {
        if connector_id != PAPER_CONNECTOR_ID {
            return Err(ClientError::Rpc(format!("unknown connector '{connector_id}'")));
        }
        *self.connected_slot() = Some(self.wallet);
        Ok(self.wallet)
    }

    async fn disconnect(&self) {
        *self.connected_slot() = None;
    }
}
