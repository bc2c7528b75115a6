//! In-crate test double: accepts every write, confirms every receipt and
//! answers details reads from a settable flag pair.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rdx_schemas::{Address, TxHash};

use crate::abi::AbiValue;
use crate::contract::{ClientError, Connector, ContractCall, ContractClient, ReceiptStatus, WalletSession};

#[derive(Default)]
pub(crate) struct FakeChain {
    account: Option<Address>,
    dropped: AtomicBool,
    writes: Mutex<Vec<ContractCall>>,
    reads: AtomicUsize,
    executed: AtomicBool,
    cancelled: AtomicBool,
    fail_reads: AtomicBool,
}

impl FakeChain {
    pub(crate) fn connected() -> Self {
        Self {
            account: Some(Address::from_bytes([0x11; 20])),
            ..Self::default()
        }
    }

    pub(crate) fn writes(&self) -> Vec<ContractCall> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn set_flags(&self, executed: bool, cancelled: bool) {
        self.executed.store(executed, Ordering::SeqCst);
        self.cancelled.store(cancelled, Ordering::SeqCst);
    }

    /// Simulate the wallet dropping its session between writes.
    pub(crate) fn drop_session(&self) {
        self.dropped.store(true, Ordering::SeqCst);
    }

    pub(crate) fn restore_session(&self) {
        self.dropped.store(false, Ordering::SeqCst);
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContractClient for FakeChain {
    async fn write(&self, _from: Address, call: &ContractCall) -> Result<TxHash, ClientError> {
        let mut writes = self.writes.lock().unwrap();
        writes.push(call.clone());
        Ok(TxHash::from_bytes([writes.len() as u8; 32]))
    }

    async fn read(&self, _call: &ContractCall) -> Result<Vec<AbiValue>, ClientError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClientError::Rpc("connection refused".into()));
        }
        Ok(vec![
            AbiValue::Address(Address::from_bytes([0x11; 20])),
            AbiValue::Address(Address::from_bytes([0x22; 20])),
            AbiValue::uint(1000),
            AbiValue::uint(1_735_689_600),
            AbiValue::Bool(self.executed.load(Ordering::SeqCst)),
            AbiValue::Bool(self.cancelled.load(Ordering::SeqCst)),
            AbiValue::uint(0),
        ])
    }

    async fn receipt(&self, _hash: TxHash) -> Result<ReceiptStatus, ClientError> {
        Ok(ReceiptStatus::Success)
    }
}

#[async_trait]
impl WalletSession for FakeChain {
    fn account(&self) -> Option<Address> {
        if self.dropped.load(Ordering::SeqCst) {
            return None;
        }
        self.account
    }

    fn connectors(&self) -> Vec<Connector> {
        vec![Connector {
            id: "fake".into(),
            name: "Fake".into(),
        }]
    }

    async fn connect(&self, _connector_id: &str) -> Result<Address, ClientError> {
        self.account.ok_or(ClientError::NotConnected)
    }

    async fn disconnect(&self) {}
}
