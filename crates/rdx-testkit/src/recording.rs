//! Call-recording wrapper around any [`ContractClient`].
//!
//! Scenario tests assert on what reached the chain boundary (how many
//! writes, to which function, how many reads) without caring which backend
//! answered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rdx_execution::abi::AbiValue;
use rdx_execution::{ClientError, ContractCall, ContractClient, ReceiptStatus};
use rdx_schemas::{Address, TxHash};

/// One call observed at the boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded {
    Write {
        from: Address,
        function: &'static str,
        args: Vec<AbiValue>,
    },
    Read {
        function: &'static str,
    },
    Receipt {
        hash: TxHash,
    },
}

pub struct RecordingClient {
    inner: Arc<dyn ContractClient>,
    log: Mutex<Vec<Recorded>>,
    stall_writes: AtomicBool,
}

impl RecordingClient {
    pub fn new(inner: Arc<dyn ContractClient>) -> Self {
        Self {
            inner,
            log: Mutex::new(Vec::new()),
            stall_writes: AtomicBool::new(false),
        }
    }

    fn log(&self) -> MutexGuard<'_, Vec<Recorded>> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// While set, `write` never resolves: the wallet prompt is left open.
    pub fn stall_writes(&self, stall: bool) {
        self.stall_writes.store(stall, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.log().clone()
    }

    /// Function names of all writes, in order.
    pub fn writes(&self) -> Vec<&'static str> {
        self.log()
            .iter()
            .filter_map(|r| match r {
                Recorded::Write { function, .. } => Some(*function),
                _ => None,
            })
            .collect()
    }

    pub fn write_count(&self, function: &str) -> usize {
        self.writes().iter().filter(|f| **f == function).count()
    }

    pub fn read_count(&self) -> usize {
        self.log()
            .iter()
            .filter(|r| matches!(r, Recorded::Read { .. }))
            .count()
    }

    /// Writes plus reads; receipt lookups excluded.
    pub fn network_calls(&self) -> usize {
        self.log()
            .iter()
            .filter(|r| !matches!(r, Recorded::Receipt { .. }))
            .count()
    }

    pub fn last_write_args(&self) -> Option<Vec<AbiValue>> {
        self.log().iter().rev().find_map(|r| match r {
            Recorded::Write { args, .. } => Some(args.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl ContractClient for RecordingClient {
    async fn write(&self, from: Address, call: &ContractCall) -> Result<TxHash, ClientError> {
        self.log().push(Recorded::Write {
            from,
            function: call.function.name,
            args: call.args.clone(),
        });
        if self.stall_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.write(from, call).await
    }

    async fn read(&self, call: &ContractCall) -> Result<Vec<AbiValue>, ClientError> {
        self.log().push(Recorded::Read {
            function: call.function.name,
        });
        self.inner.read(call).await
    }

    async fn receipt(&self, hash: TxHash) -> Result<ReceiptStatus, ClientError> {
        self.log().push(Recorded::Receipt { hash });
        self.inner.receipt(hash).await
    }
}
