//! Chain access seams.
//!
//! [`ContractClient`] is the only path from the coordinators to the chain:
//! signed writes, read-only calls and receipt lookups. [`WalletSession`]
//! owns the connected account. Both are object-safe and async so the JSON-RPC
//! adapter and the in-memory paper chain can be swapped behind `Arc<dyn _>`.

use std::fmt;

use async_trait::async_trait;
use rdx_schemas::{Address, TxHash};

use crate::abi::{encode_call, AbiError, AbiFunction, AbiValue};

// ---------------------------------------------------------------------------
// Call / receipt types
// ---------------------------------------------------------------------------

/// A fully-typed contract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub function: &'static AbiFunction,
    pub args: Vec<AbiValue>,
}

impl ContractCall {
    pub fn new(to: Address, function: &'static AbiFunction, args: Vec<AbiValue>) -> Self {
        Self { to, function, args }
    }

    pub fn calldata(&self) -> Result<Vec<u8>, AbiError> {
        encode_call(self.function, &self.args)
    }
}

/// Inclusion status of a broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Not yet mined.
    Pending,
    Success,
    Reverted,
}

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The account holder declined to sign.
    WalletRejected(String),
    /// Transport, node or provider failure.
    Rpc(String),
    /// The node answered but the payload could not be interpreted.
    Decode(String),
    /// No account is connected.
    NotConnected,
}

impl ClientError {
    pub fn is_wallet_rejection(&self) -> bool {
        matches!(self, ClientError::WalletRejected(_))
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::WalletRejected(m) => write!(f, "wallet rejected the request: {m}"),
            ClientError::Rpc(m) => write!(f, "rpc error: {m}"),
            ClientError::Decode(m) => write!(f, "decode error: {m}"),
            ClientError::NotConnected => write!(f, "no wallet account connected"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<AbiError> for ClientError {
    fn from(e: AbiError) -> Self {
        ClientError::Decode(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Contract read/write access.
///
/// `write` resolves once the transaction is signed and broadcast; inclusion
/// is observed separately through `receipt`.
#[async_trait]
pub trait ContractClient: Send + Sync {
    async fn write(&self, from: Address, call: &ContractCall) -> Result<TxHash, ClientError>;

    async fn read(&self, call: &ContractCall) -> Result<Vec<AbiValue>, ClientError>;

    async fn receipt(&self, hash: TxHash) -> Result<ReceiptStatus, ClientError>;
}

/// A selectable wallet connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub id: String,
    pub name: String,
}

/// Connected-account ownership.
#[async_trait]
pub trait WalletSession: Send + Sync {
    /// The connected account, if any.
    fn account(&self) -> Option<Address>;

    fn connectors(&self) -> Vec<Connector>;

    async fn connect(&self, connector_id: &str) -> Result<Address, ClientError>;

    async fn disconnect(&self);
}
