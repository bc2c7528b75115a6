//! Shared value types for the Raindrop client.
//!
//! Everything here is plain data: 20-byte account addresses, 32-byte
//! transaction hashes and the details read model returned by the escrow.
//! Checksum validation and amount parsing live in `rdx-execution`.
//!
//! Token amounts are full `uint256` values ([`U256`]).

use std::fmt;
use std::str::FromStr;

pub use ruint::aliases::U256;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or contract address.
///
/// Rendered as `0x` + 40 lowercase hex characters. Structural parsing only;
/// EIP-55 checksum enforcement is a validation concern.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse `0x` + 40 hex characters (any case).
    pub fn from_hex(s: &str) -> Result<Self, HexParseError> {
        let bytes = decode_prefixed::<20>(s)?;
        Ok(Address(bytes))
    }

    /// Shortened display form used in account badges: `0x1234...abcd`.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl TryFrom<String> for Address {
    type Error = HexParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Address::from_hex(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.to_string()
    }
}

// ---------------------------------------------------------------------------
// TxHash
// ---------------------------------------------------------------------------

/// A 32-byte transaction hash as returned by the wallet after signing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        TxHash(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, HexParseError> {
        let bytes = decode_prefixed::<32>(s)?;
        Ok(TxHash(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl TryFrom<String> for TxHash {
    type Error = HexParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        TxHash::from_hex(&s)
    }
}

impl From<TxHash> for String {
    fn from(h: TxHash) -> String {
        h.to_string()
    }
}

// ---------------------------------------------------------------------------
// HexParseError
// ---------------------------------------------------------------------------

/// Structural parse failure for a `0x`-prefixed fixed-width hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HexParseError {
    MissingPrefix,
    WrongLength { expected: usize, got: usize },
    InvalidHex,
}

impl fmt::Display for HexParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexParseError::MissingPrefix => write!(f, "hex value must start with 0x"),
            HexParseError::WrongLength { expected, got } => {
                write!(f, "expected {expected} hex characters, got {got}")
            }
            HexParseError::InvalidHex => write!(f, "value contains non-hex characters"),
        }
    }
}

impl std::error::Error for HexParseError {}

fn decode_prefixed<const N: usize>(s: &str) -> Result<[u8; N], HexParseError> {
    let body = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(HexParseError::MissingPrefix)?;
    if body.len() != N * 2 {
        return Err(HexParseError::WrongLength {
            expected: N * 2,
            got: body.len(),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(body, &mut out).map_err(|_| HexParseError::InvalidHex)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Raindrop read model
// ---------------------------------------------------------------------------

/// Lifecycle status derived from the executed/cancelled flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaindropStatus {
    Pending,
    Executed,
    Cancelled,
}

impl RaindropStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RaindropStatus::Pending => "Pending",
            RaindropStatus::Executed => "Executed",
            RaindropStatus::Cancelled => "Cancelled",
        }
    }
}

/// Snapshot of `getRaindropDetails(id)`.
///
/// Stale as soon as any write for the same id confirms; callers refresh
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaindropDetails {
    pub host: Address,
    pub token: Address,
    /// Total amount in token base units (18 decimals assumed).
    pub total_amount: U256,
    /// Scheduled execution time, Unix seconds.
    pub scheduled_at: u64,
    pub executed: bool,
    pub cancelled: bool,
    pub participant_count: u64,
}

impl RaindropDetails {
    /// Executed takes precedence over cancelled.
    pub fn status(&self) -> RaindropStatus {
        if self.executed {
            RaindropStatus::Executed
        } else if self.cancelled {
            RaindropStatus::Cancelled
        } else {
            RaindropStatus::Pending
        }
    }

    /// True once no further writes are accepted for this raindrop.
    pub fn is_closed(&self) -> bool {
        self.executed || self.cancelled
    }

    /// The contract returns an all-zero record for unknown ids.
    pub fn is_empty(&self) -> bool {
        self.host == Address::ZERO
    }
}
