//! Input validation: addresses, identifiers, participant lists and schedule
//! timestamps. Everything here is pure and runs before any wallet or network
//! interaction.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use rdx_schemas::Address;

use crate::abi::keccak256;
use crate::units::AmountError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyId,
    InvalidAddress { field: &'static str, raw: String },
    Amount(AmountError),
    InvalidSchedule { raw: String, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyId => write!(f, "raindrop id is required"),
            ValidationError::InvalidAddress { field, raw } => {
                write!(f, "{field}: '{raw}' is not a valid address")
            }
            ValidationError::Amount(e) => write!(f, "{e}"),
            ValidationError::InvalidSchedule { raw, reason } => {
                write!(f, "scheduled time '{raw}': {reason}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<AmountError> for ValidationError {
    fn from(e: AmountError) -> Self {
        ValidationError::Amount(e)
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// EIP-55 mixed-case rendering of an address.
pub fn checksum_address(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> if i % 2 == 0 { 4 } else { 0 }) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `0x` + 40 hex characters. All-lowercase input is accepted as-is; any
/// uppercase letter means the string must match its EIP-55 checksum exactly.
pub fn is_address(s: &str) -> bool {
    let Some(body) = s.strip_prefix("0x") else {
        return false;
    };
    if body.len() != 40 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return false;
    }
    if !body.bytes().any(|b| b.is_ascii_uppercase()) {
        return true;
    }
    match Address::from_hex(s) {
        Ok(a) => checksum_address(&a) == s,
        Err(_) => false,
    }
}

/// Validate and parse one address field. Surrounding whitespace is ignored.
pub fn parse_address(field: &'static str, raw: &str) -> Result<Address, ValidationError> {
    let s = raw.trim();
    let invalid = || ValidationError::InvalidAddress {
        field,
        raw: raw.to_string(),
    };
    if !is_address(s) {
        return Err(invalid());
    }
    Address::from_hex(s).map_err(|_| invalid())
}

/// Split free text on whitespace and commas, keeping only valid addresses in
/// their original order. Invalid tokens are dropped silently; an empty result
/// is the caller's signal to refuse the action.
pub fn parse_participants(raw: &str) -> Vec<Address> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .filter(|t| is_address(t))
        .filter_map(|t| Address::from_hex(t).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// The id is an opaque key kept byte-for-byte. Only the empty string is
/// refused; whitespace is a legitimate (if odd) key.
pub fn validate_id(raw: &str) -> Result<String, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    Ok(raw.to_string())
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Zone used to interpret schedule input that carries no offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleZone {
    /// The host's local zone.
    Local,
    Named(Tz),
}

impl ScheduleZone {
    pub fn from_config(zone: Option<Tz>) -> Self {
        zone.map(ScheduleZone::Named).unwrap_or(ScheduleZone::Local)
    }

    pub fn timestamp(&self, raw: &str) -> Result<u64, ValidationError> {
        match self {
            ScheduleZone::Local => scheduled_timestamp(raw, &Local),
            ScheduleZone::Named(tz) => scheduled_timestamp(raw, tz),
        }
    }
}

const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Convert a calendar date-time into Unix seconds.
///
/// Input with an explicit offset (RFC 3339) is taken at face value. Otherwise
/// it is a wall-clock time in `zone`: a time skipped by a DST gap is an error
/// and an ambiguous time resolves to the earlier instant. Sub-second parts
/// are floored. Instants before the epoch are refused.
pub fn scheduled_timestamp<Z: TimeZone>(raw: &str, zone: &Z) -> Result<u64, ValidationError> {
    let s = raw.trim();
    let err = |reason: &str| ValidationError::InvalidSchedule {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };
    if s.is_empty() {
        return Err(err("required"));
    }

    let millis = if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        dt.timestamp_millis()
    } else {
        let naive = LOCAL_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .ok_or_else(|| err("expected YYYY-MM-DDTHH:MM[:SS]"))?;
        zone.from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| err("local time does not exist in this time zone"))?
            .timestamp_millis()
    };

    let secs = millis.div_euclid(1000);
    u64::try_from(secs).map_err(|_| err("before 1970-01-01T00:00:00Z"))
}
