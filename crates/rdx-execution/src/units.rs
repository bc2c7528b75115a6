//! Decimal amount ↔ token base units.
//!
//! User-entered amounts are decimal strings scaled by `10^decimals` into an
//! exact `uint256`. No floating point is involved at any step; inputs with more
//! fractional digits than the token supports are rejected rather than rounded.

use std::fmt;

use rdx_schemas::U256;

/// Decimal places assumed for every token handled by the client.
pub const TOKEN_DECIMALS: u32 = 18;

/// Reasons a decimal amount string could not be scaled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    /// Not a plain decimal number (signs other than a leading `+`, exponents,
    /// separators, letters).
    Invalid { raw: String },
    /// Zero or negative.
    NotPositive { raw: String },
    /// More fractional digits than `decimals`; would require rounding.
    TooManyDecimalPlaces { raw: String, max: u32 },
    /// Scaled value does not fit in `uint256`.
    Overflow { raw: String },
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => write!(f, "amount is required"),
            AmountError::Invalid { raw } => write!(f, "amount '{raw}' is not a decimal number"),
            AmountError::NotPositive { raw } => write!(f, "amount '{raw}' must be greater than zero"),
            AmountError::TooManyDecimalPlaces { raw, max } => {
                write!(f, "amount '{raw}' has more than {max} decimal places")
            }
            AmountError::Overflow { raw } => write!(f, "amount '{raw}' is too large"),
        }
    }
}

impl std::error::Error for AmountError {}

/// Scale a decimal string into base units: `"1.5"` with 18 decimals is
/// `1_500_000_000_000_000_000`.
///
/// Surrounding whitespace and a single leading `+` are accepted. `".5"` and
/// `"5."` are accepted. The result is always strictly positive.
pub fn parse_units(s: &str, decimals: u32) -> Result<U256, AmountError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    let invalid = || AmountError::Invalid { raw: s.to_string() };

    if let Some(rest) = s.strip_prefix('-') {
        // Well-formed negatives get the more useful message.
        return if is_decimal(rest) {
            Err(AmountError::NotPositive { raw: s.to_string() })
        } else {
            Err(invalid())
        };
    }
    let body = s.strip_prefix('+').unwrap_or(s);
    if !is_decimal(body) {
        return Err(invalid());
    }

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };

    if frac_part.len() > decimals as usize {
        return Err(AmountError::TooManyDecimalPlaces {
            raw: s.to_string(),
            max: decimals,
        });
    }

    // Fractional part padded to exactly `decimals` digits; the concatenation
    // is the scaled value.
    let mut digits = String::with_capacity(int_part.len() + decimals as usize);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    for _ in frac_part.len()..decimals as usize {
        digits.push('0');
    }

    let overflow = || AmountError::Overflow { raw: s.to_string() };
    let value = digits
        .bytes()
        .try_fold(U256::ZERO, |acc, b| {
            acc.checked_mul(U256::from(10u8))?
                .checked_add(U256::from(b - b'0'))
        })
        .ok_or_else(overflow)?;

    if value.is_zero() {
        return Err(AmountError::NotPositive { raw: s.to_string() });
    }
    Ok(value)
}

/// Render base units as a minimal decimal string (`1500000000000000000` →
/// `"1.5"`). Trailing fractional zeros and a bare trailing dot are dropped.
pub fn format_units(value: U256, decimals: u32) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac}")
    }
}

/// Digits with at most one dot and at least one digit overall.
fn is_decimal(s: &str) -> bool {
    let mut dots = 0;
    let mut digits = 0;
    for c in s.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    dots <= 1 && digits > 0
}
