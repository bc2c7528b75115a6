//! Minimal contract ABI codec.
//!
//! Covers exactly the parameter kinds the escrow and token surfaces use:
//! `address`, `uint256`, `bool`, `string` and `address[]`. Encoding follows
//! the standard head/tail layout (static values inline, dynamic values as an
//! offset into the tail). Decoding handles static tuples only, which is all
//! the read surface returns.
//!
//! Integers are carried as full-width [`U256`] words.

use std::fmt;

use rdx_schemas::{Address, U256};
use sha3::{Digest, Keccak256};

const WORD: usize = 32;

/// Solidity parameter kinds understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    Address,
    Uint256,
    Bool,
    String,
    AddressArray,
}

impl AbiType {
    pub fn canonical(&self) -> &'static str {
        match self {
            AbiType::Address => "address",
            AbiType::Uint256 => "uint256",
            AbiType::Bool => "bool",
            AbiType::String => "string",
            AbiType::AddressArray => "address[]",
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, AbiType::String | AbiType::AddressArray)
    }
}

/// A typed argument or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    String(String),
    AddressArray(Vec<Address>),
}

impl AbiValue {
    /// Shorthand for small integers.
    pub fn uint(v: u64) -> Self {
        AbiValue::Uint(U256::from(v))
    }

    pub fn abi_type(&self) -> AbiType {
        match self {
            AbiValue::Address(_) => AbiType::Address,
            AbiValue::Uint(_) => AbiType::Uint256,
            AbiValue::Bool(_) => AbiType::Bool,
            AbiValue::String(_) => AbiType::String,
            AbiValue::AddressArray(_) => AbiType::AddressArray,
        }
    }
}

/// Static description of one contract function.
#[derive(Debug, PartialEq, Eq)]
pub struct AbiFunction {
    pub name: &'static str,
    pub inputs: &'static [AbiType],
    pub outputs: &'static [AbiType],
}

impl AbiFunction {
    /// `name(type1,type2,...)`
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.inputs.iter().map(AbiType::canonical).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// First four bytes of `keccak256(signature)`.
    pub fn selector(&self) -> [u8; 4] {
        let digest = keccak256(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    ArgumentCount { function: &'static str, expected: usize, got: usize },
    ArgumentType { function: &'static str, index: usize, expected: AbiType, got: AbiType },
    /// Decoding a dynamic output type is not supported.
    UnsupportedOutput { function: &'static str, ty: AbiType },
    ShortOutput { function: &'static str, expected: usize, got: usize },
    /// A returned word does not hold a valid value of the declared type.
    BadWord { function: &'static str, index: usize, ty: AbiType },
}

impl fmt::Display for AbiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiError::ArgumentCount { function, expected, got } => {
                write!(f, "{function}: expected {expected} arguments, got {got}")
            }
            AbiError::ArgumentType { function, index, expected, got } => write!(
                f,
                "{function}: argument {index} must be {}, got {}",
                expected.canonical(),
                got.canonical()
            ),
            AbiError::UnsupportedOutput { function, ty } => {
                write!(f, "{function}: cannot decode output of type {}", ty.canonical())
            }
            AbiError::ShortOutput { function, expected, got } => {
                write!(f, "{function}: expected {expected} bytes of output, got {got}")
            }
            AbiError::BadWord { function, index, ty } => {
                write!(f, "{function}: output {index} is not a valid {}", ty.canonical())
            }
        }
    }
}

impl std::error::Error for AbiError {}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Selector followed by the head/tail encoded arguments.
pub fn encode_call(function: &AbiFunction, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    if args.len() != function.inputs.len() {
        return Err(AbiError::ArgumentCount {
            function: function.name,
            expected: function.inputs.len(),
            got: args.len(),
        });
    }
    for (index, (arg, expected)) in args.iter().zip(function.inputs).enumerate() {
        if arg.abi_type() != *expected {
            return Err(AbiError::ArgumentType {
                function: function.name,
                index,
                expected: *expected,
                got: arg.abi_type(),
            });
        }
    }

    let mut out = function.selector().to_vec();
    out.extend(encode_args(args));
    Ok(out)
}

fn encode_args(args: &[AbiValue]) -> Vec<u8> {
    let mut head = Vec::with_capacity(args.len() * WORD);
    let mut tail = Vec::new();
    let head_len = args.len() * WORD;

    for arg in args {
        match arg {
            AbiValue::Address(a) => head.extend(address_word(a)),
            AbiValue::Uint(v) => head.extend(uint_word(*v)),
            AbiValue::Bool(b) => head.extend(uint_word(U256::from(u8::from(*b)))),
            AbiValue::String(s) => {
                head.extend(uint_word(U256::from(head_len + tail.len())));
                tail.extend(uint_word(U256::from(s.len())));
                tail.extend(s.as_bytes());
                pad_to_word(&mut tail);
            }
            AbiValue::AddressArray(items) => {
                head.extend(uint_word(U256::from(head_len + tail.len())));
                tail.extend(uint_word(U256::from(items.len())));
                for a in items {
                    tail.extend(address_word(a));
                }
            }
        }
    }

    head.extend(tail);
    head
}

/// Decode a static output tuple.
pub fn decode_output(function: &AbiFunction, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let expected = function.outputs.len() * WORD;
    if data.len() < expected {
        return Err(AbiError::ShortOutput {
            function: function.name,
            expected,
            got: data.len(),
        });
    }

    let mut values = Vec::with_capacity(function.outputs.len());
    for (index, ty) in function.outputs.iter().enumerate() {
        let word = &data[index * WORD..(index + 1) * WORD];
        let bad = || AbiError::BadWord {
            function: function.name,
            index,
            ty: *ty,
        };
        let value = match ty {
            AbiType::Address => {
                if word[..12].iter().any(|b| *b != 0) {
                    return Err(bad());
                }
                let mut bytes = [0u8; 20];
                bytes.copy_from_slice(&word[12..]);
                AbiValue::Address(Address::from_bytes(bytes))
            }
            AbiType::Uint256 => AbiValue::Uint(word_to_uint(word)),
            AbiType::Bool => {
                let v = word_to_uint(word);
                if v.is_zero() {
                    AbiValue::Bool(false)
                } else if v == U256::from(1u8) {
                    AbiValue::Bool(true)
                } else {
                    return Err(bad());
                }
            }
            AbiType::String | AbiType::AddressArray => {
                return Err(AbiError::UnsupportedOutput {
                    function: function.name,
                    ty: *ty,
                })
            }
        };
        values.push(value);
    }
    Ok(values)
}

fn uint_word(v: U256) -> [u8; WORD] {
    v.to_be_bytes::<WORD>()
}

fn address_word(a: &Address) -> [u8; WORD] {
    let mut w = [0u8; WORD];
    w[12..].copy_from_slice(a.as_bytes());
    w
}

fn word_to_uint(word: &[u8]) -> U256 {
    let mut w = [0u8; WORD];
    w.copy_from_slice(word);
    U256::from_be_bytes(w)
}

fn pad_to_word(buf: &mut Vec<u8>) {
    let rem = buf.len() % WORD;
    if rem != 0 {
        buf.resize(buf.len() + WORD - rem, 0);
    }
}
