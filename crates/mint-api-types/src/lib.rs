use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing 0x prefix: {0}")]
    MissingPrefix(String),
    #[error("invalid hex digit in {0}")]
    InvalidHex(String),
    #[error("expected {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("quantity does not fit in 64 bits: {0}")]
    Overflow(String),
}

/// A 20-byte account or contract address, normalized to lowercase `0x` hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let digits = strip_prefix(raw)?;
        check_hex(raw, digits, 40)?;
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Address held in the low 20 bytes of a 32-byte ABI word.
    pub fn from_word(word: &[u8; 32]) -> Self {
        Self(format!("0x{}", to_hex(&word[12..])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric chain identifier. Providers report it as a hex quantity (`"0x4"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    pub fn from_hex(raw: &str) -> Result<Self, ParseError> {
        parse_quantity(raw).map(Self)
    }

    pub fn to_hex(self) -> String {
        format!("0x{:x}", self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 32-byte transaction hash in lowercase `0x` hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let digits = strip_prefix(raw)?;
        check_hex(raw, digits, 64)?;
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TxHash {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TxHash::parse(&value)
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `NewEpicNFTMinted(address sender, uint256 tokenId)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintEvent {
    pub from: Address,
    pub token_id: TokenId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Confirmed,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub status: TxStatus,
}

/// Parse an Ethereum JSON-RPC hex quantity (`"0x1a"`) into a `u64`.
pub fn parse_quantity(raw: &str) -> Result<u64, ParseError> {
    let digits = strip_prefix(raw)?;
    if digits.is_empty() {
        return Err(ParseError::InvalidLength {
            expected: 1,
            actual: 0,
        });
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidHex(raw.to_owned()));
    }
    let significant = digits.trim_start_matches('0');
    if significant.len() > 16 {
        return Err(ParseError::Overflow(raw.to_owned()));
    }
    if significant.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(significant, 16).map_err(|_| ParseError::InvalidHex(raw.to_owned()))
}

/// Decode `0x`-prefixed hex into bytes.
pub fn decode_hex(raw: &str) -> Result<Vec<u8>, ParseError> {
    let digits = strip_prefix(raw)?;
    if digits.len() % 2 != 0 {
        return Err(ParseError::InvalidLength {
            expected: digits.len() + 1,
            actual: digits.len(),
        });
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = hex_value(pair[0]).ok_or_else(|| ParseError::InvalidHex(raw.to_owned()))?;
            let lo = hex_value(pair[1]).ok_or_else(|| ParseError::InvalidHex(raw.to_owned()))?;
            Ok((hi << 4) | lo)
        })
        .collect()
}

pub fn to_hex(input: &[u8]) -> String {
    let mut output = String::with_capacity(input.len() * 2);
    for byte in input {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn strip_prefix(raw: &str) -> Result<&str, ParseError> {
    raw.strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| ParseError::MissingPrefix(raw.to_owned()))
}

fn check_hex(raw: &str, digits: &str, expected: usize) -> Result<(), ParseError> {
    if digits.len() != expected {
        return Err(ParseError::InvalidLength {
            expected,
            actual: digits.len(),
        });
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidHex(raw.to_owned()));
    }
    Ok(())
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
