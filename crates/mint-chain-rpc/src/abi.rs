//! Just enough of the contract ABI for `getTotalNFTsMinted()`,
//! `makeAnEpicNFT()` and the `NewEpicNFTMinted` event.

use mint_api_types::{Address, MintEvent, TokenId, decode_hex, to_hex};
use mint_chain_client::{ProviderError, ProviderResult};
use serde::Deserialize;

/// keccak256("getTotalNFTsMinted()")[..4]
pub const TOTAL_MINTED_SELECTOR: [u8; 4] = [0xb4, 0xc3, 0xb8, 0xbe];

/// keccak256("makeAnEpicNFT()")[..4]
pub const MINT_SELECTOR: [u8; 4] = [0xde, 0x9d, 0x13, 0x2f];

/// keccak256("NewEpicNFTMinted(address,uint256)")
pub const MINT_EVENT_TOPIC: &str =
    "0xebb98688741ffa4c7589bf325de30cf7becb63de567842e1ccdb6cb949fdc82c";

const WORD: usize = 32;

/// Calldata for a zero-argument function.
pub fn call_data(selector: [u8; 4]) -> String {
    format!("0x{}", to_hex(&selector))
}

/// Decode a single `uint256` return value, rejecting values above `u64::MAX`.
pub fn decode_u64_word(data: &str) -> ProviderResult<u64> {
    let bytes = decode_hex(data)?;
    let word = first_word(&bytes, data)?;
    word_to_u64(&word, data)
}

/// A log entry as returned by `eth_getLogs`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLog {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    pub data: String,
    #[serde(default)]
    pub removed: bool,
}

/// Decode a `NewEpicNFTMinted` log. Neither parameter is indexed, so both
/// live in `data` as two consecutive words.
pub fn decode_mint_event(log: &RawLog) -> ProviderResult<MintEvent> {
    match log.topics.first() {
        Some(topic) if topic.eq_ignore_ascii_case(MINT_EVENT_TOPIC) => {}
        other => {
            return Err(ProviderError::Decode(format!(
                "unexpected event topic {other:?}"
            )));
        }
    }

    let bytes = decode_hex(&log.data)?;
    if bytes.len() < 2 * WORD {
        return Err(ProviderError::Decode(format!(
            "mint event data too short: {} bytes",
            bytes.len()
        )));
    }

    let mut sender = [0_u8; WORD];
    sender.copy_from_slice(&bytes[..WORD]);
    let mut token = [0_u8; WORD];
    token.copy_from_slice(&bytes[WORD..2 * WORD]);

    Ok(MintEvent {
        from: Address::from_word(&sender),
        token_id: TokenId(word_to_u64(&token, &log.data)?),
    })
}

fn first_word(bytes: &[u8], raw: &str) -> ProviderResult<[u8; WORD]> {
    if bytes.len() < WORD {
        return Err(ProviderError::Decode(format!("expected a 32-byte word, got {raw}")));
    }
    let mut word = [0_u8; WORD];
    word.copy_from_slice(&bytes[..WORD]);
    Ok(word)
}

fn word_to_u64(word: &[u8; WORD], raw: &str) -> ProviderResult<u64> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(ProviderError::Decode(format!("uint256 exceeds 64 bits: {raw}")));
    }
    let mut low = [0_u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(low))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(value: u64) -> String {
        format!("{value:064x}")
    }

    #[test]
    fn call_data_is_prefixed_selector() {
        assert_eq!(call_data(TOTAL_MINTED_SELECTOR), "0xb4c3b8be");
        assert_eq!(call_data(MINT_SELECTOR), "0xde9d132f");
    }

    #[test]
    fn decodes_total_minted_word() {
        assert_eq!(decode_u64_word(&format!("0x{}", word(17))).unwrap(), 17);
    }

    #[test]
    fn rejects_short_and_oversized_words() {
        assert!(decode_u64_word("0x").is_err());
        assert!(decode_u64_word("0x11").is_err());
        let huge = format!("0x01{}", "00".repeat(31));
        assert!(matches!(decode_u64_word(&huge), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn decodes_mint_event_log() {
        let log = RawLog {
            address: "0x5310b3dec733e56c64dc5319efe5df752d25bcab".to_owned(),
            topics: vec![MINT_EVENT_TOPIC.to_uppercase().replacen("0X", "0x", 1)],
            data: format!(
                "0x{}{}",
                format!("{:0>64}", "ab00000000000000000000000000000000000001"),
                word(7)
            ),
            removed: false,
        };
        let event = decode_mint_event(&log).unwrap();
        assert_eq!(event.from.as_str(), "0xab00000000000000000000000000000000000001");
        assert_eq!(event.token_id, TokenId(7));
    }

    #[test]
    fn rejects_foreign_topic() {
        let log = RawLog {
            address: String::new(),
            topics: vec![format!("0x{}", "00".repeat(32))],
            data: format!("0x{}{}", word(1), word(2)),
            removed: false,
        };
        assert!(decode_mint_event(&log).is_err());
    }
}
