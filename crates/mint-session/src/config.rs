//! Immutable client configuration.
//!
//! Defaults describe the deployed Rinkeby collection. Builds can override the
//! deployment-specific values through `MINT_*` environment variables read at
//! compile time (see [`MintConfig::from_build_env`]).

use mint_api_types::{Address, ChainId};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5310b3DeC733e56c64dC5319EFe5Df752d25bCab";
pub const DEFAULT_COLLECTION_CAP: u64 = 50;
/// Rinkeby.
pub const DEFAULT_CHAIN_ID: ChainId = ChainId(4);

/// What to do when the wallet reports an unexpected chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkPolicy {
    /// Warn the user, then carry on as if the network matched.
    #[default]
    WarnOnly,
    /// Warn the user and keep minting disabled until the network matches.
    Gate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("collection cap must be greater than zero")]
    ZeroCap,
    #[error("{0} must not be empty")]
    EmptyUrl(&'static str),
    #[error("{0} poll interval must be greater than zero")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MintConfig {
    pub contract_address: Address,
    pub expected_chain_id: ChainId,
    pub network_name: String,
    pub collection_cap: u64,
    pub marketplace_asset_base: String,
    pub collection_url: String,
    pub explorer_tx_base: String,
    pub twitter_handle: String,
    pub network_policy: NetworkPolicy,
    /// Refuse a second mint while one is still submitting or pending.
    pub guard_concurrent_mints: bool,
    pub confirmation_poll_ms: u64,
    pub event_poll_ms: u64,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            contract_address: default_contract_address(),
            expected_chain_id: DEFAULT_CHAIN_ID,
            network_name: "Rinkeby Test Network".to_owned(),
            collection_cap: DEFAULT_COLLECTION_CAP,
            marketplace_asset_base: "https://testnets.opensea.io/assets".to_owned(),
            collection_url: "https://testnets.opensea.io/collection/squarenft-h1twir3gia"
                .to_owned(),
            explorer_tx_base: "https://rinkeby.etherscan.io/tx".to_owned(),
            twitter_handle: "_buildspace".to_owned(),
            network_policy: NetworkPolicy::WarnOnly,
            guard_concurrent_mints: true,
            confirmation_poll_ms: 2_000,
            event_poll_ms: 4_000,
        }
    }
}

fn default_contract_address() -> Address {
    match Address::parse(DEFAULT_CONTRACT_ADDRESS) {
        Ok(address) => address,
        Err(err) => unreachable!("built-in contract address is malformed: {err}"),
    }
}

impl MintConfig {
    /// Defaults plus any `MINT_*` values present when the crate was compiled.
    pub fn from_build_env() -> Self {
        Self::default().with_overrides(|key| match key {
            "MINT_CONTRACT_ADDRESS" => option_env!("MINT_CONTRACT_ADDRESS"),
            "MINT_CHAIN_ID" => option_env!("MINT_CHAIN_ID"),
            "MINT_NETWORK_NAME" => option_env!("MINT_NETWORK_NAME"),
            "MINT_COLLECTION_CAP" => option_env!("MINT_COLLECTION_CAP"),
            "MINT_COLLECTION_URL" => option_env!("MINT_COLLECTION_URL"),
            "MINT_NETWORK_POLICY" => option_env!("MINT_NETWORK_POLICY"),
            _ => None,
        })
    }

    /// Apply `MINT_*` overrides from `lookup`. Unparseable values are logged
    /// and leave the current value in place.
    pub fn with_overrides<'a>(mut self, lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        if let Some(raw) = lookup("MINT_CONTRACT_ADDRESS") {
            match Address::parse(raw.trim()) {
                Ok(address) => self.contract_address = address,
                Err(err) => warn!("ignoring MINT_CONTRACT_ADDRESS: {err}"),
            }
        }
        if let Some(raw) = lookup("MINT_CHAIN_ID") {
            match parse_chain_id(raw.trim()) {
                Some(chain_id) => self.expected_chain_id = chain_id,
                None => warn!("ignoring MINT_CHAIN_ID '{raw}'"),
            }
        }
        if let Some(raw) = lookup("MINT_NETWORK_NAME").filter(|v| !v.trim().is_empty()) {
            self.network_name = raw.trim().to_owned();
        }
        if let Some(raw) = lookup("MINT_COLLECTION_CAP") {
            match raw.trim().parse::<u64>() {
                Ok(cap) if cap > 0 => self.collection_cap = cap,
                _ => warn!("ignoring MINT_COLLECTION_CAP '{raw}'"),
            }
        }
        if let Some(raw) = lookup("MINT_COLLECTION_URL").filter(|v| !v.trim().is_empty()) {
            self.collection_url = raw.trim().to_owned();
        }
        if let Some(raw) = lookup("MINT_NETWORK_POLICY") {
            match raw.trim() {
                "gate" => self.network_policy = NetworkPolicy::Gate,
                "warn_only" | "warn" => self.network_policy = NetworkPolicy::WarnOnly,
                other => warn!("ignoring MINT_NETWORK_POLICY '{other}'"),
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_cap == 0 {
            return Err(ConfigError::ZeroCap);
        }
        if self.marketplace_asset_base.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("marketplace_asset_base"));
        }
        if self.collection_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("collection_url"));
        }
        if self.confirmation_poll_ms == 0 {
            return Err(ConfigError::ZeroInterval("confirmation"));
        }
        if self.event_poll_ms == 0 {
            return Err(ConfigError::ZeroInterval("event"));
        }
        Ok(())
    }

    pub fn confirmation_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_ms)
    }

    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_millis(self.event_poll_ms)
    }

    /// Marketplace page for one token of this collection.
    pub fn token_link(&self, token_id: impl std::fmt::Display) -> String {
        format!(
            "{}/{}/{}",
            self.marketplace_asset_base.trim_end_matches('/'),
            self.contract_address,
            token_id
        )
    }

    pub fn explorer_tx_link(&self, tx_hash: impl std::fmt::Display) -> String {
        format!("{}/{}", self.explorer_tx_base.trim_end_matches('/'), tx_hash)
    }

    pub fn twitter_link(&self) -> String {
        format!("https://twitter.com/{}", self.twitter_handle)
    }
}

/// Accepts either a hex quantity (`0x4`) or a decimal id (`4`).
fn parse_chain_id(raw: &str) -> Option<ChainId> {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        ChainId::from_hex(raw).ok()
    } else {
        raw.parse::<u64>().ok().map(ChainId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_deployed_collection() {
        let config = MintConfig::default();
        assert_eq!(config.collection_cap, 50);
        assert_eq!(config.expected_chain_id, ChainId(4));
        assert_eq!(
            config.contract_address.as_str(),
            "0x5310b3dec733e56c64dc5319efe5df752d25bcab"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_replace_valid_values_and_skip_invalid_ones() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MINT_CONTRACT_ADDRESS", "0x00000000000000000000000000000000000000aa"),
            ("MINT_CHAIN_ID", "11155111"),
            ("MINT_COLLECTION_CAP", "0"),
            ("MINT_NETWORK_POLICY", "gate"),
        ]);
        let config = MintConfig::default().with_overrides(|key| env.get(key).copied());

        assert_eq!(
            config.contract_address.as_str(),
            "0x00000000000000000000000000000000000000aa"
        );
        assert_eq!(config.expected_chain_id, ChainId(11_155_111));
        assert_eq!(config.collection_cap, 50);
        assert_eq!(config.network_policy, NetworkPolicy::Gate);
    }

    #[test]
    fn malformed_address_override_is_ignored() {
        let config = MintConfig::default().with_overrides(|key| {
            (key == "MINT_CONTRACT_ADDRESS").then_some("0x1234")
        });
        assert_eq!(config.contract_address, MintConfig::default().contract_address);
    }

    #[test]
    fn hex_chain_id_override() {
        let config =
            MintConfig::default().with_overrides(|key| (key == "MINT_CHAIN_ID").then_some("0x5"));
        assert_eq!(config.expected_chain_id, ChainId(5));
    }

    #[test]
    fn validate_rejects_zero_cap_and_intervals() {
        let mut config = MintConfig::default();
        config.collection_cap = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroCap));

        let mut config = MintConfig::default();
        config.event_poll_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval("event")));
    }

    #[test]
    fn deserializes_partial_json_over_defaults() {
        let config: MintConfig =
            serde_json::from_str(r#"{ "collection_cap": 10, "network_policy": "gate" }"#)
                .unwrap();
        assert_eq!(config.collection_cap, 10);
        assert_eq!(config.network_policy, NetworkPolicy::Gate);
        assert_eq!(config.network_name, "Rinkeby Test Network");
    }

    #[test]
    fn links_are_built_from_config() {
        let config = MintConfig::default();
        assert_eq!(
            config.token_link(7),
            "https://testnets.opensea.io/assets/0x5310b3dec733e56c64dc5319efe5df752d25bcab/7"
        );
        assert_eq!(
            config.explorer_tx_link("0xabc"),
            "https://rinkeby.etherscan.io/tx/0xabc"
        );
        assert_eq!(config.twitter_link(), "https://twitter.com/_buildspace");
    }
}
