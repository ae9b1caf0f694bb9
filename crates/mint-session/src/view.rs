//! Render model for the single page, plus the user-facing message texts.

use crate::config::{MintConfig, NetworkPolicy};
use crate::state::SessionState;

pub const INSTALL_WALLET_PROMPT: &str = "Get MetaMask!";

pub fn network_warning(network_name: &str) -> String {
    format!("You are not connected to the {network_name}!")
}

pub fn mint_notification(link: &str) -> String {
    format!(
        "Hey there! We've minted your NFT and sent it to your wallet. It may be blank right now. \
         It can take a max of 10 min to show up on OpenSea. Here's the link: {link}"
    )
}

/// `"{N}/{cap} NFTs minted so far"`; an unknown count leaves the numerator empty.
pub fn minted_text(total_minted: Option<u64>, cap: u64) -> String {
    let minted = total_minted.map(|n| n.to_string()).unwrap_or_default();
    format!("{minted}/{cap} NFTs minted so far")
}

/// Whether the mint button is enabled.
pub fn is_mintable(state: &SessionState, policy: NetworkPolicy) -> bool {
    if !state.collection.has_room() {
        return false;
    }
    match policy {
        NetworkPolicy::WarnOnly => true,
        NetworkPolicy::Gate => state.session.network_ok,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Connect button instead of the mint button.
    pub show_connect: bool,
    pub mint_enabled: bool,
    pub show_loader: bool,
    pub minted_text: String,
    pub collection_url: String,
    pub twitter_text: String,
    pub twitter_url: String,
}

impl PageView {
    pub fn build(state: &SessionState, config: &MintConfig) -> Self {
        Self {
            show_connect: state.session.connected_address.is_none(),
            mint_enabled: is_mintable(state, config.network_policy),
            show_loader: state.is_minting(),
            minted_text: minted_text(state.collection.total_minted, state.collection.cap),
            collection_url: config.collection_url.clone(),
            twitter_text: format!("built on @{}", config.twitter_handle),
            twitter_url: config.twitter_link(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(total: Option<u64>, network_ok: bool) -> SessionState {
        let mut state = SessionState::new(50);
        state.collection.total_minted = total;
        state.session.network_ok = network_ok;
        state
    }

    #[test]
    fn minted_text_formats_known_and_unknown_counts() {
        assert_eq!(minted_text(Some(7), 50), "7/50 NFTs minted so far");
        assert_eq!(minted_text(None, 50), "/50 NFTs minted so far");
    }

    #[test]
    fn warn_only_policy_gates_on_count_alone() {
        let policy = NetworkPolicy::WarnOnly;
        assert!(!is_mintable(&state_with(None, true), policy));
        assert!(!is_mintable(&state_with(Some(51), true), policy));
        assert!(is_mintable(&state_with(Some(0), false), policy));
        assert!(is_mintable(&state_with(Some(50), false), policy));
    }

    #[test]
    fn gate_policy_also_requires_matching_network() {
        let policy = NetworkPolicy::Gate;
        assert!(!is_mintable(&state_with(None, true), policy));
        assert!(!is_mintable(&state_with(Some(51), true), policy));
        assert!(!is_mintable(&state_with(Some(10), false), policy));
        assert!(is_mintable(&state_with(Some(10), true), policy));
        assert!(is_mintable(&state_with(Some(50), true), policy));
    }

    #[test]
    fn page_view_reflects_session() {
        let config = MintConfig::default();
        let mut state = state_with(Some(3), true);
        let view = PageView::build(&state, &config);
        assert!(view.show_connect);
        assert!(!view.show_loader);
        assert_eq!(view.minted_text, "3/50 NFTs minted so far");
        assert_eq!(view.twitter_text, "built on @_buildspace");

        state.session.connected_address = Some(config.contract_address.clone());
        state.mint = crate::state::MintPhase::Submitting;
        let view = PageView::build(&state, &config);
        assert!(!view.show_connect);
        assert!(view.show_loader);
    }

    #[test]
    fn notification_carries_the_link() {
        let text = mint_notification("https://example.test/nft/9");
        assert!(text.ends_with("Here's the link: https://example.test/nft/9"));
        assert_eq!(
            network_warning("Rinkeby Test Network"),
            "You are not connected to the Rinkeby Test Network!"
        );
    }
}
