//! Epic NFT mint page.
//!
//! Rust + WASM front end: connects the injected wallet, shows the minted
//! count and mints through the collection contract.

pub mod dom;
pub mod ethereum;
pub mod events;
pub mod logging;
pub mod presenter;

use ethereum::InjectedEthereum;
use mint_chain_rpc::{RpcMintContract, RpcWalletProvider};
use mint_session::{MintConfig, SessionController};
use tracing::info;
use wasm_bindgen::prelude::*;

pub type Controller =
    SessionController<RpcWalletProvider<InjectedEthereum>, RpcMintContract<InjectedEthereum>>;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();
    logging::init();

    init().await
}

/// Wire the page, then pick up an already-authorized account if there is one.
async fn init() -> Result<(), JsValue> {
    let config = MintConfig::from_build_env();
    config
        .validate()
        .map_err(|err| JsValue::from_str(&format!("invalid mint config: {err}")))?;
    info!(
        contract = %config.contract_address,
        chain = %config.expected_chain_id,
        cap = config.collection_cap,
        "starting mint page"
    );

    let els = dom::Elements::bind()?;
    let ethereum = InjectedEthereum::detect();
    let provider = RpcWalletProvider::new(ethereum.clone());
    let contract = RpcMintContract::new(
        ethereum,
        config.contract_address.clone(),
        config.confirmation_poll_interval(),
        config.event_poll_interval(),
    );

    let controller = SessionController::new(
        config,
        provider,
        contract,
        Box::new(presenter::DomPresenter::new(els.clone())),
        Box::new(events::BrowserSpawner),
    );
    controller.render();
    events::bind_events(&els, &controller)?;

    controller.restore_session().await;
    Ok(())
}
