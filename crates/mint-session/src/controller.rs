//! Wallet/contract session controller.
//!
//! Every public operation swallows boundary failures: they are logged, state is
//! left as it was, and the page keeps working. State lives in a `RefCell` that
//! is never held across an `.await`; the controller is meant for a
//! single-threaded event loop and is shared as `Rc<SessionController<..>>`.

use futures_util::StreamExt;
use futures_util::future::LocalBoxFuture;
use mint_api_types::{Address, MintEvent, TxStatus};
use mint_chain_client::{
    MintContract, MintEventSubscription, ProviderError, Subscription, WalletProvider,
};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::config::{MintConfig, NetworkPolicy};
use crate::state::{MintPhase, SessionState};
use crate::view::{self, PageView};

/// The page: re-rendered after every state change, and the blocking
/// prompts (`alert`) for messages the user must see.
pub trait Presenter {
    fn render(&self, view: &PageView);
    fn notify(&self, message: &str);
}

/// Runs background work on the current thread's event loop.
pub trait Spawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

pub struct SessionController<P, C> {
    config: MintConfig,
    provider: P,
    contract: C,
    presenter: Box<dyn Presenter>,
    spawner: Box<dyn Spawner>,
    state: RefCell<SessionState>,
    subscription: RefCell<Option<Subscription>>,
}

impl<P, C> SessionController<P, C>
where
    P: WalletProvider + 'static,
    C: MintContract + 'static,
{
    pub fn new(
        config: MintConfig,
        provider: P,
        contract: C,
        presenter: Box<dyn Presenter>,
        spawner: Box<dyn Spawner>,
    ) -> Rc<Self> {
        let state = SessionState::new(config.collection_cap);
        Rc::new(Self {
            config,
            provider,
            contract,
            presenter,
            spawner,
            state: RefCell::new(state),
            subscription: RefCell::new(None),
        })
    }

    pub fn config(&self) -> &MintConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> PageView {
        PageView::build(&self.state.borrow(), &self.config)
    }

    /// Push the current state to the page.
    pub fn render(&self) {
        let view = self.view();
        self.presenter.render(&view);
    }

    fn update(&self, mutate: impl FnOnce(&mut SessionState)) {
        mutate(&mut self.state.borrow_mut());
        self.render();
    }

    fn connected_address(&self) -> Option<Address> {
        self.state.borrow().session.connected_address.clone()
    }

    pub fn detect_provider(&self) -> bool {
        let present = self.provider.is_available();
        if present {
            info!("We have the ethereum object");
        } else {
            info!("Make sure you have metamask!");
        }
        present
    }

    /// Compare the wallet's active chain with the configured one. A mismatch
    /// warns the user; a failed request only logs. Either way returns false.
    pub async fn check_network(&self) -> bool {
        let network_ok = match self.provider.chain_id().await {
            Ok(chain_id) => {
                info!("Connected to chain {}", chain_id.to_hex());
                if chain_id == self.config.expected_chain_id {
                    true
                } else {
                    self.presenter
                        .notify(&view::network_warning(&self.config.network_name));
                    false
                }
            }
            Err(err) => {
                warn!("network check failed: {err}");
                false
            }
        };
        self.update(|state| state.session.network_ok = network_ok);
        network_ok
    }

    /// Adopt an already-authorized account without prompting the user.
    pub async fn restore_session(self: &Rc<Self>) {
        if !self.detect_provider() {
            return;
        }
        let accounts = match self.provider.authorized_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!("could not read authorized accounts: {err}");
                return;
            }
        };
        let Some(account) = accounts.into_iter().next() else {
            info!("No authorized account found");
            return;
        };
        info!(%account, "Found an authorized account");
        self.adopt_account(account).await;
    }

    /// Ask the wallet for account access.
    pub async fn connect(self: &Rc<Self>) {
        if !self.provider.is_available() {
            self.presenter.notify(view::INSTALL_WALLET_PROMPT);
            return;
        }
        let accounts = match self.provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(ProviderError::MissingProvider) => {
                self.presenter.notify(view::INSTALL_WALLET_PROMPT);
                return;
            }
            Err(ProviderError::UserRejected) => {
                info!("account access rejected by user");
                return;
            }
            Err(err) => {
                warn!("account request failed: {err}");
                return;
            }
        };
        let Some(account) = accounts.into_iter().next() else {
            warn!("wallet approved access but returned no accounts");
            return;
        };
        info!(%account, "Connected");
        self.adopt_account(account).await;
    }

    async fn adopt_account(self: &Rc<Self>, account: Address) {
        self.update(|state| state.session.connected_address = Some(account));

        let network_ok = self.check_network().await;
        if !network_ok && self.config.network_policy == NetworkPolicy::Gate {
            info!("wrong network; holding off on event subscription and count refresh");
            return;
        }
        self.subscribe_to_mint_events().await;
        self.refresh_minted_count().await;
    }

    /// Read the minted count. On failure the previous value stays.
    pub async fn refresh_minted_count(&self) {
        match self.contract.total_minted().await {
            Ok(total) => {
                debug!(total, "minted count refreshed");
                if total > self.config.collection_cap {
                    warn!(
                        total,
                        cap = self.config.collection_cap,
                        "contract reports more mints than the cap"
                    );
                }
                self.update(|state| state.collection.total_minted = Some(total));
            }
            Err(err) => warn!("could not read minted count: {err}"),
        }
    }

    /// Submit a mint and wait for it to be mined. The pending flag is cleared
    /// here on every outcome; mint events never touch it.
    pub async fn mint(&self) {
        if !self.provider.is_available() {
            self.presenter.notify(view::INSTALL_WALLET_PROMPT);
            return;
        }
        let Some(from) = self.connected_address() else {
            warn!("mint requested without a connected account");
            return;
        };
        if self.config.guard_concurrent_mints {
            if self.state.borrow().is_minting() {
                info!("mint already in flight; ignoring request");
                return;
            }
            self.update(|state| state.mint = MintPhase::Submitting);
        }

        info!("Going to pop wallet now to pay gas...");
        let tx_hash = match self.contract.submit_mint(&from).await {
            Ok(tx_hash) => tx_hash,
            Err(err) => {
                warn!("mint submission failed: {err}");
                self.update(|state| state.mint = MintPhase::Idle);
                return;
            }
        };

        self.update(|state| state.mint = MintPhase::Pending(tx_hash.clone()));
        info!(%tx_hash, "Mining...please wait.");

        match self.contract.wait_for_confirmation(&tx_hash).await {
            Ok(receipt) if receipt.status == TxStatus::Confirmed => {
                info!(
                    block = receipt.block_number,
                    "Mined, see transaction: {}",
                    self.config.explorer_tx_link(&tx_hash)
                );
            }
            Ok(receipt) => warn!(block = receipt.block_number, %tx_hash, "mint transaction reverted"),
            Err(err) => warn!(%tx_hash, "waiting for mint confirmation failed: {err}"),
        }
        self.update(|state| state.mint = MintPhase::Idle);
    }

    /// Listen for every mint of the collection. Any previous subscription is
    /// torn down first, so repeated connects never stack listeners.
    pub async fn subscribe_to_mint_events(self: &Rc<Self>) -> bool {
        self.unsubscribe_mint_events();

        let MintEventSubscription { mut events, handle } =
            match self.contract.subscribe_mint_events().await {
                Ok(subscription) => subscription,
                Err(err) => {
                    warn!("could not subscribe to mint events: {err}");
                    return false;
                }
            };
        if let Some(stale) = self.subscription.borrow_mut().replace(handle) {
            stale.unsubscribe();
        }

        let controller = Rc::downgrade(self);
        self.spawner.spawn(Box::pin(async move {
            while let Some(event) = events.next().await {
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                controller.handle_mint_event(event).await;
            }
            debug!("mint event stream ended");
        }));
        info!("Setup event listener!");
        true
    }

    pub fn unsubscribe_mint_events(&self) {
        let previous = self.subscription.borrow_mut().take();
        if let Some(handle) = previous {
            debug!("tearing down previous mint event subscription");
            handle.unsubscribe();
        }
    }

    /// Notify with the token's marketplace link, then re-read the count.
    pub async fn handle_mint_event(&self, event: MintEvent) {
        info!(from = %event.from, token_id = %event.token_id, "mint event received");
        let link = self.config.token_link(event.token_id);
        self.presenter.notify(&view::mint_notification(&link));
        self.refresh_minted_count().await;
    }
}
