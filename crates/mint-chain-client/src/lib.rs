use async_trait::async_trait;
use futures_util::stream::LocalBoxStream;
use mint_api_types::{Address, ChainId, MintEvent, ParseError, TxHash, TxReceipt};
use std::fmt;
use thiserror::Error;

/// EIP-1193 error code for a request the user dismissed in the wallet UI.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("no injected wallet provider")]
    MissingProvider,
    #[error("request rejected by user")]
    UserRejected,
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Classify a JSON-RPC error object returned by the provider.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            Self::UserRejected
        } else {
            Self::Rpc {
                code,
                message: message.into(),
            }
        }
    }
}

impl From<ParseError> for ProviderError {
    fn from(err: ParseError) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// The browser-injected wallet: account access and network identity.
#[async_trait(?Send)]
pub trait WalletProvider {
    fn is_available(&self) -> bool;
    /// Accounts already authorized for this origin. Never opens a popup.
    async fn authorized_accounts(&self) -> ProviderResult<Vec<Address>>;
    /// Ask the user for account access through the wallet UI.
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>>;
    async fn chain_id(&self) -> ProviderResult<ChainId>;
}

/// The pre-deployed collection contract.
#[async_trait(?Send)]
pub trait MintContract {
    fn address(&self) -> &Address;
    async fn total_minted(&self) -> ProviderResult<u64>;
    /// Send a mint transaction from `from`; resolves once the wallet has broadcast it.
    async fn submit_mint(&self, from: &Address) -> ProviderResult<TxHash>;
    async fn wait_for_confirmation(&self, tx_hash: &TxHash) -> ProviderResult<TxReceipt>;
    async fn subscribe_mint_events(&self) -> ProviderResult<MintEventSubscription>;
}

/// Explicit teardown handle for an event subscription.
///
/// The cancel hook runs at most once: on `unsubscribe()`, or on drop if the
/// handle was never unsubscribed.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

pub struct MintEventSubscription {
    pub events: LocalBoxStream<'static, MintEvent>,
    pub handle: Subscription,
}
