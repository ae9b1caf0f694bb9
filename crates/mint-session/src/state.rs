//! Transient page state. Nothing here outlives a page load.

use mint_api_types::{Address, TxHash};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub connected_address: Option<Address>,
    pub network_ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    /// Terminal for the page's lifetime: there is no disconnect.
    Connected,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        match self.connected_address {
            Some(_) => SessionPhase::Connected,
            None => SessionPhase::Uninitialized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStatus {
    pub total_minted: Option<u64>,
    pub cap: u64,
}

impl CollectionStatus {
    pub fn new(cap: u64) -> Self {
        Self {
            total_minted: None,
            cap,
        }
    }

    /// Known and within the cap. A count above the cap means the contract
    /// misbehaved; minting stays disabled rather than erroring.
    pub fn has_room(&self) -> bool {
        matches!(self.total_minted, Some(total) if total <= self.cap)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MintPhase {
    #[default]
    Idle,
    /// Waiting on the wallet to sign and broadcast.
    Submitting,
    Pending(TxHash),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session: Session,
    pub collection: CollectionStatus,
    pub mint: MintPhase,
}

impl SessionState {
    pub fn new(cap: u64) -> Self {
        Self {
            session: Session::default(),
            collection: CollectionStatus::new(cap),
            mint: MintPhase::Idle,
        }
    }

    pub fn is_minting(&self) -> bool {
        self.mint != MintPhase::Idle
    }
}
