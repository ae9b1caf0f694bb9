pub mod config;
pub mod controller;
pub mod state;
pub mod view;

pub use config::{ConfigError, MintConfig, NetworkPolicy};
pub use controller::{Presenter, SessionController, Spawner};
pub use state::{CollectionStatus, MintPhase, Session, SessionPhase, SessionState};
pub use view::PageView;
