//! Sync layer: keeps a local contract list in step with the analysis API and
//! derives the notification feed from it.

mod engine;
mod error;
mod source;

pub use engine::{
    DEFAULT_POLL_INTERVAL, RefreshOutcome, StatusSyncEngine, SyncConfig, should_poll,
};
pub use error::SyncError;
pub use source::ContractSource;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::ContractClient;
