use config::ConfigError;
use thiserror::Error;

use crate::error::LedgerError;
use crate::ledger::StoreError;
use crate::user_actor::UserError;

/// Failures while starting or stopping the system.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("user directory error: {0}")]
    Users(#[from] UserError),
    #[error("stock service error: {0}")]
    Stock(#[from] LedgerError),
    #[error("actor task failed: {0}")]
    ActorFailed(String),
}
