//! System orchestration, startup, and shutdown logic.

pub mod config;
pub mod error;
pub mod ledger_system;
pub mod tracing;

pub use self::config::*;
pub use self::error::*;
pub use self::ledger_system::*;
pub use self::tracing::*;
