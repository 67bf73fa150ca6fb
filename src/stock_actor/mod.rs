//! The stock transaction manager: every write to the ledger goes through
//! this one actor, one request at a time, each inside one store transaction.

mod messages;
mod service;

pub use messages::*;
pub use service::*;
