//! Transactional storage for products and sales.
//!
//! [`LedgerStore`] keeps the committed tables behind an `Arc` that readers
//! share freely, and a single writer lock that [`Transaction`] holds while it
//! stages changes on a private copy. A commit swaps the staged copy in as a
//! whole, so readers see either all of a transaction or none of it.

mod entity;
mod error;
mod store;
mod tables;
mod transaction;

pub use error::*;
pub use store::*;
pub use tables::Tables;
pub use transaction::Transaction;
