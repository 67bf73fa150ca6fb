use std::time::Duration;

use thiserror::Error;

use crate::actor_framework::TableError;
use crate::domain::ProductId;

/// Failures of the storage layer. These never cross the public boundary
/// verbatim; the stock service maps them onto `LedgerError`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },
    #[error("sale references unknown product {product_id}")]
    ForeignKey { product_id: ProductId },
    #[error("{kind} with key {key} already exists")]
    Duplicate { kind: &'static str, key: String },
    #[error("{kind} rejected: {reason}")]
    Rejected { kind: &'static str, reason: String },
    #[error("product {product_id} is referenced by {sales} sale(s)")]
    Referenced { product_id: ProductId, sales: usize },
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { waited: Duration, what: &'static str },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("corrupt ledger document: {0}")]
    Corrupt(String),
}

impl From<TableError> for StoreError {
    fn from(value: TableError) -> Self {
        match value {
            TableError::NotFound { kind, id } => StoreError::NotFound { kind, id },
            TableError::Duplicate { kind, key } => StoreError::Duplicate { kind, key },
            TableError::Rejected { kind, reason } => StoreError::Rejected { kind, reason },
        }
    }
}
