use thiserror::Error;
use tracing::error;

use crate::domain::{ProductId, Role};
use crate::ledger::StoreError;
use crate::policy::Operation;

/// Errors surfaced by the stock ledger to its callers.
///
/// Each variant maps to exactly one [`ErrorCode`]. Storage details are logged
/// where they occur and never carried in the message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(
        "Insufficient stock for product {product_id} (item {item}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        item: usize,
        product_id: ProductId,
        requested: i64,
        available: i64,
    },
    #[error("Forbidden: {role} may not {operation}")]
    Forbidden { role: Role, operation: Operation },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Transaction failed")]
    TransactionFailed,
}

/// Stable, machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Validation,
    NotFound,
    InsufficientStock,
    Forbidden,
    Conflict,
    TransactionFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "validation_error",
            ErrorCode::NotFound => "not_found",
            ErrorCode::InsufficientStock => "insufficient_stock",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::Conflict => "conflict",
            ErrorCode::TransactionFailed => "transaction_failed",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LedgerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Validation(_) => ErrorCode::Validation,
            LedgerError::NotFound(_) => ErrorCode::NotFound,
            LedgerError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            LedgerError::Forbidden { .. } => ErrorCode::Forbidden,
            LedgerError::Conflict(_) => ErrorCode::Conflict,
            LedgerError::TransactionFailed => ErrorCode::TransactionFailed,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { kind, id } => LedgerError::NotFound(format!("{kind} {id}")),
            StoreError::ForeignKey { product_id } => {
                LedgerError::NotFound(format!("product {product_id}"))
            }
            StoreError::Duplicate { kind, key } => {
                LedgerError::Conflict(format!("{kind} {key} already exists"))
            }
            StoreError::Referenced { product_id, sales } => LedgerError::Conflict(format!(
                "product {product_id} is referenced by {sales} sale(s)"
            )),
            StoreError::Rejected { reason, .. } => LedgerError::Validation(reason),
            internal => {
                error!(error = %internal, "Store failure");
                LedgerError::TransactionFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn internal_store_failures_do_not_leak() {
        let err = LedgerError::from(StoreError::Corrupt("/var/lib/ledger.json: bad byte".into()));
        assert_eq!(err, LedgerError::TransactionFailed);
        assert_eq!(err.to_string(), "Transaction failed");

        let err = LedgerError::from(StoreError::Timeout {
            waited: Duration::from_millis(5),
            what: "writer lock",
        });
        assert_eq!(err.code().as_str(), "transaction_failed");
    }

    #[test]
    fn constraint_failures_keep_their_category() {
        let err = LedgerError::from(StoreError::ForeignKey {
            product_id: ProductId(9),
        });
        assert_eq!(err, LedgerError::NotFound("product 9".into()));

        let err = LedgerError::from(StoreError::Referenced {
            product_id: ProductId(9),
            sales: 2,
        });
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[test]
    fn forbidden_names_role_and_operation() {
        let err = LedgerError::Forbidden {
            role: Role::Staff,
            operation: Operation::ViewAnalyticsAdvanced,
        };
        assert_eq!(err.to_string(), "Forbidden: Staff may not view-analytics-advanced");
    }
}
