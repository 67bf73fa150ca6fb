//! Role based access policy.
//!
//! The grants are data: a [`PolicyTable`] deserialized from the `[policy]`
//! configuration section, each entry overriding the built-in grant for one
//! operation. Components never compare roles themselves; they ask the
//! [`AccessGate`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Identity, Role};
use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    ManageUsers,
    ManageCatalog,
    /// Recording and reversing sales.
    RecordSale,
    ViewSales,
    ViewAnalyticsBasic,
    ViewAnalyticsAdvanced,
    ManageLowStockAlerts,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::ManageUsers,
        Operation::ManageCatalog,
        Operation::RecordSale,
        Operation::ViewSales,
        Operation::ViewAnalyticsBasic,
        Operation::ViewAnalyticsAdvanced,
        Operation::ManageLowStockAlerts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ManageUsers => "manage-users",
            Operation::ManageCatalog => "manage-catalog",
            Operation::RecordSale => "record-sale",
            Operation::ViewSales => "view-sales",
            Operation::ViewAnalyticsBasic => "view-analytics-basic",
            Operation::ViewAnalyticsAdvanced => "view-analytics-advanced",
            Operation::ManageLowStockAlerts => "manage-low-stock-alerts",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which roles may perform which operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Operation, BTreeSet<Role>>", into = "BTreeMap<Operation, BTreeSet<Role>>")]
pub struct PolicyTable {
    grants: BTreeMap<Operation, BTreeSet<Role>>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        use Role::*;
        let grant = |roles: &[Role]| roles.iter().copied().collect::<BTreeSet<_>>();
        let grants = BTreeMap::from([
            (Operation::ManageUsers, grant(&[Admin])),
            (Operation::ManageCatalog, grant(&[Manager])),
            (Operation::RecordSale, grant(&[Admin, Manager, Staff])),
            (Operation::ViewSales, grant(&[Admin, Manager, Staff])),
            (Operation::ViewAnalyticsBasic, grant(&[Manager, Staff])),
            (Operation::ViewAnalyticsAdvanced, grant(&[Manager])),
            (Operation::ManageLowStockAlerts, grant(&[Manager])),
        ]);
        Self { grants }
    }
}

/// Configured entries replace the default grant of their operation; the
/// rest keep their defaults.
impl From<BTreeMap<Operation, BTreeSet<Role>>> for PolicyTable {
    fn from(overrides: BTreeMap<Operation, BTreeSet<Role>>) -> Self {
        let mut table = PolicyTable::default();
        table.grants.extend(overrides);
        table
    }
}

impl From<PolicyTable> for BTreeMap<Operation, BTreeSet<Role>> {
    fn from(table: PolicyTable) -> Self {
        table.grants
    }
}

impl PolicyTable {
    pub fn allowed(&self, role: Role, operation: Operation) -> bool {
        self.grants
            .get(&operation)
            .is_some_and(|roles| roles.contains(&role))
    }

    pub fn roles_for(&self, operation: Operation) -> impl Iterator<Item = Role> + '_ {
        self.grants.get(&operation).into_iter().flatten().copied()
    }

    pub fn with_grant(mut self, operation: Operation, roles: impl IntoIterator<Item = Role>) -> Self {
        self.grants.insert(operation, roles.into_iter().collect());
        self
    }
}

/// Shared, read-only view of the policy consulted before any request is
/// forwarded to the ledger.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    table: Arc<PolicyTable>,
}

impl AccessGate {
    pub fn new(table: PolicyTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn allowed(&self, role: Role, operation: Operation) -> bool {
        self.table.allowed(role, operation)
    }

    pub fn authorize(&self, identity: &Identity, operation: Operation) -> Result<(), LedgerError> {
        if self.allowed(identity.role, operation) {
            Ok(())
        } else {
            warn!(user_id = %identity.user_id, role = %identity.role, %operation, "Access denied");
            Err(LedgerError::Forbidden {
                role: identity.role,
                operation,
            })
        }
    }
}
