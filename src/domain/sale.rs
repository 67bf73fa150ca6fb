use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProductId, SaleId, UserId};

/// One committed line of the sales ledger.
///
/// `total_price` is frozen at sale time and never recomputed from the
/// catalog. Rows are only ever inserted or removed (together with their
/// stock compensation), never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub total_price: Decimal,
    pub sale_date: DateTime<Utc>,
    pub user_id: UserId,
}

/// A sale row before the store has assigned its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub product_id: ProductId,
    pub quantity: i64,
    pub total_price: Decimal,
    pub sale_date: DateTime<Utc>,
    pub user_id: UserId,
}

/// One requested line of a (possibly multi-item) sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl SaleItem {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// `quantity × unit_price`, or `None` when the product does not fit a
    /// `Decimal`.
    pub fn total_price(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// A batch of items sold together by one staff member.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRequest {
    pub items: Vec<SaleItem>,
    /// Defaults to the commit time when absent.
    pub sale_date: Option<DateTime<Utc>>,
    pub actor: UserId,
}

impl SaleRequest {
    /// Shape checks that need no store access.
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("sale must contain at least one item".to_string());
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.quantity <= 0 {
                return Err(format!(
                    "item {index}: quantity must be positive, got {}",
                    item.quantity
                ));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(format!(
                    "item {index}: unit price must not be negative, got {}",
                    item.unit_price
                ));
            }
            if item.total_price().is_none() {
                return Err(format!(
                    "item {index}: total of {} x {} is out of range",
                    item.quantity, item.unit_price
                ));
            }
        }

        let mut units: BTreeMap<ProductId, i64> = BTreeMap::new();
        for (index, item) in self.items.iter().enumerate() {
            let total = units.entry(item.product_id).or_insert(0);
            *total = total.checked_add(item.quantity).ok_or_else(|| {
                format!(
                    "item {index}: units requested for product {} are out of range",
                    item.product_id
                )
            })?;
        }
        Ok(())
    }

    /// Units this batch takes from `product_id` across all of its items.
    /// Exact for any batch that passed [`validate`](Self::validate).
    pub fn units_for(&self, product_id: ProductId) -> i64 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .fold(0i64, |total, item| total.saturating_add(item.quantity))
    }
}

/// Sale joined with the catalog fields shown in the sales listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    #[serde(flatten)]
    pub sale: Sale,
    pub product_name: String,
    pub sku: String,
}
