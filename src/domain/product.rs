use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// Upper bound for quantities and reorder points.
pub const MAX_QUANTITY: i64 = 1_000_000_000_000;
/// Upper bound for a catalog unit price.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

/// A catalog entry together with its on-hand quantity.
///
/// `quantity` only moves through recorded or reversed sales, so at every
/// committed state it equals the initial quantity minus the units of the
/// sales still referencing the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub price: Decimal,
    pub reorder_point: i64,
    pub supplier: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Below the reorder threshold (out-of-stock products included).
    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.reorder_point
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    /// On-hand value at the current catalog price. Saturates instead of
    /// overflowing for rows that predate the catalog bounds.
    pub fn stock_value(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Payload for a new catalog entry. `quantity` is the initial stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreate {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub price: Decimal,
    pub reorder_point: i64,
    #[serde(default)]
    pub supplier: Option<String>,
}

impl ProductCreate {
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: i64,
        price: Decimal,
        reorder_point: i64,
    ) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            category: category.into(),
            quantity,
            price,
            reorder_point,
            supplier: None,
        }
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        require_text("sku", &self.sku)?;
        require_text("name", &self.name)?;
        require_text("category", &self.category)?;
        if self.quantity < 0 {
            return Err(format!("quantity must not be negative, got {}", self.quantity));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(format!(
                "quantity must not exceed {MAX_QUANTITY}, got {}",
                self.quantity
            ));
        }
        check_price(self.price)?;
        check_reorder_point(self.reorder_point)
    }
}

/// Catalog edit. There is no quantity field: stock only moves through sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub reorder_point: Option<i64>,
    /// `Some(None)` clears the supplier.
    pub supplier: Option<Option<String>>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(category) = &self.category {
            require_text("category", category)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(reorder_point) = self.reorder_point {
            check_reorder_point(reorder_point)?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Ok(())
    }
}

fn check_price(price: Decimal) -> Result<(), String> {
    if price < Decimal::ZERO {
        Err(format!("price must not be negative, got {price}"))
    } else if price > Decimal::from(MAX_PRICE) {
        Err(format!("price must not exceed {MAX_PRICE}, got {price}"))
    } else {
        Ok(())
    }
}

fn check_reorder_point(reorder_point: i64) -> Result<(), String> {
    if reorder_point < 0 {
        Err(format!("reorder point must not be negative, got {reorder_point}"))
    } else if reorder_point > MAX_QUANTITY {
        Err(format!("reorder point must not exceed {MAX_QUANTITY}, got {reorder_point}"))
    } else {
        Ok(())
    }
}
