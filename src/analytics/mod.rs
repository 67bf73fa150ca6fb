//! Read-only reports over the committed ledger.
//!
//! Every call takes one [`LedgerStore::snapshot`] and computes its report
//! from that snapshot alone, so a report never mixes two committed states
//! and never waits on the writer lock.

mod prediction;
mod reports;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::ProductId;
use crate::error::LedgerError;
use crate::ledger::LedgerStore;

pub use prediction::{predict, Priority};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_TOP_PRODUCTS_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub trend_window_days: u32,
    pub prediction_window_days: u32,
    pub top_products_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_window_days: DEFAULT_WINDOW_DAYS,
            prediction_window_days: DEFAULT_WINDOW_DAYS,
            top_products_limit: DEFAULT_TOP_PRODUCTS_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSummary {
    pub date: NaiveDate,
    pub sales_count: usize,
    pub sales_revenue: Decimal,
    pub inventory_value: Decimal,
    pub inventory_count: usize,
    pub low_stock_count: usize,
}

/// One calendar day with at least one sale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub sales_count: usize,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub sales_count: usize,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

/// Reorder advice for one product, produced by a fixed rule table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub reorder_point: i64,
    pub sales_count: usize,
    pub total_sold: i64,
    /// `None` when the product did not sell inside the window.
    pub avg_quantity_per_sale: Option<Decimal>,
    /// Rounded to two decimal places.
    pub sold_per_day: Decimal,
    pub days_until_stockout: i64,
    pub recommended_order: i64,
    pub priority: Priority,
    pub action: String,
}

#[derive(Clone)]
pub struct AnalyticsEngine {
    store: LedgerStore,
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(store: LedgerStore, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    #[instrument(skip(self))]
    pub async fn home_summary(&self, as_of: NaiveDate) -> HomeSummary {
        let snapshot = self.store.snapshot().await;
        let summary = reports::home_summary(&snapshot, as_of);
        debug!(sales = summary.sales_count, low_stock = summary.low_stock_count, "Home summary computed");
        summary
    }

    /// Uses the configured window when `window_days` is `None`.
    #[instrument(skip(self))]
    pub async fn sales_trend(
        &self,
        window_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>, LedgerError> {
        let window_days = checked_window(window_days.unwrap_or(self.config.trend_window_days))?;
        let snapshot = self.store.snapshot().await;
        let trend = reports::sales_trend(&snapshot, window_days, now);
        debug!(days = trend.len(), "Sales trend computed");
        Ok(trend)
    }

    #[instrument(skip(self))]
    pub async fn category_breakdown(&self) -> Vec<CategoryRevenue> {
        let snapshot = self.store.snapshot().await;
        reports::category_breakdown(&snapshot)
    }

    #[instrument(skip(self))]
    pub async fn top_products(&self, limit: Option<usize>) -> Vec<TopProduct> {
        let limit = limit.unwrap_or(self.config.top_products_limit);
        let snapshot = self.store.snapshot().await;
        reports::top_products(&snapshot, limit)
    }

    #[instrument(skip(self))]
    pub async fn predictions(
        &self,
        window_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Prediction>, LedgerError> {
        let window_days =
            checked_window(window_days.unwrap_or(self.config.prediction_window_days))?;
        let snapshot = self.store.snapshot().await;
        let predictions = prediction::predictions(&snapshot, window_days, now);
        debug!(
            products = predictions.len(),
            critical = predictions.iter().filter(|p| p.priority == Priority::Critical).count(),
            "Predictions computed"
        );
        Ok(predictions)
    }
}

fn checked_window(window_days: u32) -> Result<u32, LedgerError> {
    if window_days == 0 {
        return Err(LedgerError::Validation(
            "window must be at least one day".to_string(),
        ));
    }
    Ok(window_days)
}
