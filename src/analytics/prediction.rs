use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::{Product, ProductId};
use crate::ledger::Tables;

use super::reports::in_window;
use super::Prediction;

/// Days of cover below which a product is flagged high priority.
const STOCKOUT_HORIZON_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct WindowSales {
    count: usize,
    units: i64,
}

/// The reorder rule table for one product.
///
/// Not a forecast: the outcome depends only on the current quantity, the
/// reorder point and the units sold over the window. Rules apply in order
/// and the first match wins:
///
/// | condition                     | priority |
/// |-------------------------------|----------|
/// | quantity == 0                 | critical |
/// | days until stockout < 7       | high     |
/// | quantity < reorder point      | medium   |
/// | otherwise                     | low      |
pub fn predict(product: &Product, units_sold: i64, sales_count: usize, window_days: u32) -> Prediction {
    let sold_per_day = Decimal::from(units_sold) / Decimal::from(window_days.max(1));
    let days_until_stockout = if product.quantity > 0 {
        let divisor = if sold_per_day > Decimal::ZERO {
            sold_per_day
        } else {
            Decimal::ONE
        };
        (Decimal::from(product.quantity) / divisor)
            .floor()
            .to_i64()
            .unwrap_or(i64::MAX)
    } else {
        0
    };
    let recommended_order = product
        .reorder_point
        .saturating_mul(2)
        .saturating_sub(product.quantity)
        .max(0);

    let (priority, action) = if product.quantity == 0 {
        (Priority::Critical, "Order immediately - Out of stock".to_string())
    } else if days_until_stockout < STOCKOUT_HORIZON_DAYS {
        (
            Priority::High,
            format!("Order soon - {days_until_stockout} days until stockout"),
        )
    } else if product.quantity < product.reorder_point {
        (Priority::Medium, "Reorder recommended".to_string())
    } else {
        (Priority::Low, "Monitor".to_string())
    };

    let avg_quantity_per_sale = (sales_count > 0)
        .then(|| (Decimal::from(units_sold) / Decimal::from(sales_count)).round_dp(2));

    Prediction {
        product_id: product.id,
        name: product.name.clone(),
        sku: product.sku.clone(),
        quantity: product.quantity,
        reorder_point: product.reorder_point,
        sales_count,
        total_sold: units_sold,
        avg_quantity_per_sale,
        sold_per_day: sold_per_day.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        days_until_stockout,
        recommended_order,
        priority,
        action,
    }
}

/// One prediction per product, best sellers in the window first.
pub(super) fn predictions(tables: &Tables, window_days: u32, now: DateTime<Utc>) -> Vec<Prediction> {
    let mut window: BTreeMap<ProductId, WindowSales> = BTreeMap::new();
    for sale in in_window(tables, window_days, now) {
        let entry = window.entry(sale.product_id).or_default();
        entry.count += 1;
        entry.units = entry.units.saturating_add(sale.quantity);
    }

    let mut predictions: Vec<Prediction> = tables
        .products()
        .map(|product| {
            let sold = window.get(&product.id).copied().unwrap_or_default();
            predict(product, sold.units, sold.count, window_days)
        })
        .collect();
    predictions.sort_by(|a, b| b.total_sold.cmp(&a.total_sold));
    predictions
}

#[cfg(test)]
mod tests {
    use super::super::reports::fixtures::*;
    use super::*;

    fn stocked(quantity: i64, reorder_point: i64) -> Product {
        Product {
            id: ProductId(1),
            sku: "SNK-001".into(),
            name: "Potato Chips".into(),
            category: "Snacks".into(),
            quantity,
            price: Decimal::from(45),
            reorder_point,
            supplier: None,
            created_at: at(2025, 1, 1, 0),
        }
    }

    #[test]
    fn out_of_stock_is_critical() {
        let prediction = predict(&stocked(0, 5), 0, 0, 30);
        assert_eq!(prediction.priority, Priority::Critical);
        assert_eq!(prediction.action, "Order immediately - Out of stock");
        assert_eq!(prediction.days_until_stockout, 0);
        assert_eq!(prediction.recommended_order, 10);
    }

    #[test]
    fn fast_movers_are_high() {
        // 90 units over 30 days is 3 per day; 20 on hand lasts 6 days.
        let prediction = predict(&stocked(20, 5), 90, 12, 30);
        assert_eq!(prediction.sold_per_day, Decimal::from(3));
        assert_eq!(prediction.days_until_stockout, 6);
        assert_eq!(prediction.priority, Priority::High);
        assert_eq!(prediction.action, "Order soon - 6 days until stockout");
        assert_eq!(prediction.avg_quantity_per_sale, Some(Decimal::new(750, 2)));
    }

    #[test]
    fn no_sales_uses_quantity_as_days_of_cover() {
        let prediction = predict(&stocked(6, 2), 0, 0, 30);
        assert_eq!(prediction.days_until_stockout, 6);
        assert_eq!(prediction.priority, Priority::High);
        assert_eq!(prediction.avg_quantity_per_sale, None);
    }

    #[test]
    fn below_reorder_point_is_medium() {
        let prediction = predict(&stocked(8, 10), 0, 0, 30);
        assert_eq!(prediction.priority, Priority::Medium);
        assert_eq!(prediction.action, "Reorder recommended");
        assert_eq!(prediction.recommended_order, 12);
    }

    #[test]
    fn healthy_stock_is_monitored() {
        let prediction = predict(&stocked(50, 10), 30, 3, 30);
        assert_eq!(prediction.days_until_stockout, 50);
        assert_eq!(prediction.priority, Priority::Low);
        assert_eq!(prediction.action, "Monitor");
        assert_eq!(prediction.recommended_order, 0);
    }

    #[test]
    fn sold_per_day_is_rounded_for_display() {
        let prediction = predict(&stocked(100, 10), 10, 1, 30);
        assert_eq!(prediction.sold_per_day, Decimal::new(33, 2));
        // 100 / 0.333.. is 300, not 100 / 0.33.
        assert_eq!(prediction.days_until_stockout, 300);
    }

    #[test]
    fn ordered_by_units_sold_in_window() {
        let mut tables = Tables::default();
        let slow = product(&mut tables, "A", "Snacks", 50, 10, 5);
        let fast = product(&mut tables, "B", "Snacks", 50, 10, 5);
        let idle = product(&mut tables, "C", "Snacks", 50, 10, 5);
        let old = product(&mut tables, "D", "Snacks", 50, 10, 5);
        let now = at(2025, 3, 31, 12);
        sale(&mut tables, slow, 1, 10, at(2025, 3, 10, 8));
        sale(&mut tables, fast, 4, 10, at(2025, 3, 11, 8));
        sale(&mut tables, fast, 2, 10, at(2025, 3, 12, 8));
        sale(&mut tables, old, 40, 10, at(2025, 1, 12, 8));

        let result = predictions(&tables, 30, now);
        let ids: Vec<_> = result.iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![fast, slow, idle, old]);
        assert_eq!(result[0].sales_count, 2);
        assert_eq!(result[0].total_sold, 6);
        assert_eq!(result[3].total_sold, 0);
    }

    #[test]
    fn oversized_reorder_point_saturates_the_order() {
        let prediction = predict(&stocked(10, i64::MAX / 2 + 1), 0, 0, 30);
        assert_eq!(prediction.recommended_order, i64::MAX - 10);
        assert_eq!(prediction.priority, Priority::Medium);
    }
}
