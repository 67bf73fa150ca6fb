use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::{ProductId, Sale};
use crate::ledger::Tables;

use super::{CategoryRevenue, HomeSummary, TopProduct, TrendPoint};

/// Midnight UTC of `now`'s date minus `window_days`.
pub(super) fn window_start(now: DateTime<Utc>, window_days: u32) -> DateTime<Utc> {
    let date = now
        .date_naive()
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

pub(super) fn in_window<'a>(
    tables: &'a Tables,
    window_days: u32,
    now: DateTime<Utc>,
) -> impl Iterator<Item = &'a Sale> + 'a {
    let start = window_start(now, window_days);
    tables
        .sales()
        .filter(move |sale| sale.sale_date >= start && sale.sale_date <= now)
}

pub(super) fn home_summary(tables: &Tables, as_of: NaiveDate) -> HomeSummary {
    let (sales_count, sales_revenue) = tables
        .sales()
        .filter(|sale| sale.sale_date.date_naive() == as_of)
        .fold((0, Decimal::ZERO), |(count, revenue), sale| {
            (count + 1, revenue.saturating_add(sale.total_price))
        });

    HomeSummary {
        date: as_of,
        sales_count,
        sales_revenue,
        inventory_value: tables
            .products()
            .fold(Decimal::ZERO, |value, p| value.saturating_add(p.stock_value())),
        inventory_count: tables.product_count(),
        low_stock_count: tables.products().filter(|p| p.is_low_stock()).count(),
    }
}

pub(super) fn sales_trend(tables: &Tables, window_days: u32, now: DateTime<Utc>) -> Vec<TrendPoint> {
    let mut days: BTreeMap<NaiveDate, (usize, Decimal)> = BTreeMap::new();
    for sale in in_window(tables, window_days, now) {
        let day = days
            .entry(sale.sale_date.date_naive())
            .or_insert((0, Decimal::ZERO));
        day.0 += 1;
        day.1 = day.1.saturating_add(sale.total_price);
    }

    days.into_iter()
        .map(|(date, (sales_count, revenue))| TrendPoint {
            date,
            sales_count,
            revenue,
        })
        .collect()
}

pub(super) fn category_breakdown(tables: &Tables) -> Vec<CategoryRevenue> {
    let mut categories: BTreeMap<&str, (usize, Decimal)> = BTreeMap::new();
    for sale in tables.sales() {
        let Some(product) = tables.product(sale.product_id) else {
            continue;
        };
        let entry = categories
            .entry(product.category.as_str())
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(sale.total_price);
    }

    let mut breakdown: Vec<CategoryRevenue> = categories
        .into_iter()
        .map(|(category, (sales_count, revenue))| CategoryRevenue {
            category: category.to_string(),
            sales_count,
            revenue,
        })
        .collect();
    // Stable sort keeps the map's name order among equal revenues.
    breakdown.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    breakdown
}

pub(super) fn top_products(tables: &Tables, limit: usize) -> Vec<TopProduct> {
    let mut totals: BTreeMap<ProductId, (i64, Decimal)> = BTreeMap::new();
    for sale in tables.sales() {
        let entry = totals.entry(sale.product_id).or_insert((0, Decimal::ZERO));
        entry.0 = entry.0.saturating_add(sale.quantity);
        entry.1 = entry.1.saturating_add(sale.total_price);
    }

    let mut top: Vec<TopProduct> = totals
        .into_iter()
        .filter_map(|(product_id, (units_sold, revenue))| {
            let product = tables.product(product_id)?;
            Some(TopProduct {
                product_id,
                name: product.name.clone(),
                sku: product.sku.clone(),
                units_sold,
                revenue,
            })
        })
        .collect();
    top.sort_by(|a, b| b.units_sold.cmp(&a.units_sold));
    top.truncate(limit);
    top
}

#[cfg(test)]
pub(super) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::domain::{NewSale, ProductCreate, ProductId, UserId};
    use crate::ledger::Tables;

    pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    pub fn product(
        tables: &mut Tables,
        sku: &str,
        category: &str,
        quantity: i64,
        price: i64,
        reorder_point: i64,
    ) -> ProductId {
        tables
            .products
            .create(ProductCreate::new(
                sku,
                format!("Item {sku}"),
                category,
                quantity,
                Decimal::from(price),
                reorder_point,
            ))
            .unwrap()
    }

    /// Records a sale row without touching stock, as a committed ledger
    /// would show it.
    pub fn sale(tables: &mut Tables, product_id: ProductId, quantity: i64, unit_price: i64, when: DateTime<Utc>) {
        tables
            .sales
            .create(NewSale {
                product_id,
                quantity,
                total_price: Decimal::from(quantity * unit_price),
                sale_date: when,
                user_id: UserId(3),
            })
            .unwrap();
    }
}
