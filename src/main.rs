use std::path::PathBuf;

use rust_decimal::Decimal;
use tracing::{error, info, warn, Instrument};

use stock_ledger::app_system::{setup_tracing, AppConfig, LedgerSystem};
use stock_ledger::domain::{Identity, ProductCreate, Role, SaleItem, UserCreate};

/// Names the TOML file to load; without it only defaults and
/// `STOCK_LEDGER__*` variables apply.
const CONFIG_PATH_VAR: &str = "STOCK_LEDGER_CONFIG";

#[tokio::main]
async fn main() -> Result<(), String> {
    let config_path = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).map_err(|e| e.to_string())?;

    // Setup tracing once for the entire application
    setup_tracing(&config.log.filter);
    info!(config = ?config_path, "Starting stock ledger");

    if let Some(dir) = config.store.path.as_deref().and_then(|path| path.parent()) {
        if !dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| e.to_string())?;
        }
    }

    let system = LedgerSystem::start(&config).await.map_err(|e| e.to_string())?;

    // The default administrator registers the people who run the shop
    let admin = system.admin();

    let span = tracing::info_span!("staff_setup");
    let (manager, cashier) = async {
        let manager_id = system
            .user_client
            .create_user(&admin, UserCreate::new("MGR001", "Store Manager", Role::Manager))
            .await?;
        let cashier_id = system
            .user_client
            .create_user(&admin, UserCreate::new("EMP001", "Front Cashier", Role::Staff))
            .await?;
        Ok::<_, stock_ledger::user_actor::UserError>((
            Identity::new(manager_id, Role::Manager),
            Identity::new(cashier_id, Role::Staff),
        ))
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    // Stock the shelves, reusing a persisted catalog when there is one
    let catalog = [
        ("SNK-001", "Potato Chips", "Snacks", 50, 45, 10),
        ("BEV-001", "Bottled Water", "Beverages", 120, 15, 30),
        ("CAN-001", "Corned Beef", "Canned Goods", 6, 62, 10),
    ];
    let mut product_ids = Vec::new();
    for (sku, name, category, quantity, price, reorder_point) in catalog {
        let existing = system
            .stock_client
            .list_products(&manager)
            .await
            .into_iter()
            .find(|product| product.sku == sku);
        let id = match existing {
            Some(product) => product.id,
            None => system
                .stock_client
                .create_product(
                    &manager,
                    ProductCreate::new(sku, name, category, quantity, Decimal::from(price), reorder_point),
                )
                .await
                .map_err(|e| e.to_string())?,
        };
        product_ids.push((id, Decimal::from(price)));
    }
    info!(products = product_ids.len(), "Catalog ready");

    // Ring up a basket
    let basket: Vec<SaleItem> = product_ids
        .iter()
        .map(|(id, price)| SaleItem::new(*id, 2, *price))
        .collect();
    let span = tracing::info_span!("checkout");
    let sale = async { system.stock_client.record_sale(&cashier, basket, None).await }
        .instrument(span)
        .await;
    match sale {
        Ok(ids) => info!(sale_ids = ?ids, "Basket sold"),
        Err(e) => error!(code = %e.code(), error = %e, "Checkout failed"),
    }

    // An oversized order is refused whole
    let (first, price) = product_ids[0];
    if let Err(e) = system
        .stock_client
        .record_sale(&cashier, vec![SaleItem::new(first, 10_000, price)], None)
        .await
    {
        warn!(code = %e.code(), error = %e, "Oversized sale refused as expected");
    }

    match system.analytics_client.home_summary(&cashier).await {
        Ok(summary) => info!(
            sales = summary.sales_count,
            revenue = %summary.sales_revenue,
            inventory_value = %summary.inventory_value,
            low_stock = summary.low_stock_count,
            "Today's summary"
        ),
        Err(e) => error!(error = %e, "Summary unavailable"),
    }

    match system.analytics_client.predictions(&manager, None).await {
        Ok(predictions) => {
            for prediction in predictions {
                info!(
                    sku = %prediction.sku,
                    quantity = prediction.quantity,
                    priority = %prediction.priority,
                    recommended_order = prediction.recommended_order,
                    "{}",
                    prediction.action
                );
            }
        }
        Err(e) => error!(error = %e, "Predictions unavailable"),
    }

    // Shutdown system gracefully
    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}
