#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use crate::analytics::Priority;
    use crate::app_system::{AppConfig, LedgerSystem};
    use crate::domain::{
        Identity, ProductCreate, ProductId, Role, SaleId, SaleItem, UserCreate, UserId, UserPatch,
    };
    use crate::error::LedgerError;
    use crate::ledger::{LedgerStore, StoreConfig};
    use crate::user_actor::UserError;

    fn manager() -> Identity {
        Identity::new(UserId(2), Role::Manager)
    }

    fn staff() -> Identity {
        Identity::new(UserId(3), Role::Staff)
    }

    async fn in_memory_system() -> LedgerSystem {
        LedgerSystem::start(&AppConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn sale_summary_and_refused_overdraw() {
        let system = in_memory_system().await;
        let p = system
            .stock_client
            .create_product(
                &manager(),
                ProductCreate::new("SNK-001", "Potato Chips", "Snacks", 10, Decimal::from(10), 5),
            )
            .await
            .unwrap();

        system
            .stock_client
            .record_sale(&staff(), vec![SaleItem::new(p, 3, Decimal::from(10))], None)
            .await
            .unwrap();

        let product = system.stock_client.get_product(&staff(), p).await.unwrap();
        assert_eq!(product.quantity, 7);
        let sales = system.stock_client.list_sales(&staff()).await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].sale.total_price, Decimal::from(30));
        assert_eq!(sales[0].sku, "SNK-001");

        let summary = system
            .analytics_client
            .home_summary_on(&staff(), Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(summary.sales_count, 1);
        assert_eq!(summary.sales_revenue, Decimal::from(30));

        let err = system
            .stock_client
            .record_sale(&staff(), vec![SaleItem::new(p, 10, Decimal::from(10))], None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { available: 7, .. }));
        let product = system.stock_client.get_product(&staff(), p).await.unwrap();
        assert_eq!(product.quantity, 7);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn emptied_product_becomes_critical_and_out_of_stock() {
        let system = in_memory_system().await;
        let p = system
            .stock_client
            .create_product(
                &manager(),
                ProductCreate::new("BEV-003", "Iced Tea", "Beverages", 3, Decimal::from(20), 5),
            )
            .await
            .unwrap();
        system
            .stock_client
            .record_sale(&staff(), vec![SaleItem::new(p, 3, Decimal::from(20))], None)
            .await
            .unwrap();

        let predictions = system.analytics_client.predictions(&manager(), None).await.unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].priority, Priority::Critical);
        assert_eq!(predictions[0].recommended_order, 10);

        let empty = system.stock_client.out_of_stock(&manager()).await.unwrap();
        assert_eq!(empty.len(), 1);
        let low = system.stock_client.low_stock(&manager()).await.unwrap();
        assert_eq!(low[0].id, p);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn committed_state_survives_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            store: StoreConfig {
                path: Some(dir.path().join("ledger.json")),
                ..StoreConfig::default()
            },
            ..AppConfig::default()
        };

        let system = LedgerSystem::start(&config).await.unwrap();
        let p = system
            .stock_client
            .create_product(
                &manager(),
                ProductCreate::new("HOU-002", "Dish Soap", "Household", 12, Decimal::from(38), 4)
                    .with_supplier("CleanCo"),
            )
            .await
            .unwrap();
        let ids = system
            .stock_client
            .record_sale(&staff(), vec![SaleItem::new(p, 5, Decimal::from(38))], None)
            .await
            .unwrap();
        system.shutdown().await.unwrap();

        let system = LedgerSystem::start(&config).await.unwrap();
        let product = system.stock_client.get_product(&staff(), p).await.unwrap();
        assert_eq!(product.quantity, 7);
        assert_eq!(product.supplier.as_deref(), Some("CleanCo"));
        let sale = system.stock_client.get_sale(&staff(), ids[0]).await.unwrap();
        assert_eq!(sale.sale.total_price, Decimal::from(190));

        // Ids keep counting from where the previous run stopped.
        let next = system
            .stock_client
            .record_sale(&staff(), vec![SaleItem::new(p, 1, Decimal::from(38))], None)
            .await
            .unwrap();
        assert!(next[0] > ids[0]);
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failed_commit_leaves_the_ledger_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let store = LedgerStore::open(&StoreConfig {
            path: Some(path.clone()),
            ..StoreConfig::default()
        })
        .await
        .unwrap();
        let system = LedgerSystem::with_store(store, &AppConfig::default()).await.unwrap();
        let p = system
            .stock_client
            .create_product(
                &manager(),
                ProductCreate::new("CAN-002", "Sardines", "Canned Goods", 9, Decimal::from(22), 3),
            )
            .await
            .unwrap();

        // Removing the directory makes the next persist fail.
        drop(dir);

        let err = system
            .stock_client
            .record_sale(&staff(), vec![SaleItem::new(p, 2, Decimal::from(22))], None)
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::TransactionFailed);
        assert_eq!(err.to_string(), "Transaction failed");

        let snapshot = system.store().snapshot().await;
        assert_eq!(snapshot.product(p).unwrap().quantity, 9);
        assert_eq!(snapshot.sale_count(), 0);
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn user_directory_protects_the_default_admin() {
        let system = in_memory_system().await;
        let admin = system.admin();

        let users = system.user_client.list_users(&admin).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id_number, "ADMIN001");

        let err = system.user_client.delete_user(&admin, admin.user_id).await.unwrap_err();
        assert!(matches!(err, UserError::ValidationError(_)));

        let clerk = system
            .user_client
            .create_user(&admin, UserCreate::new("EMP010", "Mara Lim", Role::Staff))
            .await
            .unwrap();
        let err = system
            .user_client
            .create_user(&admin, UserCreate::new("EMP010", "Duplicate", Role::Staff))
            .await
            .unwrap_err();
        assert_eq!(err, UserError::AlreadyExists("EMP010".into()));

        let promoted = system
            .user_client
            .update_user(
                &admin,
                clerk,
                UserPatch {
                    role: Some(Role::Manager),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(promoted.identity(), Identity::new(clerk, Role::Manager));

        system.user_client.delete_user(&admin, clerk).await.unwrap();
        let err = system.user_client.get_user(&admin, clerk).await.unwrap_err();
        assert_eq!(err, UserError::NotFound(clerk.to_string()));

        system.shutdown().await.unwrap();
    }

    // --- Ledger invariant under arbitrary sale/reversal sequences ---

    #[derive(Debug, Clone)]
    enum Step {
        Sell(Vec<(usize, i64)>),
        Reverse(usize),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            3 => prop::collection::vec((0usize..3, 1i64..8), 1..4).prop_map(Step::Sell),
            1 => (0usize..16).prop_map(Step::Reverse),
        ]
    }

    async fn replay(initial: [i64; 3], steps: Vec<Step>) {
        let system = in_memory_system().await;
        let mut ids: Vec<ProductId> = Vec::new();
        for (index, quantity) in initial.iter().enumerate() {
            let product = ProductCreate::new(
                format!("SKU-{index}"),
                format!("Product {index}"),
                "General",
                *quantity,
                Decimal::from(5),
                2,
            );
            ids.push(system.stock_client.create_product(&manager(), product).await.unwrap());
        }

        let mut recorded: Vec<SaleId> = Vec::new();
        for step in steps {
            match step {
                Step::Sell(lines) => {
                    let items = lines
                        .iter()
                        .map(|(product, quantity)| SaleItem::new(ids[*product], *quantity, Decimal::from(5)))
                        .collect();
                    match system.stock_client.record_sale(&staff(), items, None).await {
                        Ok(new_ids) => recorded.extend(new_ids),
                        Err(e) => assert_eq!(e.code().as_str(), "insufficient_stock"),
                    }
                }
                Step::Reverse(pick) if !recorded.is_empty() => {
                    let id = recorded.remove(pick % recorded.len());
                    system.stock_client.reverse_sale(&staff(), id).await.unwrap();
                }
                Step::Reverse(_) => {}
            }

            let snapshot = system.store().snapshot().await;
            let mut sold: BTreeMap<ProductId, i64> = BTreeMap::new();
            for sale in snapshot.sales() {
                *sold.entry(sale.product_id).or_default() += sale.quantity;
            }
            for (index, id) in ids.iter().enumerate() {
                let quantity = snapshot.product(*id).unwrap().quantity;
                assert!(quantity >= 0);
                assert_eq!(quantity, initial[index] - sold.get(id).copied().unwrap_or_default());
            }
            assert_eq!(snapshot.sale_count(), recorded.len());
        }

        system.shutdown().await.unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn stock_always_matches_recorded_sales(
            initial in [0i64..20, 0i64..20, 0i64..20],
            steps in prop::collection::vec(step(), 1..24),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(replay(initial, steps));
        }
    }
}
