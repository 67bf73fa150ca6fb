use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, instrument, warn};

use crate::domain::{
    Identity, Product, ProductCreate, ProductId, ProductPatch, SaleId, SaleItem, SaleRecord,
    SaleRequest,
};
use crate::error::LedgerError;
use crate::ledger::LedgerStore;
use crate::policy::{AccessGate, Operation};
use crate::stock_actor::StockRequest;

/// Client for the stock service. Writes go through the service's channel;
/// catalog and sales reads come straight from a committed snapshot.
#[derive(Clone)]
pub struct StockClient {
    sender: mpsc::Sender<StockRequest>,
    store: LedgerStore,
    gate: AccessGate,
    request_timeout: Duration,
}

request_method!(StockClient => fn send_record_sale(sale: SaleRequest) -> Vec<SaleId> as StockRequest::RecordSale);
request_method!(StockClient => fn send_reverse_sale(id: SaleId) -> () as StockRequest::ReverseSale);
request_method!(StockClient => fn send_create_product(product: ProductCreate) -> ProductId as StockRequest::CreateProduct);
request_method!(StockClient => fn send_update_product(id: ProductId, patch: ProductPatch) -> Product as StockRequest::UpdateProduct);
request_method!(StockClient => fn send_delete_product(id: ProductId) -> () as StockRequest::DeleteProduct);

impl StockClient {
    pub fn new(
        sender: mpsc::Sender<StockRequest>,
        store: LedgerStore,
        gate: AccessGate,
        request_timeout: Duration,
    ) -> Self {
        Self {
            sender,
            store,
            gate,
            request_timeout,
        }
    }

    // --- Ledger writes ---

    /// Sells every item or none of them. Returns the new sale ids in input
    /// order. `sale_date` defaults to the commit time.
    #[instrument(fields(user_id = %identity.user_id, items = items.len()), skip(self, identity, items))]
    pub async fn record_sale(
        &self,
        identity: &Identity,
        items: Vec<SaleItem>,
        sale_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<SaleId>, LedgerError> {
        self.gate.authorize(identity, Operation::RecordSale)?;
        debug!("Sending request");
        self.send_record_sale(SaleRequest {
            items,
            sale_date,
            actor: identity.user_id,
        })
        .await
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn reverse_sale(&self, identity: &Identity, id: SaleId) -> Result<(), LedgerError> {
        self.gate.authorize(identity, Operation::RecordSale)?;
        debug!("Sending request");
        self.send_reverse_sale(id).await
    }

    // --- Catalog writes ---

    #[instrument(fields(user_id = %identity.user_id, sku = %product.sku), skip(self, identity, product))]
    pub async fn create_product(
        &self,
        identity: &Identity,
        product: ProductCreate,
    ) -> Result<ProductId, LedgerError> {
        self.gate.authorize(identity, Operation::ManageCatalog)?;
        debug!("Sending request");
        self.send_create_product(product).await
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity, patch))]
    pub async fn update_product(
        &self,
        identity: &Identity,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, LedgerError> {
        self.gate.authorize(identity, Operation::ManageCatalog)?;
        debug!("Sending request");
        self.send_update_product(id, patch).await
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn delete_product(&self, identity: &Identity, id: ProductId) -> Result<(), LedgerError> {
        self.gate.authorize(identity, Operation::ManageCatalog)?;
        debug!("Sending request");
        self.send_delete_product(id).await
    }

    // --- Snapshot reads ---

    /// Every product, ordered by name. Open to any identity.
    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn list_products(&self, identity: &Identity) -> Vec<Product> {
        self.store.snapshot().await.products_by_name()
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn get_product(&self, identity: &Identity, id: ProductId) -> Result<Product, LedgerError> {
        self.store
            .snapshot()
            .await
            .product(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("product {id}")))
    }

    /// Products below their reorder point, emptiest first.
    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn low_stock(&self, identity: &Identity) -> Result<Vec<Product>, LedgerError> {
        self.gate.authorize(identity, Operation::ManageLowStockAlerts)?;
        Ok(self.store.snapshot().await.low_stock())
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn out_of_stock(&self, identity: &Identity) -> Result<Vec<Product>, LedgerError> {
        self.gate.authorize(identity, Operation::ManageLowStockAlerts)?;
        Ok(self.store.snapshot().await.out_of_stock())
    }

    /// Sales newest first, with the product's current name and sku.
    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn list_sales(&self, identity: &Identity) -> Result<Vec<SaleRecord>, LedgerError> {
        self.gate.authorize(identity, Operation::ViewSales)?;
        Ok(self.store.snapshot().await.sale_records())
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn get_sale(&self, identity: &Identity, id: SaleId) -> Result<SaleRecord, LedgerError> {
        self.gate.authorize(identity, Operation::ViewSales)?;
        let snapshot = self.store.snapshot().await;
        snapshot
            .sale(id)
            .and_then(|sale| snapshot.sale_record(sale))
            .ok_or_else(|| LedgerError::NotFound(format!("sale {id}")))
    }

    /// Asks the service to stop after the requests already queued.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), LedgerError> {
        debug!("Sending shutdown");
        self.sender.send(StockRequest::Shutdown).await.map_err(|_| {
            error!("Service already closed");
            LedgerError::TransactionFailed
        })
    }
}
