use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::clients::StockClient;
use crate::domain::{
    NewSale, ProductCreate, ProductId, ProductPatch, Sale, SaleId, SaleItem, SaleRequest,
};
use crate::error::LedgerError;
use crate::ledger::{LedgerStore, StoreError, Transaction};
use crate::policy::AccessGate;

use super::{ServiceResponse, ServiceResult, StockRequest};

/// Single writer over the ledger. Requests are handled strictly one after
/// another, and each one runs inside exactly one store transaction.
pub struct StockService {
    receiver: mpsc::Receiver<StockRequest>,
    store: LedgerStore,
}

impl StockService {
    pub fn new(
        buffer_size: usize,
        request_timeout: Duration,
        store: LedgerStore,
        gate: AccessGate,
    ) -> (Self, StockClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let client = StockClient::new(sender, store.clone(), gate, request_timeout);
        let service = Self { receiver, store };
        (service, client)
    }

    #[instrument(name = "stock_service", skip(self))]
    pub async fn run(mut self) {
        info!("StockService starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StockRequest::RecordSale { sale, respond_to } => {
                    self.handle_record_sale(sale, respond_to).await;
                }
                StockRequest::ReverseSale { id, respond_to } => {
                    self.handle_reverse_sale(id, respond_to).await;
                }
                StockRequest::CreateProduct {
                    product,
                    respond_to,
                } => {
                    self.handle_create_product(product, respond_to).await;
                }
                StockRequest::UpdateProduct {
                    id,
                    patch,
                    respond_to,
                } => {
                    self.handle_update_product(id, patch, respond_to).await;
                }
                StockRequest::DeleteProduct { id, respond_to } => {
                    self.handle_delete_product(id, respond_to).await;
                }
                StockRequest::Shutdown => {
                    info!("StockService shutting down");
                    break;
                }
            }
        }
        info!("StockService stopped");
    }

    #[instrument(fields(items = sale.items.len(), actor = %sale.actor), skip(self, sale, respond_to))]
    async fn handle_record_sale(
        &self,
        sale: SaleRequest,
        respond_to: ServiceResponse<Vec<SaleId>>,
    ) {
        debug!("Processing record_sale request");

        let result = match sale.validate() {
            Err(reason) => Err(LedgerError::Validation(reason)),
            Ok(()) => {
                let sale_date = sale.sale_date.unwrap_or_else(Utc::now);
                self.in_transaction(&respond_to, |tx| apply_sale(tx, &sale, sale_date))
                    .await
            }
        };

        match &result {
            Ok(ids) => info!(sale_ids = ?ids, "Sale recorded"),
            Err(e) => warn!(code = %e.code(), error = %e, "Sale rejected"),
        }
        let _ = respond_to.send(result);
    }

    #[instrument(fields(sale_id = %id), skip(self, respond_to))]
    async fn handle_reverse_sale(&self, id: SaleId, respond_to: ServiceResponse<()>) {
        debug!("Processing reverse_sale request");

        let result = self
            .in_transaction(&respond_to, |tx| apply_reversal(tx, id))
            .await;

        let result = match result {
            Ok(sale) => {
                info!(
                    product_id = %sale.product_id,
                    restored = sale.quantity,
                    "Sale reversed, stock restored"
                );
                Ok(())
            }
            Err(e) => {
                warn!(code = %e.code(), error = %e, "Reversal rejected");
                Err(e)
            }
        };
        let _ = respond_to.send(result);
    }

    #[instrument(fields(sku = %product.sku), skip(self, product, respond_to))]
    async fn handle_create_product(
        &self,
        product: ProductCreate,
        respond_to: ServiceResponse<ProductId>,
    ) {
        debug!("Processing create_product request");

        let result = match product.validate() {
            Err(reason) => Err(LedgerError::Validation(reason)),
            Ok(()) => {
                self.in_transaction(&respond_to, |tx| Ok(tx.insert_product(product)?))
                    .await
            }
        };

        match &result {
            Ok(id) => info!(product_id = %id, "Product created"),
            Err(e) => warn!(code = %e.code(), error = %e, "Product creation rejected"),
        }
        let _ = respond_to.send(result);
    }

    #[instrument(fields(product_id = %id), skip(self, patch, respond_to))]
    async fn handle_update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
        respond_to: ServiceResponse<crate::domain::Product>,
    ) {
        debug!("Processing update_product request");

        let result = match patch.validate() {
            Err(reason) => Err(LedgerError::Validation(reason)),
            Ok(()) => {
                self.in_transaction(&respond_to, |tx| Ok(tx.update_product(id, patch)?))
                    .await
            }
        };

        match &result {
            Ok(product) => info!(price = %product.price, reorder_point = product.reorder_point, "Product updated"),
            Err(e) => warn!(code = %e.code(), error = %e, "Product update rejected"),
        }
        let _ = respond_to.send(result);
    }

    #[instrument(fields(product_id = %id), skip(self, respond_to))]
    async fn handle_delete_product(&self, id: ProductId, respond_to: ServiceResponse<()>) {
        debug!("Processing delete_product request");

        let result = self
            .in_transaction(&respond_to, |tx| Ok(tx.delete_product(id).map(|_| ())?))
            .await;

        match &result {
            Ok(()) => info!("Product deleted"),
            Err(e) => warn!(code = %e.code(), error = %e, "Product deletion rejected"),
        }
        let _ = respond_to.send(result);
    }

    /// Runs `work` against a fresh transaction. Any error rolls back before
    /// it is returned; so does a caller that stopped waiting for the reply.
    async fn in_transaction<T, R>(
        &self,
        respond_to: &ServiceResponse<R>,
        work: impl FnOnce(&mut Transaction) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let mut tx = self.store.begin().await?;
        let value = match work(&mut tx) {
            Ok(value) => value,
            Err(e) => {
                tx.rollback();
                return Err(e);
            }
        };
        if respond_to.is_closed() {
            warn!(tx = tx.id(), "Caller went away before commit, rolling back");
            tx.rollback();
            return Err(LedgerError::TransactionFailed);
        }
        tx.commit().await?;
        Ok(value)
    }
}

/// Inserts one sale row per item and takes the units out of stock. Stock is
/// checked only after every delta is applied, so several items drawing on
/// the same product are judged together.
fn apply_sale(
    tx: &mut Transaction,
    sale: &SaleRequest,
    sale_date: DateTime<Utc>,
) -> ServiceResult<Vec<SaleId>> {
    let mut available: BTreeMap<ProductId, i64> = BTreeMap::new();
    let mut ids = Vec::with_capacity(sale.items.len());

    for (index, item) in sale.items.iter().enumerate() {
        let on_hand = tx
            .product(item.product_id)
            .map(|product| product.quantity)
            .ok_or_else(|| unknown_product(index, item))?;
        available.entry(item.product_id).or_insert(on_hand);
        let total_price = item.total_price().ok_or_else(|| {
            LedgerError::Validation(format!("item {index}: total is out of range"))
        })?;

        let id = tx
            .insert_sale(NewSale {
                product_id: item.product_id,
                quantity: item.quantity,
                total_price,
                sale_date,
                user_id: sale.actor,
            })
            .map_err(|e| item_failure(index, item, e))?;
        tx.adjust_product_quantity(item.product_id, -item.quantity)
            .map_err(|e| item_failure(index, item, e))?;
        ids.push(id);
    }

    for (index, item) in sale.items.iter().enumerate() {
        let remaining = tx.product(item.product_id).map_or(0, |product| product.quantity);
        if remaining < 0 {
            return Err(LedgerError::InsufficientStock {
                item: index,
                product_id: item.product_id,
                requested: sale.units_for(item.product_id),
                available: available.get(&item.product_id).copied().unwrap_or_default(),
            });
        }
    }

    Ok(ids)
}

/// Exact compensation of a recorded sale.
fn apply_reversal(tx: &mut Transaction, id: SaleId) -> ServiceResult<Sale> {
    let sale = tx
        .get_sale(id)
        .cloned()
        .ok_or_else(|| LedgerError::NotFound(format!("sale {id}")))?;
    tx.adjust_product_quantity(sale.product_id, sale.quantity)?;
    tx.delete_sale(id)?;
    Ok(sale)
}

fn unknown_product(index: usize, item: &SaleItem) -> LedgerError {
    LedgerError::NotFound(format!("product {} (item {index})", item.product_id))
}

fn item_failure(index: usize, item: &SaleItem, err: StoreError) -> LedgerError {
    match err {
        StoreError::ForeignKey { .. } | StoreError::NotFound { .. } => {
            unknown_product(index, item)
        }
        other => other.into(),
    }
}
