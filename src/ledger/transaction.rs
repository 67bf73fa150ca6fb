use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

use crate::domain::{NewSale, Product, ProductCreate, ProductId, ProductPatch, Sale, SaleId};

use super::{LedgerStore, StoreError, Tables};

/// An open unit of work. Holds the writer lock for its whole lifetime.
///
/// All mutations go to a private staged copy; `commit` publishes it in one
/// step. Dropping the handle without committing is a rollback.
pub struct Transaction {
    id: u64,
    store: LedgerStore,
    staged: Tables,
    _writer: OwnedMutexGuard<()>,
    finished: bool,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Transaction {
    pub(super) fn new(
        id: u64,
        store: LedgerStore,
        writer: OwnedMutexGuard<()>,
        staged: Tables,
    ) -> Self {
        Self {
            id,
            store,
            staged,
            _writer: writer,
            finished: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The staged state, including this transaction's own writes.
    pub fn tables(&self) -> &Tables {
        &self.staged
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.staged.product(id)
    }

    pub fn get_sale(&self, id: SaleId) -> Option<&Sale> {
        self.staged.sale(id)
    }

    // --- Ledger primitives ---

    pub fn insert_sale(&mut self, sale: NewSale) -> Result<SaleId, StoreError> {
        if !self.staged.products.contains(sale.product_id) {
            return Err(StoreError::ForeignKey {
                product_id: sale.product_id,
            });
        }
        Ok(self.staged.sales.create(sale)?)
    }

    /// `quantity += delta`, returning the new quantity. Non-negativity is the
    /// caller's concern.
    pub fn adjust_product_quantity(
        &mut self,
        id: ProductId,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let product = self.staged.products.get_mut(id)?;
        product.quantity = product
            .quantity
            .checked_add(delta)
            .ok_or_else(|| StoreError::Rejected {
                kind: "product",
                reason: format!("quantity overflow applying {delta} to product {id}"),
            })?;
        Ok(product.quantity)
    }

    pub fn delete_sale(&mut self, id: SaleId) -> Result<Sale, StoreError> {
        Ok(self.staged.sales.remove(id)?)
    }

    // --- Catalog primitives ---

    pub fn insert_product(&mut self, product: ProductCreate) -> Result<ProductId, StoreError> {
        Ok(self.staged.products.create(product)?)
    }

    pub fn update_product(
        &mut self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError> {
        Ok(self.staged.products.update(id, patch)?.clone())
    }

    /// Refused while any sale still references the product.
    pub fn delete_product(&mut self, id: ProductId) -> Result<Product, StoreError> {
        let sales = self.staged.sales_for(id).count();
        if sales > 0 {
            return Err(StoreError::Referenced {
                product_id: id,
                sales,
            });
        }
        Ok(self.staged.products.remove(id)?)
    }

    // --- Completion ---

    pub async fn commit(mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        let result = self.store.publish(staged).await;
        self.finished = true;
        match &result {
            Ok(()) => debug!(tx = self.id, "Transaction committed"),
            Err(e) => warn!(tx = self.id, error = %e, "Commit failed, nothing published"),
        }
        result
    }

    pub fn rollback(mut self) {
        self.finished = true;
        debug!(tx = self.id, "Transaction rolled back");
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.finished {
            warn!(tx = self.id, "Transaction dropped before completion, rolled back");
        }
    }
}
