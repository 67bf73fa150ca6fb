use serde::{Deserialize, Serialize};

use crate::actor_framework::Table;
use crate::domain::{Product, ProductId, Sale, SaleId, SaleRecord};

use super::StoreError;

/// The two logical tables of the ledger. A committed `Tables` value is
/// immutable and shared with readers behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub(crate) products: Table<Product>,
    pub(crate) sales: Table<Sale>,
}

impl Tables {
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn sale(&self, id: SaleId) -> Option<&Sale> {
        self.sales.get(id)
    }

    /// Products in id (insertion) order.
    pub fn products(&self) -> impl DoubleEndedIterator<Item = &Product> + '_ {
        self.products.iter()
    }

    /// Sales in id (commit) order.
    pub fn sales(&self) -> impl DoubleEndedIterator<Item = &Sale> + '_ {
        self.sales.iter()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn sale_count(&self) -> usize {
        self.sales.len()
    }

    pub fn sales_for(&self, product_id: ProductId) -> impl Iterator<Item = &Sale> + '_ {
        self.sales.iter().filter(move |sale| sale.product_id == product_id)
    }

    // --- Catalog listings ---

    pub fn products_by_name(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        products
    }

    /// Products under their reorder point, emptiest first.
    pub fn low_stock(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products()
            .filter(|product| product.is_low_stock())
            .cloned()
            .collect();
        products.sort_by(|a, b| a.quantity.cmp(&b.quantity).then(a.id.cmp(&b.id)));
        products
    }

    pub fn out_of_stock(&self) -> Vec<Product> {
        self.products()
            .filter(|product| product.is_out_of_stock())
            .cloned()
            .collect()
    }

    /// Sales newest first, joined with product name and sku.
    pub fn sale_records(&self) -> Vec<SaleRecord> {
        let mut records: Vec<SaleRecord> = self
            .sales()
            .filter_map(|sale| self.sale_record(sale))
            .collect();
        records.sort_by(|a, b| {
            b.sale
                .sale_date
                .cmp(&a.sale.sale_date)
                .then(b.sale.id.cmp(&a.sale.id))
        });
        records
    }

    pub fn sale_record(&self, sale: &Sale) -> Option<SaleRecord> {
        let product = self.product(sale.product_id)?;
        Some(SaleRecord {
            sale: sale.clone(),
            product_name: product.name.clone(),
            sku: product.sku.clone(),
        })
    }

    // --- Persistence ---

    pub(crate) fn to_document(&self) -> LedgerDocument {
        LedgerDocument {
            next_product_id: self.products.next_id(),
            next_sale_id: self.sales.next_id(),
            products: self.products.iter().cloned().collect(),
            sales: self.sales.iter().cloned().collect(),
        }
    }

    pub(crate) fn from_document(document: LedgerDocument) -> Result<Self, StoreError> {
        let products = Table::from_rows(document.products, document.next_product_id);
        if let Some(orphan) = document
            .sales
            .iter()
            .find(|sale| !products.contains(sale.product_id))
        {
            return Err(StoreError::Corrupt(format!(
                "sale {} references missing product {}",
                orphan.id, orphan.product_id
            )));
        }
        if let Some(product) = products.iter().find(|product| product.quantity < 0) {
            return Err(StoreError::Corrupt(format!(
                "product {} has negative quantity {}",
                product.id, product.quantity
            )));
        }
        Ok(Self {
            products,
            sales: Table::from_rows(document.sales, document.next_sale_id),
        })
    }
}

/// On-disk layout: the two tables plus their id counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LedgerDocument {
    pub next_product_id: u64,
    pub next_sale_id: u64,
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
}
