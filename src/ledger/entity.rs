use std::convert::Infallible;

use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{NewSale, Product, ProductCreate, ProductId, ProductPatch, Sale, SaleId};

impl Entity for Product {
    type Id = ProductId;
    type CreatePayload = ProductCreate;
    type Patch = ProductPatch;
    const KIND: &'static str = "product";

    fn id(&self) -> ProductId {
        self.id
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.sku)
    }

    /// Creates a catalog entry stamped with the current time.
    fn from_create(id: ProductId, params: ProductCreate) -> Result<Self, String> {
        params.validate()?;
        Ok(Self {
            id,
            sku: params.sku,
            name: params.name,
            category: params.category,
            quantity: params.quantity,
            price: params.price,
            reorder_point: params.reorder_point,
            supplier: params.supplier,
            created_at: Utc::now(),
        })
    }

    /// Applies a catalog edit. The patch is validated as a whole first so a
    /// rejected edit leaves the row untouched.
    fn on_update(&mut self, patch: ProductPatch) -> Result<(), String> {
        patch.validate()?;
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(reorder_point) = patch.reorder_point {
            self.reorder_point = reorder_point;
        }
        if let Some(supplier) = patch.supplier {
            self.supplier = supplier;
        }
        Ok(())
    }
}

impl Entity for Sale {
    type Id = SaleId;
    type CreatePayload = NewSale;
    // Sales are immutable: no patch value can be constructed.
    type Patch = Infallible;
    const KIND: &'static str = "sale";

    fn id(&self) -> SaleId {
        self.id
    }

    fn from_create(id: SaleId, params: NewSale) -> Result<Self, String> {
        if params.quantity <= 0 {
            return Err(format!("quantity must be positive, got {}", params.quantity));
        }
        Ok(Self {
            id,
            product_id: params.product_id,
            quantity: params.quantity,
            total_price: params.total_price,
            sale_date: params.sale_date,
            user_id: params.user_id,
        })
    }

    fn on_update(&mut self, patch: Infallible) -> Result<(), String> {
        match patch {}
    }
}
