use tokio::sync::oneshot;

use crate::domain::{Product, ProductCreate, ProductId, ProductPatch, SaleId, SaleRequest};
use crate::error::LedgerError;

pub type ServiceResult<T> = std::result::Result<T, LedgerError>;
pub type ServiceResponse<T> = oneshot::Sender<ServiceResult<T>>;

/// Writes handled by the stock service. Each variant carries its parameters
/// and a oneshot channel for the outcome.
#[derive(Debug)]
pub enum StockRequest {
    RecordSale {
        sale: SaleRequest,
        respond_to: ServiceResponse<Vec<SaleId>>,
    },
    ReverseSale {
        id: SaleId,
        respond_to: ServiceResponse<()>,
    },
    CreateProduct {
        product: ProductCreate,
        respond_to: ServiceResponse<ProductId>,
    },
    UpdateProduct {
        id: ProductId,
        patch: ProductPatch,
        respond_to: ServiceResponse<Product>,
    },
    DeleteProduct {
        id: ProductId,
        respond_to: ServiceResponse<()>,
    },
    Shutdown,
}
