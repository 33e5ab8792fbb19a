use thiserror::Error;

use crate::db_types::{ProductId, StockLevel};

#[derive(Debug, Clone, Error)]
pub enum StockLedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Insufficient stock for {product_id}: {requested} requested, but only {available} available")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },
    #[error("Product {0} is not in the stock ledger")]
    ProductNotFound(ProductId),
    #[error("Stock adjustments must be positive. {product_id} was adjusted by {quantity}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },
}

impl From<sqlx::Error> for StockLedgerError {
    fn from(e: sqlx::Error) -> Self {
        StockLedgerError::DatabaseError(e.to_string())
    }
}

/// The `StockManagement` trait defines the behaviour of the stock ledger.
///
/// The ledger holds one available-quantity record per product. The catalog collaborator owns the rest of
/// the product record; this engine only ever moves `available_quantity`, and only through the conditional
/// operations below. `available_quantity` never goes negative: a reservation that would overdraw the
/// ledger fails without side effect.
#[allow(async_fn_in_trait)]
pub trait StockManagement {
    /// Atomically checks that at least `quantity` units are available and decrements the count, as a
    /// single conditional update. There is no separate read-then-write step, so concurrent reservations
    /// of the last units cannot oversell.
    ///
    /// Fails with [`StockLedgerError::InsufficientStock`] (carrying the quantity that was available at
    /// that point) if the guard does not hold, and [`StockLedgerError::ProductNotFound`] if the product
    /// has no ledger record.
    async fn reserve_stock(&self, product_id: &ProductId, quantity: i64) -> Result<(), StockLedgerError>;

    /// Atomically returns `quantity` units to the ledger. Used to compensate reservations when a later
    /// step of order creation fails.
    async fn release_stock(&self, product_id: &ProductId, quantity: i64) -> Result<(), StockLedgerError>;

    /// Fetches the current ledger record for the product, or `None` if the product is unknown.
    async fn fetch_stock_level(&self, product_id: &ProductId) -> Result<Option<StockLevel>, StockLedgerError>;

    /// Sets the absolute available quantity for a product, creating the ledger record if necessary.
    /// This is the entry point for catalog synchronisation and restocking. It is not part of the
    /// reservation flow.
    async fn set_stock_level(&self, product_id: &ProductId, quantity: i64) -> Result<StockLevel, StockLedgerError>;
}
