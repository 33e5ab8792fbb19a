use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::{OrderManagement, StockManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the Harvest Market engine.
///
/// This behaviour includes:
/// * The atomic stock ledger operations, via [`StockManagement`].
/// * Order queries, via [`OrderManagement`].
/// * Atomic order insertion and the conditional status update that serialises transitions per order.
#[allow(async_fn_in_trait)]
pub trait OrderEngineDatabase: Clone + OrderManagement + StockManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a new order and, in a single atomic transaction, stores the order record, its line items,
    /// and the initial `Placed` tracking entry. Stock is *not* touched here; reservations happen before
    /// this call, and the caller compensates them if the insert fails.
    ///
    /// Returns the order as persisted.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderEngineError>;

    /// Conditionally moves the order from `expected` to `new_status`, and appends a tracking entry, in a
    /// single atomic transaction. The update is keyed on the expected current status, so two racing
    /// transitions on the same order cannot both apply: the loser matches zero rows.
    ///
    /// Returns the updated order, or `None` (with nothing written) if the order does not exist or its
    /// status is no longer `expected`. The caller decides what that means; this layer does not.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        expected: &OrderStatusType,
        new_status: &OrderStatusType,
    ) -> Result<Option<Order>, OrderEngineError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderEngineError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderEngineError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
}

impl From<sqlx::Error> for OrderEngineError {
    fn from(e: sqlx::Error) -> Self {
        OrderEngineError::DatabaseError(e.to_string())
    }
}
