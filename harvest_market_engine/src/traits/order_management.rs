use thiserror::Error;

use crate::{
    db_types::{Order, OrderId, UserId},
    order_objects::OrderQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum OrderQueryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderQueryError {
    fn from(e: sqlx::Error) -> Self {
        OrderQueryError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait provides methods for querying orders.
///
/// All methods return fully assembled [`Order`] records, with line items in insertion order and the
/// tracking history oldest first. Role-scoping is not applied here; that is the job of the view
/// projector in the API layer, which runs before anything leaves the system boundary.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given order id. If no such order exists, `None` is returned.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError>;

    /// Fetches all orders placed by the given buyer, newest first.
    async fn fetch_orders_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>, OrderQueryError>;

    /// Fetches all orders containing at least one line item owned by the given producer, newest first.
    /// The orders are returned in full; callers wanting the supplier-scoped view must project them.
    async fn fetch_orders_for_producer(&self, producer_id: &UserId) -> Result<Vec<Order>, OrderQueryError>;

    /// Fetches orders according to the criteria in the `OrderQueryFilter`, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError>;
}
