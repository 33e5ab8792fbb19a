use hmg_common::Money;
use thiserror::Error;

use crate::{
    db_types::{Caller, OrderId, OrderStatusType, ProductId, Role, UserId},
    traits::{DirectoryError, OrderEngineError, OrderQueryError, StockLedgerError},
};

/// The error type for everything the order APIs expose. Each failure carries enough structure for the
/// caller to act on: which product ran short, whose order was touched, which transition was refused.
/// Nothing here is retried automatically.
#[derive(Debug, Clone, Error)]
pub enum OrderManagerError {
    #[error("Invalid cart: {0}")]
    InvalidCart(#[from] CartValidationError),
    #[error("Insufficient stock for {product_id}: {requested} requested, but only {available} available")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },
    #[error("Product {0} is not in the stock ledger")]
    ProductNotFound(ProductId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("{role} {user_id} is not permitted to act on order {order_id}")]
    Forbidden {
        order_id: OrderId,
        user_id: UserId,
        role: Role,
    },
    #[error("{role} {user_id} is not authorized for this operation")]
    NotAuthorized { user_id: UserId, role: Role },
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
    },
    #[error("Could not attach buyer details to the order: {0}")]
    ContactLookup(#[from] DirectoryError),
    #[error("User error constructing query: {0}")]
    QueryError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl OrderManagerError {
    pub fn forbidden(order_id: &OrderId, caller: &Caller) -> Self {
        OrderManagerError::Forbidden {
            order_id: order_id.clone(),
            user_id: caller.user_id.clone(),
            role: caller.role,
        }
    }
}

/// A malformed cart or order request. These are caller mistakes and are rejected before any stock is
/// touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartValidationError {
    #[error("The cart has no line items")]
    EmptyCart,
    #[error("Quantity for {product_id} must be at least 1, but the cart asks for {quantity}")]
    BadQuantity { product_id: ProductId, quantity: i64 },
    #[error("Unit price for {product_id} may not be negative")]
    NegativePrice { product_id: ProductId },
    #[error("The declared total {declared} does not match the cart total {computed}")]
    TotalMismatch { declared: Money, computed: Money },
    #[error("A payment reference is required")]
    MissingPaymentRef,
}

impl From<StockLedgerError> for OrderManagerError {
    fn from(e: StockLedgerError) -> Self {
        match e {
            StockLedgerError::DatabaseError(s) => OrderManagerError::DatabaseError(s),
            StockLedgerError::InsufficientStock { product_id, available, requested } => {
                OrderManagerError::InsufficientStock { product_id, available, requested }
            },
            StockLedgerError::ProductNotFound(product_id) => OrderManagerError::ProductNotFound(product_id),
            StockLedgerError::InvalidQuantity { product_id, quantity } => {
                OrderManagerError::InvalidCart(CartValidationError::BadQuantity { product_id, quantity })
            },
        }
    }
}

impl From<OrderEngineError> for OrderManagerError {
    fn from(e: OrderEngineError) -> Self {
        match e {
            OrderEngineError::DatabaseError(s) => OrderManagerError::DatabaseError(s),
            OrderEngineError::OrderAlreadyExists(order_id) => OrderManagerError::OrderAlreadyExists(order_id),
        }
    }
}

impl From<OrderQueryError> for OrderManagerError {
    fn from(e: OrderQueryError) -> Self {
        match e {
            OrderQueryError::DatabaseError(s) => OrderManagerError::DatabaseError(s),
            OrderQueryError::QueryError(s) => OrderManagerError::QueryError(s),
        }
    }
}
