use std::fmt::Display;

use chrono::{DateTime, Utc};
use hmg_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{LineItem, Order, OrderId, OrderStatusType, ProductId, TrackingEntry, UserId},
    traits::{BuyerContact, OrderQueryError},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub buyer_id: Option<UserId>,
    pub supplier_id: Option<UserId>,
    pub product_id: Option<ProductId>,
    pub payment_ref: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_buyer_id(mut self, buyer_id: UserId) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    /// Restricts the search to orders carrying at least one line item owned by this producer.
    pub fn with_supplier_id(mut self, supplier_id: UserId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    /// Restricts the search to orders carrying the given product.
    pub fn with_product_id(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_payment_ref(mut self, payment_ref: String) -> Self {
        self.payment_ref = Some(payment_ref);
        self
    }

    pub fn since<T>(mut self, since: T) -> Result<Self, OrderQueryError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| OrderQueryError::QueryError(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, OrderQueryError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| OrderQueryError::QueryError(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    /// True when the filter carries no effective criteria. An empty status list counts as no filter.
    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.buyer_id.is_none() &&
            self.supplier_id.is_none() &&
            self.product_id.is_none() &&
            self.payment_ref.is_none() &&
            self.status.as_ref().map_or(true, Vec::is_empty) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(buyer_id) = &self.buyer_id {
            write!(f, "buyer_id: {buyer_id}. ")?;
        }
        if let Some(supplier_id) = &self.supplier_id {
            write!(f, "supplier_id: {supplier_id}. ")?;
        }
        if let Some(product_id) = &self.product_id {
            write!(f, "product_id: {product_id}. ")?;
        }
        if let Some(payment_ref) = &self.payment_ref {
            write!(f, "payment_ref: {payment_ref}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

/// An order as a specific caller is allowed to see it. The underlying record is never handed out
/// directly; this copy is what crosses the system boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedOrder {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub line_items: Vec<LineItem>,
    pub total_amount: Money,
    pub payment_ref: String,
    pub status: OrderStatusType,
    pub tracking_history: Vec<TrackingEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectedOrder {
    /// The unfiltered view: every line item, as stored.
    pub fn full(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            buyer_id: order.buyer_id.clone(),
            line_items: order.line_items.clone(),
            total_amount: order.total_amount,
            payment_ref: order.payment_ref.clone(),
            status: order.status.clone(),
            tracking_history: order.tracking_history.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }

    /// The supplier view: only the line items the supplier owns. `total_amount` still reflects the
    /// whole order, not the filtered subset.
    pub fn for_supplier(order: &Order, supplier: &UserId) -> Self {
        let line_items = order.line_items.iter().filter(|li| &li.owner_id == supplier).cloned().collect();
        Self { line_items, ..Self::full(order) }
    }
}

/// A fully resolved order ready for the invoice renderer: the complete, unfiltered order with the
/// buyer's contact details attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceOrder {
    pub order: Order,
    pub buyer: BuyerContact,
    /// ISO 4217 code for every amount on the invoice.
    pub currency: String,
}
