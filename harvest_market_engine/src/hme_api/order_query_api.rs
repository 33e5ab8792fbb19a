//! Unified API for reading orders.

use std::fmt::Debug;

use hmg_common::INR_CURRENCY_CODE;
use log::{debug, trace};

use crate::{
    db_types::{Caller, Order, OrderId, Role, UserId},
    hme_api::{
        access,
        errors::OrderManagerError,
        order_objects::{InvoiceOrder, OrderQueryFilter, ProjectedOrder},
    },
    traits::{BuyerDirectory, OrderManagement},
};

/// The `OrderQueryApi` is the read side of the engine: single-order fetches, the buyer and supplier
/// listings, the administrative search, and invoice resolution. Everything handed out here has passed
/// through the role-scoped projector, except the buyer listing (the buyer's own data by construction)
/// and invoice resolution, which deliberately returns the complete order.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi ({:?})", self.db)
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches a single order and projects it for the caller. An unknown id is `OrderNotFound`; an
    /// order the caller has no right to see is `Forbidden`.
    pub async fn fetch_order(&self, order_id: &OrderId, caller: &Caller) -> Result<ProjectedOrder, OrderManagerError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderManagerError::OrderNotFound(order_id.clone()))?;
        access::project_order(&order, caller).ok_or_else(|| OrderManagerError::forbidden(order_id, caller))
    }

    /// All orders placed by the buyer, newest first, in full.
    pub async fn orders_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>, OrderManagerError> {
        let orders = self.db.fetch_orders_for_buyer(buyer_id).await?;
        trace!("🔍️ {} orders found for buyer {buyer_id}", orders.len());
        Ok(orders)
    }

    /// All orders carrying the producer's line items, newest first, each cut down to those line items.
    pub async fn orders_for_producer(&self, producer_id: &UserId) -> Result<Vec<ProjectedOrder>, OrderManagerError> {
        let caller = Caller { user_id: producer_id.clone(), role: Role::Producer };
        let orders = self.db.fetch_orders_for_producer(producer_id).await?;
        trace!("🔍️ {} orders found for producer {producer_id}", orders.len());
        let projected = orders.iter().filter_map(|order| access::project_order(order, &caller)).collect();
        Ok(projected)
    }

    /// Fetches orders matching the filter. This is a back-office query: the results are complete
    /// orders with nothing filtered out, so only administrators may run it.
    pub async fn search_orders(
        &self,
        query: OrderQueryFilter,
        caller: &Caller,
    ) -> Result<Vec<Order>, OrderManagerError> {
        if caller.role != Role::Admin {
            return Err(OrderManagerError::NotAuthorized { user_id: caller.user_id.clone(), role: caller.role });
        }
        trace!("🔍️ Searching orders. {query}");
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    /// Resolves the order for invoicing: the complete, unfiltered order plus the buyer's contact
    /// details from the directory. The renderer downstream needs the whole order, so this is limited
    /// to the purchasing buyer and administrators rather than handing a supplier a filtered one.
    pub async fn invoice_order<D: BuyerDirectory>(
        &self,
        order_id: &OrderId,
        caller: &Caller,
        directory: &D,
    ) -> Result<InvoiceOrder, OrderManagerError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderManagerError::OrderNotFound(order_id.clone()))?;
        let allowed = caller.role == Role::Admin || (caller.role == Role::Buyer && order.belongs_to(&caller.user_id));
        if !allowed {
            return Err(OrderManagerError::forbidden(order_id, caller));
        }
        let buyer = directory.fetch_contact(&order.buyer_id).await?;
        debug!("🔍️ Order [{order_id}] resolved for invoicing");
        Ok(InvoiceOrder { order, buyer, currency: INR_CURRENCY_CODE.into() })
    }
}
