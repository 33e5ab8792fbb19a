use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Caller, NewOrder, Order, OrderId, OrderStatusType, ProductId},
    events::{EventProducers, OrderPlacedEvent, OrderStatusChangedEvent},
    hme_api::{
        access,
        errors::{CartValidationError, OrderManagerError},
        order_objects::ProjectedOrder,
    },
    traits::OrderEngineDatabase,
};

/// `OrderFlowApi` is the write side of the engine: it creates orders from carts and drives them through
/// the status lifecycle.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderEngineDatabase
{
    /// Creates an order from a cart.
    ///
    /// The cart is validated first; nothing is reserved for a malformed request. Then stock is reserved
    /// line by line, in the cart's order, each reservation being a single atomic conditional decrement.
    /// The successful reservations form an undo list. If any line cannot be covered, every reservation
    /// on the list is returned to the ledger and the call fails with `InsufficientStock` telling the
    /// caller which product ran short and how much was available. No order record is written in that
    /// case.
    ///
    /// Once all lines are reserved, the order is persisted atomically with status `Placed` and a single
    /// initial tracking entry. If that write fails, the reservations are likewise returned before the
    /// error is surfaced, so reserved stock never outlives a failed request.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, OrderManagerError> {
        validate_cart(&order)?;
        let order_id = order.order_id.clone();
        let mut undo_list: Vec<(ProductId, i64)> = Vec::with_capacity(order.items.len());
        for line in &order.items {
            match self.db.reserve_stock(&line.product_id, line.quantity).await {
                Ok(()) => undo_list.push((line.product_id.clone(), line.quantity)),
                Err(e) => {
                    info!(
                        "🛒️ Order [{order_id}] could not reserve {} units of {}. Rolling back {} earlier \
                         reservations. {e}",
                        line.quantity,
                        line.product_id,
                        undo_list.len()
                    );
                    self.release_reservations(&undo_list).await;
                    return Err(e.into());
                },
            }
        }
        match self.db.insert_order(order).await {
            Ok(order) => {
                debug!(
                    "🛒️ Order [{order_id}] placed for {} with {} line items, totalling {}",
                    order.buyer_id,
                    order.line_items.len(),
                    order.total_amount
                );
                self.call_order_placed_hook(&order).await;
                Ok(order)
            },
            Err(e) => {
                error!(
                    "🛒️ Order [{order_id}] could not be persisted after stock was reserved: {e}. Returning {} \
                     reservations to the ledger.",
                    undo_list.len()
                );
                self.release_reservations(&undo_list).await;
                Err(e.into())
            },
        }
    }

    /// Returns every reservation on the undo list to the ledger, most recent first. A release that
    /// fails is logged and skipped, so the remaining reservations still get returned.
    async fn release_reservations(&self, undo_list: &[(ProductId, i64)]) {
        for (product_id, quantity) in undo_list.iter().rev() {
            if let Err(e) = self.db.release_stock(product_id, *quantity).await {
                error!(
                    "🛒️ Could not return {quantity} units of {product_id} to the ledger: {e}. The ledger needs a \
                     manual correction."
                );
            }
        }
    }

    /// Moves the order to `target`, if the caller may and the move is legal.
    ///
    /// | From \ To  | Processing | Shipped | Delivered | Cancelled |
    /// |------------|------------|---------|-----------|-----------|
    /// | Placed     | Ok         | Err     | Err       | Ok        |
    /// | Processing | Err        | Ok      | Err       | Ok        |
    /// | Shipped    | Err        | Err     | Ok        | Ok        |
    /// | Delivered  | Err        | Err     | Err       | Err       |
    /// | Cancelled  | Err        | Err     | Err       | Err       |
    ///
    /// Authorization comes first: administrators may transition any order, a producer only orders
    /// carrying at least one of their own line items, and buyers never. An unauthorized caller gets
    /// `Forbidden` without the transition even being examined.
    ///
    /// On success, one entry is appended to the tracking history and the updated order is returned,
    /// projected for the caller. The write is keyed on the status this call observed, so of two racing
    /// transitions only one can apply; the loser fails with `InvalidTransition` carrying the status
    /// that beat it.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        target: OrderStatusType,
        caller: &Caller,
    ) -> Result<ProjectedOrder, OrderManagerError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderManagerError::OrderNotFound(order_id.clone()))?;
        let relationship = access::relationship(&order, caller);
        if !access::may_transition(caller.role, relationship) {
            info!("🛒️ {} {} may not transition order [{order_id}]", caller.role, caller.user_id);
            return Err(OrderManagerError::forbidden(order_id, caller));
        }
        if !order.status.can_transition_to(&target) {
            debug!("🛒️ Refusing {} -> {target} on order [{order_id}]", order.status);
            return Err(OrderManagerError::InvalidTransition {
                order_id: order_id.clone(),
                from: order.status,
                to: target,
            });
        }
        let updated = match self.db.update_order_status(order_id, &order.status, &target).await? {
            Some(updated) => updated,
            None => {
                // Zero rows matched: the order vanished, or another transition got in first. Refetch to
                // report the status that won.
                let current = self
                    .db
                    .fetch_order_by_order_id(order_id)
                    .await?
                    .ok_or_else(|| OrderManagerError::OrderNotFound(order_id.clone()))?;
                warn!(
                    "🛒️ Order [{order_id}] changed status while this transition was in flight. It is now {}",
                    current.status
                );
                return Err(OrderManagerError::InvalidTransition {
                    order_id: order_id.clone(),
                    from: current.status,
                    to: target,
                });
            },
        };
        debug!("🛒️ Order [{order_id}] is now {}", updated.status);
        self.call_status_changed_hook(&updated, &order.status).await;
        access::project_order(&updated, caller).ok_or_else(|| OrderManagerError::forbidden(order_id, caller))
    }

    async fn call_order_placed_hook(&self, order: &Order) {
        for emitter in &self.producers.order_placed_producer {
            debug!("🛒️ Notifying order placed hook subscribers");
            let event = OrderPlacedEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_status_changed_hook(&self, order: &Order, old_status: &OrderStatusType) {
        for emitter in &self.producers.status_changed_producer {
            debug!("🛒️ Notifying status change hook subscribers");
            let event = OrderStatusChangedEvent::new(order.clone(), old_status.clone());
            emitter.publish_event(event).await;
        }
    }
}

/// Rejects malformed carts before any stock is touched. The declared total must match what the cart
/// snapshot adds up to; the catalog is not consulted.
fn validate_cart(order: &NewOrder) -> Result<(), CartValidationError> {
    if order.items.is_empty() {
        return Err(CartValidationError::EmptyCart);
    }
    if order.payment_ref.trim().is_empty() {
        return Err(CartValidationError::MissingPaymentRef);
    }
    for line in &order.items {
        if line.quantity < 1 {
            return Err(CartValidationError::BadQuantity {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            });
        }
        if line.unit_price.is_negative() {
            return Err(CartValidationError::NegativePrice { product_id: line.product_id.clone() });
        }
    }
    let computed = order.computed_total();
    if computed != order.declared_total {
        return Err(CartValidationError::TotalMismatch { declared: order.declared_total, computed });
    }
    Ok(())
}
