//! Capability rules for orders.
//!
//! Every authorization decision in the engine comes down to two inputs: the caller's role, and how the
//! caller stands in relation to the order at hand. The tables in this module are the single place where
//! those pairs are mapped to capabilities. The APIs consult them; nothing else in the engine makes ad
//! hoc role checks.
use crate::{
    db_types::{Caller, Order, Role},
    hme_api::order_objects::ProjectedOrder,
};

/// How a caller stands in relation to a specific order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    /// The caller placed the order.
    Purchaser,
    /// The caller owns at least one of the order's line items.
    Supplier,
    /// The caller has no stake in the order.
    None,
}

/// Maps the caller to their standing on the order. Supplier standing wins for producers: a producer
/// who also bought an order carrying their own goods still acts on it as its supplier.
pub fn relationship(order: &Order, caller: &Caller) -> Relationship {
    let supplies = order.is_supplied_by(&caller.user_id);
    if caller.role == Role::Producer && supplies {
        Relationship::Supplier
    } else if order.belongs_to(&caller.user_id) {
        Relationship::Purchaser
    } else if supplies {
        Relationship::Supplier
    } else {
        Relationship::None
    }
}

/// How much of an order a caller is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewScope {
    /// Every field and every line item.
    Full,
    /// The order with line items cut down to the caller's own.
    OwnLinesOnly,
    /// Nothing at all.
    Denied,
}

/// The view capability table. Administrators see everything. A buyer sees their own orders in full and
/// nobody else's. A producer sees only the orders they supply, cut down to their own line items.
pub fn view_scope(role: Role, relationship: Relationship) -> ViewScope {
    match (role, relationship) {
        (Role::Admin, _) => ViewScope::Full,
        (Role::Buyer, Relationship::Purchaser) => ViewScope::Full,
        (Role::Producer, Relationship::Supplier) => ViewScope::OwnLinesOnly,
        (Role::Buyer, _) | (Role::Producer, _) => ViewScope::Denied,
    }
}

/// The transition capability table. Administrators may drive any order through the lifecycle. A
/// producer may act only on orders that carry at least one of their own line items. Buyers never
/// trigger transitions.
pub fn may_transition(role: Role, relationship: Relationship) -> bool {
    matches!((role, relationship), (Role::Admin, _) | (Role::Producer, Relationship::Supplier))
}

/// Projects the order for the caller, or `None` if the caller may not see it at all. The persisted
/// record is left untouched; the projection is a fresh copy.
pub fn project_order(order: &Order, caller: &Caller) -> Option<ProjectedOrder> {
    match view_scope(caller.role, relationship(order, caller)) {
        ViewScope::Full => Some(ProjectedOrder::full(order)),
        ViewScope::OwnLinesOnly => Some(ProjectedOrder::for_supplier(order, &caller.user_id)),
        ViewScope::Denied => None,
    }
}
