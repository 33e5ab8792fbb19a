use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use hmg_common::Money;
use log::error;
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------      UserId        ---------------------------------------------------------
/// A lightweight wrapper around the string identifier issued by the identity provider.
#[derive(Clone, Debug, Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     ProductId      ---------------------------------------------------------
/// A lightweight wrapper around a catalog product identifier.
#[derive(Clone, Debug, Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ProductId(pub String);

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for ProductId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      OrderId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh order id. Ids are assigned by the gateway at creation time and are never reused.
    pub fn random() -> Self {
        let suffix = Alphanumeric.sample_string(&mut rand::thread_rng(), 12);
        Self(format!("hm-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------       Role         ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

/// The role attached to a verified caller identity. Roles are issued by the identity provider and are
/// taken at face value here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Producer,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "buyer"),
            Role::Producer => write!(f, "producer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Legacy identity records use "farmer" for produce suppliers.
        match s.to_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "producer" | "farmer" => Ok(Self::Producer),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------      Caller        ---------------------------------------------------------
/// A verified identity claim, as supplied by the identity provider on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new<S: Into<String>>(user_id: S, role: Role) -> Self {
        Self { user_id: UserId::from(user_id), role }
    }

    pub fn buyer<S: Into<String>>(user_id: S) -> Self {
        Self::new(user_id, Role::Buyer)
    }

    pub fn producer<S: Into<String>>(user_id: S) -> Self {
        Self::new(user_id, Role::Producer)
    }

    pub fn admin<S: Into<String>>(user_id: S) -> Self {
        Self::new(user_id, Role::Admin)
    }
}

//--------------------------------------   OrderStatusType  ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created, stock has been reserved, and a payment reference recorded.
    Placed,
    /// A supplier has started preparing the order.
    Processing,
    /// The order has left the supplier.
    Shipped,
    /// The order has reached the buyer. Terminal.
    Delivered,
    /// The order was cancelled before delivery. Terminal.
    Cancelled,
}

impl OrderStatusType {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    /// The next status in the fulfilment flow, if there is one.
    pub fn next_in_flow(&self) -> Option<OrderStatusType> {
        match self {
            OrderStatusType::Placed => Some(OrderStatusType::Processing),
            OrderStatusType::Processing => Some(OrderStatusType::Shipped),
            OrderStatusType::Shipped => Some(OrderStatusType::Delivered),
            OrderStatusType::Delivered | OrderStatusType::Cancelled => None,
        }
    }

    /// The full transition relation. Fulfilment moves strictly forwards one step at a time, and any
    /// non-terminal order may be cancelled.
    pub fn can_transition_to(&self, target: &OrderStatusType) -> bool {
        if *target == OrderStatusType::Cancelled {
            return !self.is_terminal();
        }
        self.next_in_flow().as_ref() == Some(target)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Placed => write!(f, "Placed"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Placed");
            OrderStatusType::Placed
        })
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Placed" => Ok(Self::Placed),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    TrackingEntry   ---------------------------------------------------------
/// One entry in an order's audit trail. Entries are append-only and the last entry always matches the
/// order's current status.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub status: OrderStatusType,
    pub timestamp: DateTime<Utc>,
}

//--------------------------------------      LineItem      ---------------------------------------------------------
/// One product line within a persisted order. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub owner_id: UserId,
}

impl LineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------      CartLine      ---------------------------------------------------------
/// One entry of an incoming cart. Carries the price/name/owner snapshot taken by the caller at request
/// time; the catalog is not consulted again after this point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub owner_id: UserId,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

impl From<CartLine> for LineItem {
    fn from(line: CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name,
            unit_price: line.unit_price,
            quantity: line.quantity,
            owner_id: line.owner_id,
        }
    }
}

//--------------------------------------      NewOrder      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The order id assigned by the gateway
    pub order_id: OrderId,
    /// The buyer placing the order
    pub buyer_id: UserId,
    /// The cart snapshot the order is built from
    pub items: Vec<CartLine>,
    /// The total the caller claims the cart adds up to
    pub declared_total: Money,
    /// The reference handed back by the payment collaborator
    pub payment_ref: String,
    /// The time the order request was received
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(buyer_id: UserId, items: Vec<CartLine>, payment_ref: String, declared_total: Money) -> Self {
        Self {
            order_id: OrderId::random(),
            buyer_id,
            items,
            declared_total,
            payment_ref,
            created_at: Utc::now(),
        }
    }

    /// The total the cart snapshot actually adds up to.
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(CartLine::line_total).sum()
    }
}

//--------------------------------------       Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
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

impl Order {
    /// True if at least one line item is owned by the given producer.
    pub fn is_supplied_by(&self, producer: &UserId) -> bool {
        self.line_items.iter().any(|li| &li.owner_id == producer)
    }

    pub fn belongs_to(&self, buyer: &UserId) -> bool {
        &self.buyer_id == buyer
    }
}

//--------------------------------------     StockLevel     ---------------------------------------------------------
/// The authoritative available-quantity record for one product. Only the conditional reserve/restore
/// operations ever mutate `available_quantity`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub available_quantity: i64,
    pub updated_at: DateTime<Utc>,
}
