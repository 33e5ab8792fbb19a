use chrono::{DateTime, Utc};
use cucumber::{given, then, when};
use harvest_market_engine::{
    db_types::{Caller, CartLine, NewOrder, Order, OrderId, OrderStatusType, ProductId, Role, UserId},
    order_objects::OrderQueryFilter,
    traits::{OrderManagement, StockManagement},
    CartValidationError,
    OrderManagerError,
};
use hmg_common::{Money, INR_CURRENCY_CODE};
use log::*;

use crate::cucumber::MarketWorld;

fn caller(role: &str, user: &str) -> Caller {
    let role = role.parse::<Role>().unwrap_or_else(|e| panic!("{e}"));
    Caller::new(user, role)
}

async fn fetch_order(world: &MarketWorld, label: &str) -> Order {
    let order_id = world.order_id(label);
    world
        .api()
        .db()
        .fetch_order_by_order_id(&order_id)
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {label} does not exist"))
}

async fn checkout(world: &mut MarketWorld, buyer: String, label: String, payment_ref: String, declared: Option<Money>) {
    let items = world.carts.remove(&buyer).unwrap_or_default();
    let declared = declared.unwrap_or_else(|| items.iter().map(CartLine::line_total).sum());
    let order = NewOrder::new(UserId::from(buyer), items, payment_ref, declared);
    let res = world.api().place_order(order).await;
    match res {
        Ok(order) => {
            world.orders.insert(label, order.order_id);
            world.last_failure = None;
        },
        Err(e) => {
            info!("🧪️ Checkout of order {label} was refused: {e}");
            world.last_failure = Some(e);
        },
    }
}

#[given(expr = "an empty cart for {word}")]
fn empty_cart(world: &mut MarketWorld, buyer: String) {
    world.carts.insert(buyer, Vec::new());
}

#[when(expr = "{word} adds {int} unit(s) of {word} to the cart")]
fn add_to_cart(world: &mut MarketWorld, buyer: String, quantity: i64, product: String) {
    let entry = world.products.get(&product).cloned().unwrap_or_else(|| panic!("{product} is not in the catalog"));
    let line = CartLine {
        product_id: ProductId::from(product.as_str()),
        name: product.clone(),
        unit_price: entry.unit_price,
        quantity,
        owner_id: entry.owner,
    };
    world.carts.entry(buyer).or_default().push(line);
}

#[when(expr = "{word} checks out the cart as order {word} with payment ref {word}")]
async fn checkout_cart(world: &mut MarketWorld, buyer: String, label: String, payment_ref: String) {
    checkout(world, buyer, label, payment_ref, None).await;
}

#[when(expr = "{word} checks out the cart as order {word} with payment ref {word} declaring a total of {int} rupees")]
async fn checkout_cart_with_total(
    world: &mut MarketWorld,
    buyer: String,
    label: String,
    payment_ref: String,
    declared: i64,
) {
    checkout(world, buyer, label, payment_ref, Some(Money::from_rupees(declared))).await;
}

#[when(expr = "{word} checks out the cart as order {word} without a payment ref")]
async fn checkout_cart_no_payment_ref(world: &mut MarketWorld, buyer: String, label: String) {
    checkout(world, buyer, label, String::new(), None).await;
}

#[when(expr = "{word} {word} moves the order called {word} to {word}")]
async fn move_order(world: &mut MarketWorld, role: String, user: String, label: String, target: String) {
    let target: OrderStatusType = target.parse().expect("Unknown order status");
    let caller = caller(&role, &user);
    let order_id = world.order_id(&label);
    let view = world.api().update_order_status(&order_id, target, &caller).await.expect("Error moving the order");
    debug!("🧪️ Order {label} is now {}", view.status);
}

#[when(expr = "{word} {word} tries to move the order called {word} to {word}")]
async fn try_move_order(world: &mut MarketWorld, role: String, user: String, label: String, target: String) {
    let target: OrderStatusType = target.parse().expect("Unknown order status");
    let caller = caller(&role, &user);
    let order_id = world.order_id(&label);
    let res = world.api().update_order_status(&order_id, target, &caller).await;
    match res {
        Ok(view) => panic!("The transition unexpectedly succeeded; the order is now {}", view.status),
        Err(e) => {
            info!("🧪️ Transition was refused: {e}");
            world.last_failure = Some(e);
        },
    }
}

#[when(expr = "{word} {word} tries to move an unknown order to {word}")]
async fn try_move_unknown_order(world: &mut MarketWorld, role: String, user: String, target: String) {
    let target: OrderStatusType = target.parse().expect("Unknown order status");
    let caller = caller(&role, &user);
    let order_id = OrderId::from("hm-does-not-exist".to_string());
    let res = world.api().update_order_status(&order_id, target, &caller).await;
    match res {
        Ok(view) => panic!("The transition unexpectedly succeeded; the order is now {}", view.status),
        Err(e) => world.last_failure = Some(e),
    }
}

#[then("the move fails because the order does not exist")]
fn move_order_not_found(world: &mut MarketWorld) {
    let e = world.last_failure.as_ref().expect("No failure was recorded");
    assert!(matches!(e, OrderManagerError::OrderNotFound(_)), "Expected OrderNotFound, got {e}");
}

#[then(expr = "the order called {word} has status {word}")]
async fn order_has_status(world: &mut MarketWorld, label: String, status: String) {
    let expected: OrderStatusType = status.parse().expect("Unknown order status");
    let order = fetch_order(world, &label).await;
    assert_eq!(order.status, expected, "Status is incorrect");
}

#[then(expr = "the order called {word} has a total of {int} rupees")]
async fn order_has_total(world: &mut MarketWorld, label: String, total: i64) {
    let order = fetch_order(world, &label).await;
    assert_eq!(order.total_amount, Money::from_rupees(total), "Total is incorrect");
}

#[then(expr = "the order called {word} belongs to {word}")]
async fn order_belongs_to(world: &mut MarketWorld, label: String, buyer: String) {
    let order = fetch_order(world, &label).await;
    assert!(order.belongs_to(&UserId::from(buyer)), "The order belongs to {}", order.buyer_id);
}

#[then(expr = "the stock level of {word} is {int} unit(s)")]
async fn stock_level_is(world: &mut MarketWorld, product: String, expected: i64) {
    let product_id = ProductId::from(product.as_str());
    let level = world
        .api()
        .db()
        .fetch_stock_level(&product_id)
        .await
        .expect("Error fetching stock level")
        .unwrap_or_else(|| panic!("{product} has no ledger record"));
    assert_eq!(level.available_quantity, expected, "Stock level is incorrect");
}

#[then(expr = "the tracking history of the order called {word} has {int} entry/entries")]
async fn tracking_history_length(world: &mut MarketWorld, label: String, expected: usize) {
    let order = fetch_order(world, &label).await;
    assert_eq!(order.tracking_history.len(), expected, "Tracking history length is incorrect");
}

#[then(expr = "the tracking history of the order called {word} ends with {word}")]
async fn tracking_history_ends_with(world: &mut MarketWorld, label: String, status: String) {
    let expected: OrderStatusType = status.parse().expect("Unknown order status");
    let order = fetch_order(world, &label).await;
    let last = order.tracking_history.last().expect("The tracking history is empty");
    assert_eq!(last.status, expected, "The last tracking entry is incorrect");
    assert_eq!(last.status, order.status, "The tracking history does not match the order status");
}

#[then(expr = "the checkout fails with insufficient stock for {word} with only {int} available")]
fn checkout_insufficient(world: &mut MarketWorld, product: String, available: i64) {
    let e = world.last_failure.as_ref().expect("No failure was recorded");
    match e {
        OrderManagerError::InsufficientStock { product_id, available: actual, .. } => {
            assert_eq!(product_id, &ProductId::from(product.as_str()), "The wrong product ran short");
            assert_eq!(*actual, available, "The reported availability is incorrect");
        },
        other => panic!("Expected InsufficientStock, got {other}"),
    }
}

#[then("the checkout is rejected because the cart is empty")]
fn checkout_empty_cart(world: &mut MarketWorld) {
    let e = world.last_failure.as_ref().expect("No failure was recorded");
    assert!(matches!(e, OrderManagerError::InvalidCart(CartValidationError::EmptyCart)), "Expected EmptyCart, got {e}");
}

#[then("the checkout is rejected because the declared total is wrong")]
fn checkout_total_mismatch(world: &mut MarketWorld) {
    let e = world.last_failure.as_ref().expect("No failure was recorded");
    assert!(
        matches!(e, OrderManagerError::InvalidCart(CartValidationError::TotalMismatch { .. })),
        "Expected TotalMismatch, got {e}"
    );
}

#[then("the checkout is rejected because the payment reference is missing")]
fn checkout_missing_payment_ref(world: &mut MarketWorld) {
    let e = world.last_failure.as_ref().expect("No failure was recorded");
    assert!(
        matches!(e, OrderManagerError::InvalidCart(CartValidationError::MissingPaymentRef)),
        "Expected MissingPaymentRef, got {e}"
    );
}

#[then(expr = "the checkout is rejected because {word} is not in the ledger")]
fn checkout_product_not_found(world: &mut MarketWorld, product: String) {
    let e = world.last_failure.as_ref().expect("No failure was recorded");
    match e {
        OrderManagerError::ProductNotFound(product_id) => {
            assert_eq!(product_id, &ProductId::from(product.as_str()), "The wrong product was reported");
        },
        other => panic!("Expected ProductNotFound, got {other}"),
    }
}

#[then("the transition is refused as forbidden")]
fn transition_forbidden(world: &mut MarketWorld) {
    let e = world.last_failure.as_ref().expect("No failure was recorded");
    assert!(matches!(e, OrderManagerError::Forbidden { .. }), "Expected Forbidden, got {e}");
}

#[then(expr = "the transition is refused as an invalid move from {word}")]
fn transition_invalid(world: &mut MarketWorld, from: String) {
    let from: OrderStatusType = from.parse().expect("Unknown order status");
    let e = world.last_failure.as_ref().expect("No failure was recorded");
    match e {
        OrderManagerError::InvalidTransition { from: actual, .. } => {
            assert_eq!(actual, &from, "The transition was refused from the wrong status");
        },
        other => panic!("Expected InvalidTransition, got {other}"),
    }
}

#[then(expr = "{word} {word} sees {int} line item(s) on the order called {word}")]
async fn caller_sees_lines(world: &mut MarketWorld, role: String, user: String, count: usize, label: String) {
    let caller = caller(&role, &user);
    let order_id = world.order_id(&label);
    let view = world.queries().fetch_order(&order_id, &caller).await.expect("Error fetching the order view");
    assert_eq!(view.line_items.len(), count, "Line item count is incorrect");
}

#[then(expr = "{word} {word} sees a total of {int} rupees on the order called {word}")]
async fn caller_sees_total(world: &mut MarketWorld, role: String, user: String, total: i64, label: String) {
    let caller = caller(&role, &user);
    let order_id = world.order_id(&label);
    let view = world.queries().fetch_order(&order_id, &caller).await.expect("Error fetching the order view");
    assert_eq!(view.total_amount, Money::from_rupees(total), "The projected total is incorrect");
}

#[then(expr = "{word} {word} may not view the order called {word}")]
async fn caller_may_not_view(world: &mut MarketWorld, role: String, user: String, label: String) {
    let caller = caller(&role, &user);
    let order_id = world.order_id(&label);
    let res = world.queries().fetch_order(&order_id, &caller).await;
    assert!(matches!(res, Err(OrderManagerError::Forbidden { .. })), "Expected Forbidden, got {res:?}");
}

#[then(expr = "buyer {word} has {int} order(s) on file")]
async fn buyer_order_count(world: &mut MarketWorld, buyer: String, count: usize) {
    let orders = world.queries().orders_for_buyer(&UserId::from(buyer)).await.expect("Error fetching buyer orders");
    assert_eq!(orders.len(), count, "Buyer order count is incorrect");
}

#[then(expr = "producer {word} supplies {int} order(s)")]
async fn producer_order_count(world: &mut MarketWorld, producer: String, count: usize) {
    let views =
        world.queries().orders_for_producer(&UserId::from(producer)).await.expect("Error fetching producer orders");
    assert_eq!(views.len(), count, "Producer order count is incorrect");
    assert!(views.iter().all(|v| !v.line_items.is_empty()), "A supplier view has no line items");
}

async fn admin_search(world: &MarketWorld, query: OrderQueryFilter) -> Vec<Order> {
    let admin = Caller::admin("root");
    world.queries().search_orders(query, &admin).await.expect("Error searching orders")
}

#[then(expr = "an admin search for buyer {word} finds {int} order(s)")]
async fn search_by_buyer(world: &mut MarketWorld, buyer: String, count: usize) {
    let query = OrderQueryFilter::default().with_buyer_id(UserId::from(buyer));
    assert_eq!(admin_search(world, query).await.len(), count, "Search result count is incorrect");
}

#[then(expr = "an admin search for supplier {word} finds {int} order(s)")]
async fn search_by_supplier(world: &mut MarketWorld, supplier: String, count: usize) {
    let query = OrderQueryFilter::default().with_supplier_id(UserId::from(supplier));
    assert_eq!(admin_search(world, query).await.len(), count, "Search result count is incorrect");
}

#[then(expr = "an admin search for product {word} finds {int} order(s)")]
async fn search_by_product(world: &mut MarketWorld, product: String, count: usize) {
    let query = OrderQueryFilter::default().with_product_id(ProductId::from(product));
    assert_eq!(admin_search(world, query).await.len(), count, "Search result count is incorrect");
}

#[then(expr = "an admin search for status {word} finds {int} order(s)")]
async fn search_by_status(world: &mut MarketWorld, status: String, count: usize) {
    let status: OrderStatusType = status.parse().expect("Unknown order status");
    let query = OrderQueryFilter::default().with_status(status);
    assert_eq!(admin_search(world, query).await.len(), count, "Search result count is incorrect");
}

#[then(expr = "an admin search for buyer {word} with status {word} finds {int} order(s)")]
async fn search_by_buyer_and_status(world: &mut MarketWorld, buyer: String, status: String, count: usize) {
    let status: OrderStatusType = status.parse().expect("Unknown order status");
    let query = OrderQueryFilter::default().with_buyer_id(UserId::from(buyer)).with_status(status);
    assert_eq!(admin_search(world, query).await.len(), count, "Search result count is incorrect");
}

#[then(expr = "an admin search for payment ref {word} finds {int} order(s)")]
async fn search_by_payment_ref(world: &mut MarketWorld, payment_ref: String, count: usize) {
    let query = OrderQueryFilter::default().with_payment_ref(payment_ref);
    assert_eq!(admin_search(world, query).await.len(), count, "Search result count is incorrect");
}

#[then(expr = "an admin search since {word} finds {int} order(s)")]
async fn search_since(world: &mut MarketWorld, timestamp: String, count: usize) {
    let since = DateTime::parse_from_rfc3339(&timestamp).expect("Invalid timestamp").with_timezone(&Utc);
    let query = OrderQueryFilter::default().since(since).expect("Error building the query");
    assert_eq!(admin_search(world, query).await.len(), count, "Search result count is incorrect");
}

#[then(expr = "a search by {word} {word} is not authorized")]
async fn search_not_authorized(world: &mut MarketWorld, role: String, user: String) {
    let caller = caller(&role, &user);
    let res = world.queries().search_orders(OrderQueryFilter::default(), &caller).await;
    assert!(matches!(res, Err(OrderManagerError::NotAuthorized { .. })), "Expected NotAuthorized, got {res:?}");
}

#[then(expr = "{word} {word} can pull an invoice for the order called {word} addressed to {word}")]
async fn invoice_ok(world: &mut MarketWorld, role: String, user: String, label: String, email: String) {
    let caller = caller(&role, &user);
    let order_id = world.order_id(&label);
    let directory = world.directory.clone();
    let invoice =
        world.queries().invoice_order(&order_id, &caller, &directory).await.expect("Error resolving the invoice");
    assert_eq!(invoice.buyer.email, email, "The invoice is addressed to the wrong contact");
    assert_eq!(invoice.order.order_id, order_id, "The invoice is for the wrong order");
    assert_eq!(invoice.currency, INR_CURRENCY_CODE, "Invoices are denominated in rupees");
}

#[then(expr = "{word} {word} may not pull an invoice for the order called {word}")]
async fn invoice_forbidden(world: &mut MarketWorld, role: String, user: String, label: String) {
    let caller = caller(&role, &user);
    let order_id = world.order_id(&label);
    let directory = world.directory.clone();
    let res = world.queries().invoice_order(&order_id, &caller, &directory).await;
    assert!(matches!(res, Err(OrderManagerError::Forbidden { .. })), "Expected Forbidden, got {res:?}");
}

#[then(expr = "no invoice can be pulled for the order called {word} because the buyer is unknown")]
async fn invoice_unknown_contact(world: &mut MarketWorld, label: String) {
    let admin = Caller::admin("root");
    let order_id = world.order_id(&label);
    let directory = world.directory.clone();
    let res = world.queries().invoice_order(&order_id, &admin, &directory).await;
    assert!(matches!(res, Err(OrderManagerError::ContactLookup(_))), "Expected ContactLookup, got {res:?}");
}
