use chrono::{DateTime, Utc};
use hmg_common::Money;
use log::{debug, trace};
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{LineItem, NewOrder, Order, OrderId, OrderStatusType, TrackingEntry, UserId},
    order_objects::OrderQueryFilter,
    traits::OrderEngineError,
};

/// The raw `orders` table row. Line items and the tracking history live in their own tables and are
/// attached during assembly.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct OrderRow {
    pub id: i64,
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub total_amount: Money,
    pub payment_ref: String,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checks whether the order with the given `OrderId` already exists in the database. If it does exist,
/// the `id` of the order is returned. If it does not exist, `None` is returned.
pub async fn order_exists(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let id = sqlx::query_scalar("SELECT id FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

/// Inserts a new order into the database using the given connection: the order row, one row per line
/// item, and the initial `Placed` tracking entry. This is not atomic. You can embed this call inside a
/// transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub(crate) async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderEngineError> {
    if order_exists(&order.order_id, &mut *conn).await?.is_some() {
        return Err(OrderEngineError::OrderAlreadyExists(order.order_id));
    }
    let row: OrderRow = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                buyer_id,
                total_amount,
                payment_ref,
                created_at
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.buyer_id.as_str())
    .bind(order.declared_total.value())
    .bind(&order.payment_ref)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await?;
    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_ref, product_id, name, unit_price, quantity, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(row.id)
        .bind(item.product_id.as_str())
        .bind(&item.name)
        .bind(item.unit_price.value())
        .bind(item.quantity)
        .bind(item.owner_id.as_str())
        .execute(&mut *conn)
        .await?;
    }
    sqlx::query("INSERT INTO order_tracking (order_ref, status, timestamp) VALUES ($1, $2, $3)")
        .bind(row.id)
        .bind(row.status.to_string())
        .bind(order.created_at)
        .execute(&mut *conn)
        .await?;
    debug!("📝️ Order [{}] inserted with id {}", row.order_id, row.id);
    let order = assemble_order(row, conn).await?;
    Ok(order)
}

/// Attaches the line items and tracking history to an order row. Items come back in insertion order,
/// and the tracking history oldest first.
pub(crate) async fn assemble_order(row: OrderRow, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let line_items: Vec<LineItem> = sqlx::query_as(
        "SELECT product_id, name, unit_price, quantity, owner_id FROM order_items WHERE order_ref = $1 ORDER BY id",
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;
    let tracking_history: Vec<TrackingEntry> =
        sqlx::query_as("SELECT status, timestamp FROM order_tracking WHERE order_ref = $1 ORDER BY id")
            .bind(row.id)
            .fetch_all(conn)
            .await?;
    Ok(Order {
        id: row.id,
        order_id: row.order_id,
        buyer_id: row.buyer_id,
        line_items,
        total_amount: row.total_amount,
        payment_ref: row.payment_ref,
        status: row.status,
        tracking_history,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

async fn assemble_orders(rows: Vec<OrderRow>, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        orders.push(assemble_order(row, &mut *conn).await?);
    }
    Ok(orders)
}

/// Returns the order for the corresponding `order_id`, with line items and tracking history attached.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => Ok(Some(assemble_order(row, conn).await?)),
        None => Ok(None),
    }
}

/// Fetches all orders placed by the given buyer, newest first.
pub async fn fetch_orders_for_buyer(buyer_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let rows: Vec<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(buyer_id.as_str())
            .fetch_all(&mut *conn)
            .await?;
    assemble_orders(rows, conn).await
}

/// Fetches all orders that contain at least one line item owned by the given producer, newest first.
pub async fn fetch_orders_for_producer(
    producer_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let rows: Vec<OrderRow> = sqlx::query_as(
        r#"
        SELECT DISTINCT
            orders.id as id,
            order_id,
            buyer_id,
            total_amount,
            payment_ref,
            status,
            orders.created_at as created_at,
            orders.updated_at as updated_at
        FROM orders JOIN order_items ON order_items.order_ref = orders.id
        WHERE order_items.owner_id = $1
        ORDER BY orders.created_at DESC, orders.id DESC"#,
    )
    .bind(producer_id.as_str())
    .fetch_all(&mut *conn)
    .await?;
    assemble_orders(rows, conn).await
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at`, newest first
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id.0);
    }
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id.0);
    }
    if let Some(supplier_id) = query.supplier_id {
        where_clause.push("EXISTS (SELECT 1 FROM order_items WHERE order_items.order_ref = orders.id AND order_items.owner_id = ");
        where_clause.push_bind_unseparated(supplier_id.0);
        where_clause.push_unseparated(")");
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("EXISTS (SELECT 1 FROM order_items WHERE order_items.order_ref = orders.id AND order_items.product_id = ");
        where_clause.push_bind_unseparated(product_id.0);
        where_clause.push_unseparated(")");
    }
    if let Some(payment_ref) = query.payment_ref {
        where_clause.push("payment_ref = ");
        where_clause.push_bind_unseparated(payment_ref);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<OrderRow>();
    let rows = query.fetch_all(&mut *conn).await?;
    trace!("📝️ Result of search_orders: {} hits", rows.len());
    assemble_orders(rows, conn).await
}

/// Conditionally moves the order to `new_status`, keyed on the status the caller last observed. If the
/// order no longer has `expected` status (or does not exist), zero rows match and `None` is returned,
/// so a stale transition can never overwrite a newer one.
pub(crate) async fn update_order_status(
    order_id: &OrderId,
    expected: &OrderStatusType,
    new_status: &OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRow>, sqlx::Error> {
    let row: Option<OrderRow> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 AND status = $3 RETURNING *",
    )
    .bind(new_status.to_string())
    .bind(order_id.as_str())
    .bind(expected.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Appends one entry to the order's tracking history. Entries are never updated or deleted.
pub(crate) async fn append_tracking_entry(
    order_ref: i64,
    status: &OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<TrackingEntry, sqlx::Error> {
    let entry =
        sqlx::query_as("INSERT INTO order_tracking (order_ref, status) VALUES ($1, $2) RETURNING status, timestamp")
            .bind(order_ref)
            .bind(status.to_string())
            .fetch_one(conn)
            .await?;
    Ok(entry)
}
