use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{ProductId, StockLevel},
    traits::StockLedgerError,
};

/// Atomically reserves `quantity` units of the product. The availability check and the decrement happen
/// in one conditional `UPDATE`, so the quantity can never be driven negative, no matter how many callers
/// race on the same product.
pub async fn reserve_stock(
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), StockLedgerError> {
    if quantity <= 0 {
        return Err(StockLedgerError::InvalidQuantity { product_id: product_id.clone(), quantity });
    }
    let result = sqlx::query(
        r#"
        UPDATE products
        SET available_quantity = available_quantity - $1, updated_at = CURRENT_TIMESTAMP
        WHERE product_id = $2 AND available_quantity >= $1
        "#,
    )
    .bind(quantity)
    .bind(product_id.as_str())
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        // Zero rows means the guard failed, or there is no ledger record at all. Look up which, so the
        // error can say how much stock there actually was.
        return match fetch_stock_level(product_id, conn).await? {
            Some(level) => Err(StockLedgerError::InsufficientStock {
                product_id: product_id.clone(),
                available: level.available_quantity,
                requested: quantity,
            }),
            None => Err(StockLedgerError::ProductNotFound(product_id.clone())),
        };
    }
    trace!("🌾️ Reserved {quantity} units of {product_id}");
    Ok(())
}

/// Atomically returns `quantity` units of the product to the ledger.
pub async fn release_stock(
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), StockLedgerError> {
    if quantity <= 0 {
        return Err(StockLedgerError::InvalidQuantity { product_id: product_id.clone(), quantity });
    }
    let result = sqlx::query(
        r#"
        UPDATE products
        SET available_quantity = available_quantity + $1, updated_at = CURRENT_TIMESTAMP
        WHERE product_id = $2
        "#,
    )
    .bind(quantity)
    .bind(product_id.as_str())
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StockLedgerError::ProductNotFound(product_id.clone()));
    }
    trace!("🌾️ Returned {quantity} units of {product_id} to the ledger");
    Ok(())
}

pub async fn fetch_stock_level(
    product_id: &ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<StockLevel>, StockLedgerError> {
    let level = sqlx::query_as("SELECT product_id, available_quantity, updated_at FROM products WHERE product_id = $1")
        .bind(product_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(level)
}

/// Sets the absolute available quantity for the product, creating the ledger record if it does not exist
/// yet. Restocking and catalog synchronisation come through here; the reservation flow never does.
pub async fn set_stock_level(
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<StockLevel, StockLedgerError> {
    if quantity < 0 {
        return Err(StockLedgerError::InvalidQuantity { product_id: product_id.clone(), quantity });
    }
    let level = sqlx::query_as(
        r#"
        INSERT INTO products (product_id, available_quantity) VALUES ($1, $2)
        ON CONFLICT (product_id)
        DO UPDATE SET available_quantity = excluded.available_quantity, updated_at = CURRENT_TIMESTAMP
        RETURNING product_id, available_quantity, updated_at
        "#,
    )
    .bind(product_id.as_str())
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    debug!("🌾️ Stock level for {product_id} set to {quantity}");
    Ok(level)
}
