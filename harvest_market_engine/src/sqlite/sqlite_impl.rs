//! `SqliteDatabase` is a concrete implementation of a Harvest Market engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, orders, stock};
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, ProductId, StockLevel, UserId},
    order_objects::OrderQueryFilter,
    traits::{
        OrderEngineDatabase,
        OrderEngineError,
        OrderManagement,
        OrderQueryError,
        StockLedgerError,
        StockManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderEngineDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderEngineError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] has been saved in the DB with id {}", order.order_id, order.id);
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        expected: &OrderStatusType,
        new_status: &OrderStatusType,
    ) -> Result<Option<Order>, OrderEngineError> {
        let mut tx = self.pool.begin().await?;
        let row = orders::update_order_status(order_id, expected, new_status, &mut tx).await?;
        let result = match row {
            Some(row) => {
                let entry = orders::append_tracking_entry(row.id, new_status, &mut tx).await?;
                let order = orders::assemble_order(row, &mut tx).await?;
                tx.commit().await?;
                debug!("🗃️ Order [{order_id}] moved from {expected} to {new_status} at {}", entry.timestamp);
                Some(order)
            },
            None => {
                tx.rollback().await?;
                trace!("🗃️ Order [{order_id}] was not in {expected} status. No transition applied");
                None
            },
        };
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), OrderEngineError> {
        self.pool.close().await;
        Ok(())
    }
}

impl StockManagement for SqliteDatabase {
    async fn reserve_stock(&self, product_id: &ProductId, quantity: i64) -> Result<(), StockLedgerError> {
        let mut conn = self.pool.acquire().await?;
        stock::reserve_stock(product_id, quantity, &mut conn).await
    }

    async fn release_stock(&self, product_id: &ProductId, quantity: i64) -> Result<(), StockLedgerError> {
        let mut conn = self.pool.acquire().await?;
        stock::release_stock(product_id, quantity, &mut conn).await
    }

    async fn fetch_stock_level(&self, product_id: &ProductId) -> Result<Option<StockLevel>, StockLedgerError> {
        let mut conn = self.pool.acquire().await?;
        stock::fetch_stock_level(product_id, &mut conn).await
    }

    async fn set_stock_level(&self, product_id: &ProductId, quantity: i64) -> Result<StockLevel, StockLedgerError> {
        let mut conn = self.pool.acquire().await?;
        stock::set_stock_level(product_id, quantity, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_buyer(buyer_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_orders_for_producer(&self, producer_id: &UserId) -> Result<Vec<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_producer(producer_id, &mut conn).await?;
        Ok(orders)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
