use std::collections::HashMap;

use cucumber::World;
use harvest_market_engine::{
    db_types::{CartLine, OrderId, UserId},
    events::EventProducers,
    test_utils::{
        memory_directory::MemoryDirectory,
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    OrderFlowApi,
    OrderManagerError,
    OrderQueryApi,
    SqliteDatabase,
};
use hmg_common::Money;
use log::*;
use tokio::time::sleep;

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<OrderSystem>,
    /// What the catalog says about each product, as captured by the seeding steps.
    pub products: HashMap<String, CatalogEntry>,
    /// Carts under construction, keyed by buyer.
    pub carts: HashMap<String, Vec<CartLine>>,
    /// Order ids, keyed by the label the scenario gave them.
    pub orders: HashMap<String, OrderId>,
    pub directory: MemoryDirectory,
    pub last_failure: Option<OrderManagerError>,
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub unit_price: Money,
    pub owner: UserId,
}

#[derive(Debug)]
pub struct OrderSystem {
    pub db_path: String,
    pub api: OrderFlowApi<SqliteDatabase>,
    pub queries: OrderQueryApi<SqliteDatabase>,
}

impl MarketWorld {
    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase> {
        &self.system.as_ref().expect("OrderFlowApi not initialised").api
    }

    pub fn queries(&self) -> &OrderQueryApi<SqliteDatabase> {
        &self.system.as_ref().expect("OrderQueryApi not initialised").queries
    }

    pub fn order_id(&self, label: &str) -> OrderId {
        self.orders.get(label).unwrap_or_else(|| panic!("No order labelled {label} in this scenario")).clone()
    }
}

impl OrderSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        sleep(std::time::Duration::from_millis(50)).await;
        let queries = OrderQueryApi::new(db.clone());
        let api = OrderFlowApi::new(db, EventProducers::default());
        Self { db_path: url, api, queries }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
