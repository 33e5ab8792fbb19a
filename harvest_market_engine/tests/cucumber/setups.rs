use cucumber::given;
use harvest_market_engine::{
    db_types::{ProductId, UserId},
    traits::StockManagement,
};
use hmg_common::Money;

use crate::cucumber::{
    market_world::{CatalogEntry, OrderSystem},
    MarketWorld,
};

#[given("a fresh market")]
async fn fresh_market(world: &mut MarketWorld) {
    let system = OrderSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "{int} unit(s) of {word} from {word} at {int} rupees")]
async fn seed_stock(world: &mut MarketWorld, quantity: i64, product: String, owner: String, price: i64) {
    let product_id = ProductId::from(product.as_str());
    world.api().db().set_stock_level(&product_id, quantity).await.expect("Error setting the stock level");
    let entry = CatalogEntry { unit_price: Money::from_rupees(price), owner: UserId::from(owner) };
    world.products.insert(product, entry);
}

/// A product the catalog lists but the stock ledger has never heard of.
#[given(expr = "a catalog listing for {word} from {word} at {int} rupees")]
async fn seed_catalog_only(world: &mut MarketWorld, product: String, owner: String, price: i64) {
    let entry = CatalogEntry { unit_price: Money::from_rupees(price), owner: UserId::from(owner) };
    world.products.insert(product, entry);
}

#[given(expr = "a registered buyer {word} with email {word}")]
async fn register_buyer(world: &mut MarketWorld, user_id: String, email: String) {
    let directory = std::mem::take(&mut world.directory);
    world.directory = directory.with_contact(&user_id, &user_id, &email);
}
