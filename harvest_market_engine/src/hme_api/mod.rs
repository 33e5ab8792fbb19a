//! # Harvest Market engine public API
//!
//! The `hme_api` module exposes the programmatic API for the Harvest Market engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//! Or different parts (e.g. order intake and back-office queries) could be configured on different
//! machines, or even use Sqlite for one and Postgres for the other.
//!
//! * [`order_flow_api`] is the write side: it creates orders from carts (reserving stock and
//!   compensating on partial failure) and drives orders through the status lifecycle.
//! * [`order_query_api`] is the read side: single-order fetches, buyer and supplier listings, the
//!   administrative search, and invoice resolution.
//! * [`access`] holds the capability tables that decide, per role and relationship to an order, who may
//!   see what and who may trigger transitions. Everything leaving the engine passes through here.
//!
//! The other submodules in this module are support and utility functions and types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database
//! backend that implements the specific backend traits required by the API.
//!
//! For example, to create an API instance to query orders on the database:
//!
//! ```rust,ignore
//! use harvest_market_engine::{OrderQueryApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements OrderManagement
//! let api = OrderQueryApi::new(db);
//! // use the api to access information
//! let order = api.fetch_order(&order_id, &caller).await?;
//! ```

pub mod access;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_query_api;
