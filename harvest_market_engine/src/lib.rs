//! Harvest Market Engine
//!
//! The Harvest Market Engine keeps orders and stock consistent for Harvest Market, a marketplace where buyers
//! purchase fresh produce directly from local producers. This library contains the core ordering logic for the
//! marketplace. It is transport-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@traits`] and the backends that implement them). Currently, Sqlite is
//!    the supported backend. You should never need to access the database directly. Instead, use the public API
//!    provided by the engine. The exception is the data types used in the database. These are defined in the
//!    `db_types` module and are public.
//! 2. The engine public API ([`OrderFlowApi`] and [`OrderQueryApi`]). This provides the public-facing
//!    functionality of the engine. It is responsible for placing orders, moving them through fulfilment, and
//!    projecting them down to what the calling role is allowed to see. Specific backends (e.g. SQLite) need to
//!    implement the traits in [`mod@traits`] in order to act as a backend for the Harvest Market gateway.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain
//! actions occur within the engine. For example, when a new order is placed, an [`events::OrderPlacedEvent`] is
//! emitted. A simple Actor framework is used so that you can easily hook into these events and perform custom
//! actions.

pub mod db_types;
pub mod events;
mod hme_api;

#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use hme_api::{
    access,
    errors::{CartValidationError, OrderManagerError},
    order_flow_api::OrderFlowApi,
    order_objects,
    order_query_api::OrderQueryApi,
};
