//! # Database management and control.
//!
//! This module provides the interfaces that define the contracts of the order engine database *backends*.
//!
//! ## Stock and orders
//! The stock ledger is the authoritative record of available quantity per product. The
//! [`StockManagement`] trait exposes it through atomic conditional operations only, so that backends never
//! need in-process locks to keep quantities non-negative under concurrent reservations.
//!
//! Orders are created once, and thereafter only their status and tracking history change. The
//! [`OrderEngineDatabase`] trait handles the write side: atomic order insertion and the conditional status
//! update that serialises transitions per order.
//!
//! ## Traits
//! The module defines behaviour that database backends need to expose in order to be supported by the
//! Harvest Market engine.
//!
//! * [`OrderEngineDatabase`] defines the highest level of behaviour for backends supporting the engine.
//! * [`StockManagement`] defines the conditional reserve/release operations of the stock ledger.
//! * [`OrderManagement`] provides methods for querying orders by id, buyer, supplier or filter.
//! * [`BuyerDirectory`] is the contact-lookup collaborator used when resolving an order for invoicing.
mod buyer_directory;
mod order_engine_database;
mod order_management;
mod stock_management;

pub use buyer_directory::{BuyerContact, BuyerDirectory, DirectoryError};
pub use order_engine_database::{OrderEngineDatabase, OrderEngineError};
pub use order_management::{OrderManagement, OrderQueryError};
pub use stock_management::{StockLedgerError, StockManagement};
