//! Core domain types and storage contracts for roost.
//!
//! Everything here is transport- and database-agnostic: the alias
//! directory, the document store, and the application registry are
//! defined as traits over plain data types, and the reconciliation
//! planner is a pure function. Backends (`roost-store-sqlite`) and
//! surfaces (`roost-api`) both depend on this crate and nothing in it
//! depends on them.

pub mod alias;
pub mod application;
pub mod document;
pub mod error;
pub mod event;
pub mod reconcile;
pub mod store;

pub use error::{Error, Result};
