//! SQLite backend for the roost storage traits.
//!
//! Built on [`tokio_rusqlite`] so all database work runs on a
//! dedicated thread without blocking the async runtime. The error
//! taxonomy lives in `roost-core`; this crate maps SQLite failures
//! into it at the call boundary. A uniqueness violation on a direct
//! alias insert becomes `Error::Conflict`, everything else surfaces as
//! `Error::Storage`.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;
