//! Error types for `roost-core`.

use thiserror::Error;
use uuid::Uuid;

/// The error taxonomy shared by every storage backend and surface.
///
/// Reads never fail on absence: lookups return `Option` and list
/// operations return empty vectors. Errors are reserved for duplicate
/// direct inserts and genuine storage failures.
#[derive(Debug, Error)]
pub enum Error {
  /// A direct insert hit a live `(app_id, email)` pair.
  #[error("alias {email:?} already exists for application {app_id}")]
  Conflict { app_id: Uuid, email: String },

  /// An underlying persistence failure, propagated unchanged.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure without translating it.
  pub fn storage(
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
  ) -> Self {
    Self::Storage(err.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
