//! Aliases: end-user identifiers (emails) scoped to one application.
//!
//! An alias record is immutable once created. Reconciliation replaces
//! records rather than editing them, so the record id stays a stable
//! handle for as long as the record lives.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowercase an email so lookups and the `(app_id, email)` uniqueness
/// rule are case-insensitive.
pub fn normalize(email: &str) -> String { email.to_lowercase() }

/// One directory entry: an end-user identifier under one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
  /// Owning application.
  pub app_id: Uuid,
  /// Time-ordered id assigned at creation. Serves as a stable handle
  /// independent of the email value.
  pub id:     Uuid,
  /// Normalized (lowercase) email. Unique per application.
  pub email:  String,
}

impl Alias {
  /// Build a record with a freshly assigned time-ordered id and a
  /// normalized email.
  pub fn new(app_id: Uuid, email: &str) -> Self {
    Self { app_id, id: Uuid::now_v7(), email: normalize(email) }
  }
}
