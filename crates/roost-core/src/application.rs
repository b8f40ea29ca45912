//! Applications: the scoping parent for aliases and documents.
//!
//! The directory and the document store only ever see the `app_id`.
//! The registry owns the row itself and its removal is announced over
//! [`crate::event::AppEventBus`] rather than by calling into the other
//! components directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
  pub id:         Uuid,
  pub name:       String,
  /// The acting identity that created the application. Always passed
  /// explicitly by callers, never read from ambient request context.
  pub developer:  String,
  pub created_at: DateTime<Utc>,
}
