//! Documents: immutable, timestamped payloads scoped to an application
//! and optionally to one of its aliases.
//!
//! A document is never updated in place. Saving again under the same
//! identifier records a new version; "latest" retrieval picks the
//! maximal `created_at` per identifier, with ties broken by storage
//! insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scoping and grouping for a document about to be saved.
///
/// `created_at` is deliberately absent: the store stamps it at save
/// time and callers cannot supply their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
  pub app_id:     Uuid,
  /// Normalized email when alias-scoped, `None` for application-scoped
  /// documents.
  pub alias:      Option<String>,
  /// Caller-defined category used to partition reads.
  pub doc_type:   String,
  /// Caller-supplied key grouping successive versions of one logical
  /// document.
  pub identifier: String,
}

/// A stored document. Immutable once saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub id:         Uuid,
  pub app_id:     Uuid,
  pub alias:      Option<String>,
  pub doc_type:   String,
  pub identifier: String,
  /// Store-assigned save timestamp.
  pub created_at: DateTime<Utc>,
  /// Opaque content. The store never interprets it.
  pub payload:    String,
}

/// Filters for range reads. `None` fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
  pub doc_type: Option<String>,
  /// Keep documents with `created_at >= since`.
  pub since:    Option<DateTime<Utc>>,
  /// Keep documents with `created_at <= until`.
  pub until:    Option<DateTime<Utc>>,
}
