//! Helpers between Rust domain types and the plain-text column
//! representations in SQLite.
//!
//! Timestamps are stored as RFC 3339 strings in UTC, which order
//! lexicographically, so SQL range comparisons work directly on the
//! raw column. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use roost_core::{
  Error, Result, alias::Alias, application::Application, document::Document,
};
use uuid::Uuid;

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(Error::storage)
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(Error::storage)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read straight out of an `aliases` row.
pub struct RawAlias {
  pub app_id:   String,
  pub email:    String,
  pub alias_id: String,
}

impl RawAlias {
  pub fn into_alias(self) -> Result<Alias> {
    Ok(Alias {
      app_id: decode_uuid(&self.app_id)?,
      id:     decode_uuid(&self.alias_id)?,
      email:  self.email,
    })
  }
}

/// Raw strings read straight out of a `documents` row.
pub struct RawDocument {
  pub doc_id:     String,
  pub app_id:     String,
  pub alias:      Option<String>,
  pub doc_type:   String,
  pub identifier: String,
  pub created_at: String,
  pub payload:    String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      id:         decode_uuid(&self.doc_id)?,
      app_id:     decode_uuid(&self.app_id)?,
      alias:      self.alias,
      doc_type:   self.doc_type,
      identifier: self.identifier,
      created_at: decode_dt(&self.created_at)?,
      payload:    self.payload,
    })
  }
}

/// Raw strings read straight out of an `applications` row.
pub struct RawApplication {
  pub app_id:     String,
  pub name:       String,
  pub developer:  String,
  pub created_at: String,
}

impl RawApplication {
  pub fn into_application(self) -> Result<Application> {
    Ok(Application {
      id:         decode_uuid(&self.app_id)?,
      name:       self.name,
      developer:  self.developer,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
