//! Handlers for document deployment and retrieval.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/applications/:app/documents` | Application-scoped deploy |
//! | `GET`  | `/applications/:app/documents` | `?doc_type=`, `?since=`, `?until=` |
//! | `POST` | `/applications/:app/aliases/:email/documents` | Alias-scoped deploy |
//! | `GET`  | `/applications/:app/aliases/:email/documents` | Same filters |
//! | `GET`  | `/applications/:app/aliases/:email/documents/latest` | `?identifier=` |
//!
//! Timestamps in query parameters are RFC 3339, e.g.
//! `?since=2026-08-25T09:00:00Z`.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use roost_core::{
  document::{Document, DocumentMetadata, DocumentQuery},
  store::DocumentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{Json, Path, Query},
};

// ─── Save ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SaveBody {
  pub doc_type:   String,
  pub identifier: String,
  /// Opaque content, stored as-is.
  pub payload:    String,
}

impl SaveBody {
  fn validate(&self) -> Result<(), ApiError> {
    if self.doc_type.trim().is_empty() {
      return Err(ApiError::BadRequest(
        "doc_type must not be empty".to_string(),
      ));
    }
    if self.identifier.trim().is_empty() {
      return Err(ApiError::BadRequest(
        "identifier must not be empty".to_string(),
      ));
    }
    Ok(())
  }
}

/// `POST /applications/:app/documents`
pub async fn save_for_application<S>(
  State(state): State<ApiState<S>>,
  Path(app_id): Path<Uuid>,
  Json(body): Json<SaveBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  body.validate()?;
  let metadata = DocumentMetadata {
    app_id,
    alias: None,
    doc_type: body.doc_type,
    identifier: body.identifier,
  };
  let document = state.store.save(metadata, body.payload).await?;
  Ok((StatusCode::CREATED, Json(document)))
}

/// `POST /applications/:app/aliases/:email/documents`
pub async fn save_for_alias<S>(
  State(state): State<ApiState<S>>,
  Path((app_id, email)): Path<(Uuid, String)>,
  Json(body): Json<SaveBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  body.validate()?;
  let metadata = DocumentMetadata {
    app_id,
    alias: Some(email),
    doc_type: body.doc_type,
    identifier: body.identifier,
  };
  let document = state.store.save(metadata, body.payload).await?;
  Ok((StatusCode::CREATED, Json(document)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub doc_type: Option<String>,
  /// Keep documents created at or after this instant.
  pub since:    Option<DateTime<Utc>>,
  /// Keep documents created at or before this instant.
  pub until:    Option<DateTime<Utc>>,
}

impl From<ListParams> for DocumentQuery {
  fn from(params: ListParams) -> Self {
    DocumentQuery {
      doc_type: params.doc_type,
      since:    params.since,
      until:    params.until,
    }
  }
}

/// `GET /applications/:app/documents`
pub async fn list_for_application<S>(
  State(state): State<ApiState<S>>,
  Path(app_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: DocumentStore,
{
  let documents = state
    .store
    .get_application_documents(app_id, &DocumentQuery::from(params))
    .await?;
  Ok(Json(documents))
}

/// `GET /applications/:app/aliases/:email/documents`
pub async fn list_for_alias<S>(
  State(state): State<ApiState<S>>,
  Path((app_id, email)): Path<(Uuid, String)>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: DocumentStore,
{
  let documents = state
    .store
    .get_alias_documents(app_id, &email, &DocumentQuery::from(params))
    .await?;
  Ok(Json(documents))
}

// ─── Latest ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LatestParams {
  pub identifier: Option<String>,
}

/// `GET /applications/:app/aliases/:email/documents/latest`
///
/// One document per distinct identifier, most recent version only.
pub async fn latest_for_alias<S>(
  State(state): State<ApiState<S>>,
  Path((app_id, email)): Path<(Uuid, String)>,
  Query(params): Query<LatestParams>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: DocumentStore,
{
  let documents = state
    .store
    .get_latest_documents(app_id, &email, params.identifier.as_deref())
    .await?;
  Ok(Json(documents))
}
