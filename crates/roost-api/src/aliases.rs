//! Handlers for the alias directory endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/applications/:app/aliases` | Full directory, email order |
//! | `POST`   | `/applications/:app/aliases` | Body: `{"email":...}`, 409 on duplicate |
//! | `POST`   | `/applications/:app/aliases/sync` | Reconcile an uploaded email list |
//! | `GET`    | `/applications/:app/aliases/:email` | 404 if not found |
//! | `DELETE` | `/applications/:app/aliases/:email` | Idempotent, absent is 204 too |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use roost_core::{alias::Alias, store::AliasDirectory};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{Json, Path},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /applications/:app/aliases`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path(app_id): Path<Uuid>,
) -> Result<Json<Vec<Alias>>, ApiError>
where
  S: AliasDirectory,
{
  let aliases = state.store.list(app_id).await?;
  Ok(Json(aliases))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub email: String,
}

/// `POST /applications/:app/aliases` — body: `{"email":...}`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Path(app_id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AliasDirectory,
{
  if body.email.trim().is_empty() {
    return Err(ApiError::BadRequest("email must not be empty".to_string()));
  }
  let alias = state.store.create(Alias::new(app_id, &body.email)).await?;
  Ok((StatusCode::CREATED, Json(alias)))
}

// ─── Sync ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SyncBody {
  pub emails: Vec<String>,
  /// When set, directory entries absent from `emails` are deleted.
  #[serde(default)]
  pub purge_missing: bool,
}

/// `POST /applications/:app/aliases/sync`
///
/// Reconciles the directory against the uploaded list and returns the
/// full, now-current alias set. A blank entry anywhere in `emails`
/// rejects the whole upload before any write.
pub async fn sync<S>(
  State(state): State<ApiState<S>>,
  Path(app_id): Path<Uuid>,
  Json(body): Json<SyncBody>,
) -> Result<Json<Vec<Alias>>, ApiError>
where
  S: AliasDirectory,
{
  if body.emails.iter().any(|e| e.trim().is_empty()) {
    return Err(ApiError::BadRequest(
      "emails must not contain blank entries".to_string(),
    ));
  }
  let aliases =
    state.store.sync(app_id, body.emails, body.purge_missing).await?;
  Ok(Json(aliases))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /applications/:app/aliases/:email`
pub async fn find<S>(
  State(state): State<ApiState<S>>,
  Path((app_id, email)): Path<(Uuid, String)>,
) -> Result<Json<Alias>, ApiError>
where
  S: AliasDirectory,
{
  let alias = state
    .store
    .find(app_id, &email)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("alias {email:?} not found")))?;
  Ok(Json(alias))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /applications/:app/aliases/:email`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path((app_id, email)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError>
where
  S: AliasDirectory,
{
  state.store.remove(app_id, &email).await?;
  Ok(StatusCode::NO_CONTENT)
}
