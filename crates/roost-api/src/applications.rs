//! Handlers for `/applications` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/applications` | Optional `?developer=<id>` |
//! | `POST`   | `/applications` | Body: `{"name":..., "developer":...}` |
//! | `GET`    | `/applications/:app` | 404 if not found |
//! | `DELETE` | `/applications/:app` | Publishes the deletion event |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use roost_core::{
  application::Application, event::AppEvent, store::ApplicationRegistry,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{Json, Path, Query},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub developer: Option<String>,
}

/// `GET /applications[?developer=<id>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Application>>, ApiError>
where
  S: ApplicationRegistry,
{
  let applications =
    state.store.list_applications(params.developer.as_deref()).await?;
  Ok(Json(applications))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:      String,
  /// The acting identity the new application belongs to.
  pub developer: String,
}

/// `POST /applications` — body: `{"name":..., "developer":...}`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApplicationRegistry,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name must not be empty".to_string()));
  }
  if body.developer.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "developer must not be empty".to_string(),
    ));
  }
  let application =
    state.store.add_application(&body.name, &body.developer).await?;
  Ok((StatusCode::CREATED, Json(application)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /applications/:app`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(app_id): Path<Uuid>,
) -> Result<Json<Application>, ApiError>
where
  S: ApplicationRegistry,
{
  let application = state
    .store
    .get_application(app_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("application {app_id} not found")))?;
  Ok(Json(application))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /applications/:app`
///
/// Removes the registry row, then publishes
/// [`AppEvent::Deleted`] so the alias directory and the document store
/// purge their records. Cleanup already performed stays in place if a
/// later subscriber fails; the failure surfaces as 500.
pub async fn remove_one<S>(
  State(state): State<ApiState<S>>,
  Path(app_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ApplicationRegistry,
{
  let removed = state.store.remove_application(app_id).await?;
  if !removed {
    return Err(ApiError::NotFound(format!("application {app_id} not found")));
  }
  state.events.publish(AppEvent::Deleted { app_id }).await?;
  Ok(StatusCode::NO_CONTENT)
}
