//! Extractor wrappers that keep rejections inside the JSON error
//! envelope.
//!
//! axum's built-in extractors answer malformed input with plain-text
//! bodies. These wrappers delegate to them and map every rejection to
//! [`ApiError::BadRequest`], so a bad path parameter, query string, or
//! request body produces the same `{"error": ...}` shape as
//! handler-level failures.

use axum::{
  extract::{FromRequest, FromRequestParts, Request},
  http::request::Parts,
  response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::ApiError;

// ─── Path ─────────────────────────────────────────────────────────────────────

/// [`axum::extract::Path`] with the rejection mapped to
/// [`ApiError::BadRequest`].
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
  T: DeserializeOwned + Send,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    match axum::extract::Path::<T>::from_request_parts(parts, state).await {
      Ok(axum::extract::Path(value)) => Ok(Self(value)),
      Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
  }
}

// ─── Query ────────────────────────────────────────────────────────────────────

/// [`axum::extract::Query`] with the rejection mapped to
/// [`ApiError::BadRequest`].
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    match axum::extract::Query::<T>::from_request_parts(parts, state).await {
      Ok(axum::extract::Query(value)) => Ok(Self(value)),
      Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
  }
}

// ─── Json ─────────────────────────────────────────────────────────────────────

/// [`axum::Json`] with the rejection mapped to
/// [`ApiError::BadRequest`]. Doubles as the response wrapper so
/// handlers use one `Json` for both directions.
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(
    req: Request,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    match axum::Json::<T>::from_request(req, state).await {
      Ok(axum::Json(value)) => Ok(Self(value)),
      Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
  }
}

impl<T: Serialize> IntoResponse for Json<T> {
  fn into_response(self) -> Response { axum::Json(self.0).into_response() }
}
