//! JSON REST API for roost.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `roost-core` storage traits. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/rest", roost_api::api_router(state))
//! ```

pub mod aliases;
pub mod applications;
pub mod documents;
pub mod error;
pub mod extract;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use roost_core::{
  event::{AppEvent, AppEventBus},
  store::{AliasDirectory, ApplicationRegistry, DocumentStore},
};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROOST_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 9090 }
fn default_store_path() -> PathBuf { PathBuf::from("roost.db") }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct ApiState<S> {
  pub store:  Arc<S>,
  /// Lifecycle fan-out; application deletion publishes here.
  pub events: Arc<AppEventBus>,
}

/// Register the cascade subscribers: application deletion purges the
/// alias directory and the document store, each through its own
/// subscription rather than a direct call from the registry.
pub fn register_cascade<S>(events: &mut AppEventBus, store: &Arc<S>)
where
  S: AliasDirectory + DocumentStore + 'static,
{
  {
    let store = Arc::clone(store);
    events.subscribe(move |AppEvent::Deleted { app_id }| {
      let store = Arc::clone(&store);
      async move {
        tracing::info!(%app_id, "purging aliases of removed application");
        store.remove_all(app_id).await
      }
    });
  }
  {
    let store = Arc::clone(store);
    events.subscribe(move |AppEvent::Deleted { app_id }| {
      let store = Arc::clone(&store);
      async move {
        tracing::info!(%app_id, "purging documents of removed application");
        store.delete_all(app_id).await
      }
    });
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: AliasDirectory
    + DocumentStore
    + ApplicationRegistry
    + Clone
    + Send
    + Sync
    + 'static,
{
  Router::new()
    // Applications
    .route(
      "/applications",
      get(applications::list::<S>).post(applications::create::<S>),
    )
    .route(
      "/applications/{app}",
      get(applications::get_one::<S>).delete(applications::remove_one::<S>),
    )
    // Aliases
    .route(
      "/applications/{app}/aliases",
      get(aliases::list::<S>).post(aliases::create::<S>),
    )
    .route("/applications/{app}/aliases/sync", post(aliases::sync::<S>))
    .route(
      "/applications/{app}/aliases/{email}",
      get(aliases::find::<S>).delete(aliases::remove::<S>),
    )
    // Documents
    .route(
      "/applications/{app}/documents",
      get(documents::list_for_application::<S>)
        .post(documents::save_for_application::<S>),
    )
    .route(
      "/applications/{app}/aliases/{email}/documents",
      get(documents::list_for_alias::<S>).post(documents::save_for_alias::<S>),
    )
    .route(
      "/applications/{app}/aliases/{email}/documents/latest",
      get(documents::latest_for_alias::<S>),
    )
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use roost_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  async fn make_state() -> ApiState<SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let mut events = AppEventBus::new();
    register_cascade(&mut events, &store);
    ApiState { store, events: Arc::new(events) }
  }

  async fn send(
    state: ApiState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    let resp = api_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes =
      axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn create_app(state: &ApiState<SqliteStore>) -> Uuid {
    let (status, body) = send(
      state.clone(),
      "POST",
      "/applications",
      Some(json!({ "name": "unit", "developer": "dev@corp.org" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse().unwrap()
  }

  // ── Applications ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn application_lifecycle_over_rest() {
    let state = make_state().await;
    let app_id = create_app(&state).await;

    let (status, body) =
      send(state.clone(), "GET", &format!("/applications/{app_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "unit");
    assert_eq!(body["developer"], "dev@corp.org");

    let (status, body) = send(state.clone(), "GET", "/applications", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) =
      send(state.clone(), "DELETE", &format!("/applications/{app_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
      send(state, "GET", &format!("/applications/{app_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn application_create_validates_fields() {
    let state = make_state().await;
    let (status, body) = send(
      state,
      "POST",
      "/applications",
      Some(json!({ "name": "  ", "developer": "dev@corp.org" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("name"));
  }

  #[tokio::test]
  async fn application_list_filters_by_developer() {
    let state = make_state().await;
    send(
      state.clone(),
      "POST",
      "/applications",
      Some(json!({ "name": "a", "developer": "alice@corp.org" })),
    )
    .await;
    send(
      state.clone(),
      "POST",
      "/applications",
      Some(json!({ "name": "b", "developer": "bob@corp.org" })),
    )
    .await;

    let (status, body) = send(
      state,
      "GET",
      "/applications?developer=alice@corp.org",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "a");
  }

  #[tokio::test]
  async fn deleting_missing_application_returns_404() {
    let state = make_state().await;
    let (status, _) = send(
      state,
      "DELETE",
      &format!("/applications/{}", Uuid::new_v4()),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn malformed_application_id_is_rejected() {
    let state = make_state().await;
    // `send` parses the body as JSON, so this also checks that the
    // path rejection keeps the `{"error": ...}` envelope.
    let (status, body) =
      send(state, "GET", "/applications/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn malformed_json_body_is_rejected() {
    let state = make_state().await;
    let req = Request::builder()
      .method("POST")
      .uri("/applications")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let resp = api_router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let bytes =
      axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
  }

  // ── Aliases ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn alias_create_find_and_conflict() {
    let state = make_state().await;
    let app_id = create_app(&state).await;
    let base = format!("/applications/{app_id}/aliases");

    let (status, body) = send(
      state.clone(),
      "POST",
      &base,
      Some(json!({ "email": "Person@Example.org" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "person@example.org");

    let (status, body) = send(
      state.clone(),
      "GET",
      &format!("{base}/person@example.org"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["app_id"], app_id.to_string());

    let (status, _) = send(
      state,
      "POST",
      &base,
      Some(json!({ "email": "person@example.org" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn alias_lookup_missing_returns_404() {
    let state = make_state().await;
    let app_id = create_app(&state).await;
    let (status, _) = send(
      state,
      "GET",
      &format!("/applications/{app_id}/aliases/no@one.org"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn alias_delete_is_idempotent_over_rest() {
    let state = make_state().await;
    let app_id = create_app(&state).await;
    let uri = format!("/applications/{app_id}/aliases/gone@example.org");

    send(
      state.clone(),
      "POST",
      &format!("/applications/{app_id}/aliases"),
      Some(json!({ "email": "gone@example.org" })),
    )
    .await;

    let (status, _) = send(state.clone(), "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(state, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
  }

  #[tokio::test]
  async fn sync_reconciles_and_returns_full_set() {
    let state = make_state().await;
    let app_id = create_app(&state).await;
    let uri = format!("/applications/{app_id}/aliases/sync");

    // Initial upload.
    let (status, body) = send(
      state.clone(),
      "POST",
      &uri,
      Some(json!({ "emails": ["a@x.org", "b@x.org", "c@x.org"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    // Additive by default: a shorter upload removes nothing.
    let (_, body) = send(
      state.clone(),
      "POST",
      &uri,
      Some(json!({ "emails": ["a@x.org", "b@x.org"] })),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    // Purge mode drops the absentee.
    let (_, body) = send(
      state.clone(),
      "POST",
      &uri,
      Some(json!({
        "emails": ["a@x.org", "b@x.org"],
        "purge_missing": true
      })),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(
      state,
      "GET",
      &format!("/applications/{app_id}/aliases/c@x.org"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn sync_rejects_blank_emails() {
    let state = make_state().await;
    let app_id = create_app(&state).await;

    let (status, body) = send(
      state.clone(),
      "POST",
      &format!("/applications/{app_id}/aliases/sync"),
      Some(json!({ "emails": ["a@x.org", "  "] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("blank"));

    // The valid entry was not written either.
    let (_, aliases) = send(
      state,
      "GET",
      &format!("/applications/{app_id}/aliases"),
      None,
    )
    .await;
    assert!(aliases.as_array().unwrap().is_empty());
  }

  // ── Documents ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn document_deploy_and_retrieve_per_alias() {
    let state = make_state().await;
    let app_id = create_app(&state).await;
    let base = format!("/applications/{app_id}/aliases/reader@x.org/documents");

    let (status, body) = send(
      state.clone(),
      "POST",
      &base,
      Some(json!({
        "doc_type": "settings",
        "identifier": "inbox",
        "payload": "{\"sound\":\"off\"}"
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["created_at"].is_string());

    let (status, body) = send(state, "GET", &base, None).await;
    assert_eq!(status, StatusCode::OK);
    let docs = body.as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["payload"], "{\"sound\":\"off\"}");
    assert_eq!(docs[0]["alias"], "reader@x.org");
  }

  #[tokio::test]
  async fn document_listing_filters_by_type() {
    let state = make_state().await;
    let app_id = create_app(&state).await;
    let base = format!("/applications/{app_id}/documents");

    for doc_type in ["settings", "tasks"] {
      send(
        state.clone(),
        "POST",
        &base,
        Some(json!({
          "doc_type": doc_type,
          "identifier": "main",
          "payload": doc_type
        })),
      )
      .await;
    }

    let (status, body) =
      send(state, "GET", &format!("{base}?doc_type=tasks"), None).await;
    assert_eq!(status, StatusCode::OK);
    let docs = body.as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["doc_type"], "tasks");
    assert!(docs[0]["alias"].is_null());
  }

  #[tokio::test]
  async fn document_listing_filters_by_time_range() {
    let state = make_state().await;
    let app_id = create_app(&state).await;
    let base = format!("/applications/{app_id}/documents");

    send(
      state.clone(),
      "POST",
      &base,
      Some(json!({ "doc_type": "notes", "identifier": "a", "payload": "old" })),
    )
    .await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    // The `Z` suffix keeps the query string free of `+`, which would
    // url-decode as a space.
    let cut = chrono::Utc::now()
      .to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    send(
      state.clone(),
      "POST",
      &base,
      Some(json!({ "doc_type": "notes", "identifier": "b", "payload": "new" })),
    )
    .await;

    let (status, body) =
      send(state.clone(), "GET", &format!("{base}?since={cut}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let docs = body.as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["payload"], "new");

    let (status, body) =
      send(state, "GET", &format!("{base}?until={cut}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let docs = body.as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["payload"], "old");
  }

  #[tokio::test]
  async fn malformed_since_parameter_is_rejected() {
    let state = make_state().await;
    let app_id = create_app(&state).await;

    let (status, body) = send(
      state,
      "GET",
      &format!("/applications/{app_id}/documents?since=yesterday"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn document_validation_rejects_blank_identifier() {
    let state = make_state().await;
    let app_id = create_app(&state).await;

    let (status, _) = send(
      state,
      "POST",
      &format!("/applications/{app_id}/documents"),
      Some(json!({ "doc_type": "settings", "identifier": "", "payload": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn latest_documents_pick_newest_version() {
    let state = make_state().await;
    let app_id = create_app(&state).await;
    let base = format!("/applications/{app_id}/aliases/reader@x.org/documents");

    for payload in ["v1", "v2"] {
      send(
        state.clone(),
        "POST",
        &base,
        Some(json!({
          "doc_type": "tasks",
          "identifier": "today",
          "payload": payload
        })),
      )
      .await;
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (status, body) =
      send(state, "GET", &format!("{base}/latest?identifier=today"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let docs = body.as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["payload"], "v2");
  }

  // ── Cascade ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn deleting_application_purges_aliases_and_documents() {
    let state = make_state().await;
    let app_id = create_app(&state).await;

    send(
      state.clone(),
      "POST",
      &format!("/applications/{app_id}/aliases/sync"),
      Some(json!({ "emails": ["a@x.org", "b@x.org"] })),
    )
    .await;
    send(
      state.clone(),
      "POST",
      &format!("/applications/{app_id}/aliases/a@x.org/documents"),
      Some(json!({
        "doc_type": "tasks",
        "identifier": "1",
        "payload": "{SIMPLE}"
      })),
    )
    .await;
    send(
      state.clone(),
      "POST",
      &format!("/applications/{app_id}/documents"),
      Some(json!({
        "doc_type": "tasks",
        "identifier": "global",
        "payload": "{GLOBAL}"
      })),
    )
    .await;

    let (status, _) =
      send(state.clone(), "DELETE", &format!("/applications/{app_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, aliases) = send(
      state.clone(),
      "GET",
      &format!("/applications/{app_id}/aliases"),
      None,
    )
    .await;
    assert!(aliases.as_array().unwrap().is_empty());

    let (_, alias_docs) = send(
      state.clone(),
      "GET",
      &format!("/applications/{app_id}/aliases/a@x.org/documents"),
      None,
    )
    .await;
    assert!(alias_docs.as_array().unwrap().is_empty());

    let (_, app_docs) = send(
      state,
      "GET",
      &format!("/applications/{app_id}/documents"),
      None,
    )
    .await;
    assert!(app_docs.as_array().unwrap().is_empty());
  }
}
