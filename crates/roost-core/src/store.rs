//! Storage contracts implemented by backends such as `roost-store-sqlite`.
//!
//! Three independent traits share nothing but the application scoping
//! id: [`AliasDirectory`] and [`DocumentStore`] never call each other,
//! and [`ApplicationRegistry`] calls neither. Cascading cleanup on
//! application removal travels over [`crate::event::AppEventBus`]
//! instead of direct calls.
//!
//! Every method returns a `Send` future so implementations can be used
//! from multi-threaded async runtimes.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  alias::Alias,
  application::Application,
  document::{Document, DocumentMetadata, DocumentQuery},
};

// ─── AliasDirectory ──────────────────────────────────────────────────────────

/// The canonical, deduplicated directory of aliases per application.
///
/// Uniqueness of `(app_id, email)` is enforced by the backend through
/// constraints or conditional writes; the directory holds no locks of
/// its own. Reconciliation runs read-diff-write without a surrounding
/// transaction: a failure partway leaves the completed writes in
/// place, and concurrent runs converge through the backend's per-row
/// conditional inserts.
pub trait AliasDirectory: Send + Sync {
  /// Insert a new alias. Fails with [`Error::Conflict`](crate::Error)
  /// when the `(app_id, email)` pair is already live: a direct insert
  /// of a duplicate is a caller error and is never silently dropped.
  fn create(
    &self,
    alias: Alias,
  ) -> impl Future<Output = Result<Alias>> + Send + '_;

  /// Look up by email, case-insensitively. Absence is `None`, not an
  /// error.
  fn find<'a>(
    &'a self,
    app_id: Uuid,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Alias>>> + Send + 'a;

  /// Look up by the stable record id.
  fn find_by_id(
    &self,
    app_id: Uuid,
    alias_id: Uuid,
  ) -> impl Future<Output = Result<Option<Alias>>> + Send + '_;

  /// Every alias under the application, ordered by email.
  fn list(
    &self,
    app_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Alias>>> + Send + '_;

  /// Delete one alias. Deleting an absent alias is a successful no-op.
  fn remove<'a>(
    &'a self,
    app_id: Uuid,
    email: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Delete every alias under the application. Used by the
  /// application-removal cascade.
  fn remove_all(
    &self,
    app_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Reconcile the directory against an externally supplied email list
  /// and return the full, now-current alias set.
  ///
  /// Emails not yet present are inserted with fresh time-ordered ids;
  /// duplicates within `emails` collapse to a single insert. Existing
  /// aliases missing from `emails` are deleted only when
  /// `purge_missing`. Syncing the same list twice performs zero writes
  /// the second time.
  fn sync(
    &self,
    app_id: Uuid,
    emails: Vec<String>,
    purge_missing: bool,
  ) -> impl Future<Output = Result<Vec<Alias>>> + Send + '_;

  /// [`sync`](Self::sync) over pre-built records: callers that already
  /// hold generated ids keep them for the records that get inserted.
  fn add_all(
    &self,
    app_id: Uuid,
    aliases: Vec<Alias>,
    purge_missing: bool,
  ) -> impl Future<Output = Result<Vec<Alias>>> + Send + '_;
}

// ─── DocumentStore ───────────────────────────────────────────────────────────

/// Append-only document storage with per-identifier latest-wins reads.
pub trait DocumentStore: Send + Sync {
  /// Persist a new immutable document with a store-stamped
  /// `created_at`. No uniqueness applies: repeated saves under one
  /// identifier accumulate as versions.
  fn save(
    &self,
    metadata: DocumentMetadata,
    payload: String,
  ) -> impl Future<Output = Result<Document>> + Send + '_;

  /// Alias-scoped documents, filtered by `query`, most recent first.
  fn get_alias_documents<'a>(
    &'a self,
    app_id: Uuid,
    email: &'a str,
    query: &'a DocumentQuery,
  ) -> impl Future<Output = Result<Vec<Document>>> + Send + 'a;

  /// Application-scoped (alias-less) documents, filtered by `query`,
  /// most recent first.
  fn get_application_documents<'a>(
    &'a self,
    app_id: Uuid,
    query: &'a DocumentQuery,
  ) -> impl Future<Output = Result<Vec<Document>>> + Send + 'a;

  /// The single most recent document per distinct identifier under
  /// `(app_id, email)`, narrowed to one identifier when supplied.
  /// Equal timestamps resolve by storage insertion order, so repeated
  /// calls over an unchanged data set return the same rows.
  fn get_latest_documents<'a>(
    &'a self,
    app_id: Uuid,
    email: &'a str,
    identifier: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Document>>> + Send + 'a;

  /// Delete every document under the application, alias-scoped and
  /// application-scoped alike. Idempotent; used by the
  /// application-removal cascade.
  fn delete_all(
    &self,
    app_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;
}

// ─── ApplicationRegistry ─────────────────────────────────────────────────────

/// Lifecycle owner for the scoping parent.
pub trait ApplicationRegistry: Send + Sync {
  /// Create an application owned by `developer`.
  fn add_application<'a>(
    &'a self,
    name: &'a str,
    developer: &'a str,
  ) -> impl Future<Output = Result<Application>> + Send + 'a;

  fn get_application(
    &self,
    app_id: Uuid,
  ) -> impl Future<Output = Result<Option<Application>>> + Send + '_;

  /// All applications, optionally restricted to one developer.
  fn list_applications<'a>(
    &'a self,
    developer: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Application>>> + Send + 'a;

  /// Delete the application row only. Returns `false` when the id was
  /// not present. Scoped aliases and documents are purged by the
  /// deletion-event subscribers, not here.
  fn remove_application(
    &self,
    app_id: Uuid,
  ) -> impl Future<Output = Result<bool>> + Send + '_;
}
