//! [`SqliteStore`]: the SQLite implementation of the three roost
//! storage traits.

use std::path::Path;

use chrono::Utc;
use roost_core::{
  Error, Result,
  alias::{self, Alias},
  application::Application,
  document::{Document, DocumentMetadata, DocumentQuery},
  reconcile,
  store::{AliasDirectory, ApplicationRegistry, DocumentStore},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  encode::{RawAlias, RawApplication, RawDocument, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A roost store backed by a single SQLite database.
///
/// Cloning is cheap; the inner connection handle is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(Error::storage)?;
    Ok(())
  }

  /// Apply a reconciliation plan: per-row conditional inserts, then
  /// per-row deletes, then a re-read of the full set. Deliberately not
  /// wrapped in a transaction; a failure partway leaves the completed
  /// writes in place and a repeated call converges.
  async fn apply_reconcile(
    &self,
    app_id: Uuid,
    incoming: Vec<Alias>,
    purge_missing: bool,
  ) -> Result<Vec<Alias>> {
    let current = self.list(app_id).await?;
    let plan = reconcile::plan(&current, incoming, purge_missing);

    if !plan.to_add.is_empty() {
      let rows: Vec<(String, String, String)> = plan
        .to_add
        .iter()
        .map(|a| (encode_uuid(a.app_id), a.email.clone(), encode_uuid(a.id)))
        .collect();
      self
        .conn
        .call(move |conn| {
          for (app, email, id) in &rows {
            // A concurrent reconciliation that won the race is
            // equivalent to this insert having happened.
            conn.execute(
              "INSERT INTO aliases (app_id, email, alias_id)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(app_id, email) DO NOTHING",
              rusqlite::params![app, email, id],
            )?;
          }
          Ok(())
        })
        .await
        .map_err(Error::storage)?;
    }

    if !plan.to_remove.is_empty() {
      let keys: Vec<(String, String)> = plan
        .to_remove
        .iter()
        .map(|a| (encode_uuid(a.app_id), a.email.clone()))
        .collect();
      self
        .conn
        .call(move |conn| {
          for (app, email) in &keys {
            conn.execute(
              "DELETE FROM aliases WHERE app_id = ?1 AND email = ?2",
              rusqlite::params![app, email],
            )?;
          }
          Ok(())
        })
        .await
        .map_err(Error::storage)?;
    }

    self.list(app_id).await
  }

  /// Shared range read over one `(app_id, alias)` partition. `None`
  /// selects the application-scoped rows (`alias IS NULL`).
  async fn query_documents(
    &self,
    app_id: Uuid,
    alias: Option<String>,
    query: &DocumentQuery,
  ) -> Result<Vec<Document>> {
    let app_str   = encode_uuid(app_id);
    let doc_type  = query.doc_type.clone();
    let since_str = query.since.map(encode_dt);
    let until_str = query.until.map(encode_dt);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT doc_id, app_id, alias, doc_type, identifier, created_at,
                  payload
           FROM documents
           WHERE app_id = ?1
             AND ((?2 IS NULL AND alias IS NULL) OR alias = ?2)
             AND (?3 IS NULL OR doc_type = ?3)
             AND (?4 IS NULL OR created_at >= ?4)
             AND (?5 IS NULL OR created_at <= ?5)
           ORDER BY created_at DESC, seq DESC",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![app_str, alias, doc_type, since_str, until_str],
            |row| {
              Ok(RawDocument {
                doc_id:     row.get(0)?,
                app_id:     row.get(1)?,
                alias:      row.get(2)?,
                doc_type:   row.get(3)?,
                identifier: row.get(4)?,
                created_at: row.get(5)?,
                payload:    row.get(6)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::storage)?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }
}

/// Map a failed direct alias insert: uniqueness violations become
/// [`Error::Conflict`], everything else a storage failure.
fn map_create_err(
  app_id: Uuid,
  email: &str,
  err: tokio_rusqlite::Error,
) -> Error {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
    e,
    _,
  )) = &err
    && e.code == rusqlite::ErrorCode::ConstraintViolation
  {
    return Error::Conflict { app_id, email: email.to_owned() };
  }
  Error::storage(err)
}

// ─── AliasDirectory impl ─────────────────────────────────────────────────────

impl AliasDirectory for SqliteStore {
  async fn create(&self, alias: Alias) -> Result<Alias> {
    let alias = Alias { email: alias::normalize(&alias.email), ..alias };
    let app_str = encode_uuid(alias.app_id);
    let email   = alias.email.clone();
    let id_str  = encode_uuid(alias.id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO aliases (app_id, email, alias_id) VALUES (?1, ?2, ?3)",
          rusqlite::params![app_str, email, id_str],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| map_create_err(alias.app_id, &alias.email, e))?;

    Ok(alias)
  }

  async fn find(&self, app_id: Uuid, email: &str) -> Result<Option<Alias>> {
    let app_str   = encode_uuid(app_id);
    let email_str = alias::normalize(email);

    let raw: Option<RawAlias> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT app_id, email, alias_id FROM aliases
               WHERE app_id = ?1 AND email = ?2",
              rusqlite::params![app_str, email_str],
              |row| {
                Ok(RawAlias {
                  app_id:   row.get(0)?,
                  email:    row.get(1)?,
                  alias_id: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::storage)?;

    raw.map(RawAlias::into_alias).transpose()
  }

  async fn find_by_id(
    &self,
    app_id: Uuid,
    alias_id: Uuid,
  ) -> Result<Option<Alias>> {
    let app_str = encode_uuid(app_id);
    let id_str  = encode_uuid(alias_id);

    let raw: Option<RawAlias> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT app_id, email, alias_id FROM aliases
               WHERE app_id = ?1 AND alias_id = ?2",
              rusqlite::params![app_str, id_str],
              |row| {
                Ok(RawAlias {
                  app_id:   row.get(0)?,
                  email:    row.get(1)?,
                  alias_id: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::storage)?;

    raw.map(RawAlias::into_alias).transpose()
  }

  async fn list(&self, app_id: Uuid) -> Result<Vec<Alias>> {
    let app_str = encode_uuid(app_id);

    let raws: Vec<RawAlias> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT app_id, email, alias_id FROM aliases
           WHERE app_id = ?1
           ORDER BY email",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![app_str], |row| {
            Ok(RawAlias {
              app_id:   row.get(0)?,
              email:    row.get(1)?,
              alias_id: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::storage)?;

    raws.into_iter().map(RawAlias::into_alias).collect()
  }

  async fn remove(&self, app_id: Uuid, email: &str) -> Result<()> {
    let app_str   = encode_uuid(app_id);
    let email_str = alias::normalize(email);

    self
      .conn
      .call(move |conn| {
        // Absence is not an error; deleting zero rows is a no-op.
        conn.execute(
          "DELETE FROM aliases WHERE app_id = ?1 AND email = ?2",
          rusqlite::params![app_str, email_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::storage)
  }

  async fn remove_all(&self, app_id: Uuid) -> Result<()> {
    let app_str = encode_uuid(app_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM aliases WHERE app_id = ?1",
          rusqlite::params![app_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::storage)
  }

  async fn sync(
    &self,
    app_id: Uuid,
    emails: Vec<String>,
    purge_missing: bool,
  ) -> Result<Vec<Alias>> {
    let incoming: Vec<Alias> =
      emails.iter().map(|e| Alias::new(app_id, e)).collect();
    self.apply_reconcile(app_id, incoming, purge_missing).await
  }

  async fn add_all(
    &self,
    app_id: Uuid,
    aliases: Vec<Alias>,
    purge_missing: bool,
  ) -> Result<Vec<Alias>> {
    let incoming: Vec<Alias> = aliases
      .into_iter()
      .map(|a| Alias { app_id, email: alias::normalize(&a.email), ..a })
      .collect();
    self.apply_reconcile(app_id, incoming, purge_missing).await
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  async fn save(
    &self,
    metadata: DocumentMetadata,
    payload: String,
  ) -> Result<Document> {
    let document = Document {
      id:         Uuid::new_v4(),
      app_id:     metadata.app_id,
      alias:      metadata.alias.as_deref().map(alias::normalize),
      doc_type:   metadata.doc_type,
      identifier: metadata.identifier,
      created_at: Utc::now(),
      payload,
    };

    let doc_id_str  = encode_uuid(document.id);
    let app_str     = encode_uuid(document.app_id);
    let alias_str   = document.alias.clone();
    let doc_type    = document.doc_type.clone();
    let identifier  = document.identifier.clone();
    let created_str = encode_dt(document.created_at);
    let payload_str = document.payload.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (
             doc_id, app_id, alias, doc_type, identifier, created_at, payload
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            doc_id_str,
            app_str,
            alias_str,
            doc_type,
            identifier,
            created_str,
            payload_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::storage)?;

    Ok(document)
  }

  async fn get_alias_documents(
    &self,
    app_id: Uuid,
    email: &str,
    query: &DocumentQuery,
  ) -> Result<Vec<Document>> {
    self
      .query_documents(app_id, Some(alias::normalize(email)), query)
      .await
  }

  async fn get_application_documents(
    &self,
    app_id: Uuid,
    query: &DocumentQuery,
  ) -> Result<Vec<Document>> {
    self.query_documents(app_id, None, query).await
  }

  async fn get_latest_documents(
    &self,
    app_id: Uuid,
    email: &str,
    identifier: Option<&str>,
  ) -> Result<Vec<Document>> {
    let app_str   = encode_uuid(app_id);
    let email_str = alias::normalize(email);
    let ident     = identifier.map(str::to_owned);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        // The subquery pins, per identifier, the row that wins on
        // created_at with seq as the insertion-order tie-break.
        let mut stmt = conn.prepare(
          "SELECT d.doc_id, d.app_id, d.alias, d.doc_type, d.identifier,
                  d.created_at, d.payload
           FROM documents d
           WHERE d.app_id = ?1
             AND d.alias = ?2
             AND (?3 IS NULL OR d.identifier = ?3)
             AND d.seq = (
               SELECT d2.seq FROM documents d2
               WHERE d2.app_id = d.app_id
                 AND d2.alias = d.alias
                 AND d2.identifier = d.identifier
               ORDER BY d2.created_at DESC, d2.seq DESC
               LIMIT 1
             )
           ORDER BY d.identifier",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![app_str, email_str, ident], |row| {
            Ok(RawDocument {
              doc_id:     row.get(0)?,
              app_id:     row.get(1)?,
              alias:      row.get(2)?,
              doc_type:   row.get(3)?,
              identifier: row.get(4)?,
              created_at: row.get(5)?,
              payload:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::storage)?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn delete_all(&self, app_id: Uuid) -> Result<()> {
    let app_str = encode_uuid(app_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM documents WHERE app_id = ?1",
          rusqlite::params![app_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::storage)
  }
}

// ─── ApplicationRegistry impl ────────────────────────────────────────────────

impl ApplicationRegistry for SqliteStore {
  async fn add_application(
    &self,
    name: &str,
    developer: &str,
  ) -> Result<Application> {
    let application = Application {
      id:         Uuid::new_v4(),
      name:       name.to_owned(),
      developer:  developer.to_owned(),
      created_at: Utc::now(),
    };

    let id_str      = encode_uuid(application.id);
    let name_str    = application.name.clone();
    let dev_str     = application.developer.clone();
    let created_str = encode_dt(application.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO applications (app_id, name, developer, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name_str, dev_str, created_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::storage)?;

    Ok(application)
  }

  async fn get_application(
    &self,
    app_id: Uuid,
  ) -> Result<Option<Application>> {
    let app_str = encode_uuid(app_id);

    let raw: Option<RawApplication> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT app_id, name, developer, created_at
               FROM applications
               WHERE app_id = ?1",
              rusqlite::params![app_str],
              |row| {
                Ok(RawApplication {
                  app_id:     row.get(0)?,
                  name:       row.get(1)?,
                  developer:  row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::storage)?;

    raw.map(RawApplication::into_application).transpose()
  }

  async fn list_applications(
    &self,
    developer: Option<&str>,
  ) -> Result<Vec<Application>> {
    let dev = developer.map(str::to_owned);

    let raws: Vec<RawApplication> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT app_id, name, developer, created_at
           FROM applications
           WHERE (?1 IS NULL OR developer = ?1)
           ORDER BY name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![dev], |row| {
            Ok(RawApplication {
              app_id:     row.get(0)?,
              name:       row.get(1)?,
              developer:  row.get(2)?,
              created_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::storage)?;

    raws
      .into_iter()
      .map(RawApplication::into_application)
      .collect()
  }

  async fn remove_application(&self, app_id: Uuid) -> Result<bool> {
    let app_str = encode_uuid(app_id);

    self
      .conn
      .call(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM applications WHERE app_id = ?1",
          rusqlite::params![app_str],
        )?;
        Ok(deleted > 0)
      })
      .await
      .map_err(Error::storage)
  }
}
