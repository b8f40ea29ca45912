//! SQL schema for the roost SQLite store.
//!
//! Executed on every open; idempotent through `IF NOT EXISTS`. The
//! `user_version` pragma is bumped when the schema changes shape, so a
//! future migration step has something to key off.

pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS applications (
    app_id     TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    developer  TEXT NOT NULL,
    created_at TEXT NOT NULL    -- RFC 3339 UTC, server-assigned
);

-- One live row per (application, email). The record id is unique on
-- its own so it can serve as a stable external handle.
CREATE TABLE IF NOT EXISTS aliases (
    app_id   TEXT NOT NULL,
    email    TEXT NOT NULL,     -- stored normalized (lowercase)
    alias_id TEXT NOT NULL UNIQUE,
    PRIMARY KEY (app_id, email)
);

-- Append-only: no UPDATE is ever issued against this table, and
-- DELETE only happens as application-removal cleanup. `seq` gives the
-- insertion-order tie-break for equal timestamps.
CREATE TABLE IF NOT EXISTS documents (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_id     TEXT NOT NULL UNIQUE,
    app_id     TEXT NOT NULL,
    alias      TEXT,            -- NULL for application-scoped rows
    doc_type   TEXT NOT NULL,
    identifier TEXT NOT NULL,
    created_at TEXT NOT NULL,   -- RFC 3339 UTC, server-assigned
    payload    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS aliases_app_idx
    ON aliases(app_id);
CREATE INDEX IF NOT EXISTS documents_scope_idx
    ON documents(app_id, alias, created_at);
CREATE INDEX IF NOT EXISTS documents_ident_idx
    ON documents(app_id, alias, identifier);

PRAGMA user_version = 1;
";
