//! SQL schema for the paperrank SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Rows are never deleted; only `score` is ever updated.
CREATE TABLE IF NOT EXISTS papers (
    paper_id     TEXT PRIMARY KEY,
    arxiv_id     TEXT NOT NULL UNIQUE,
    title        TEXT NOT NULL,
    abstract     TEXT NOT NULL,
    authors      TEXT NOT NULL,   -- ', '-joined names
    categories   TEXT NOT NULL,   -- whitespace-separated tags
    published_at TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    score        REAL NOT NULL DEFAULT 0
);

-- One row per (user, paper); re-rating updates `rating` in place.
CREATE TABLE IF NOT EXISTS ratings (
    rating_id  TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    paper_id   TEXT NOT NULL REFERENCES papers(paper_id),
    rating     INTEGER NOT NULL CHECK (rating BETWEEN 0 AND 5),
    created_at TEXT NOT NULL,
    UNIQUE (user_id, paper_id)
);

CREATE INDEX IF NOT EXISTS papers_published_idx ON papers(published_at);
CREATE INDEX IF NOT EXISTS ratings_paper_idx    ON ratings(paper_id);

PRAGMA user_version = 1;
";
