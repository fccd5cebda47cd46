//! SQL schema for the mapping store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL UNIQUE,
    role        TEXT NOT NULL,   -- 'candidate' | 'hr' | 'admin'
    created_at  TEXT NOT NULL
);

-- One row per HR user. `version` is bumped by every transition and checked
-- on write.
CREATE TABLE IF NOT EXISTS hr_records (
    hr_id               TEXT PRIMARY KEY REFERENCES users(user_id),
    hr_status           TEXT NOT NULL,
    admin_manager_id    TEXT REFERENCES users(user_id),
    years_of_experience REAL,
    company             TEXT,
    specialization      TEXT,
    version             INTEGER NOT NULL DEFAULT 0,
    updated_at          TEXT NOT NULL,
    CHECK ((hr_status = 'mapped') = (admin_manager_id IS NOT NULL))
);

-- Requests are never deleted; terminal rows are history.
CREATE TABLE IF NOT EXISTS mapping_requests (
    id              TEXT PRIMARY KEY,
    request_type    TEXT NOT NULL,   -- 'application' | 'request'
    requester_id    TEXT NOT NULL REFERENCES users(user_id),
    requester_role  TEXT NOT NULL,
    target_id       TEXT NOT NULL REFERENCES users(user_id),
    target_role     TEXT NOT NULL,
    hr_id           TEXT NOT NULL REFERENCES hr_records(hr_id),
    status          TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS requests_hr_idx        ON mapping_requests(hr_id);
CREATE INDEX IF NOT EXISTS requests_requester_idx ON mapping_requests(requester_id);
CREATE INDEX IF NOT EXISTS requests_target_idx    ON mapping_requests(target_id);
CREATE INDEX IF NOT EXISTS hr_manager_idx         ON hr_records(admin_manager_id);

PRAGMA user_version = 1;
";
