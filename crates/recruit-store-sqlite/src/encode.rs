//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with microsecond precision so that string
//! order matches time order. Enums are stored by their wire names. UUIDs are
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use recruit_core::{
  identity::{HrProfile, HrRecord, User},
  request::MappingRequest,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "u.user_id, u.username, u.email, u.role, u.created_at";

pub const HR_COLUMNS: &str = "h.hr_id, h.hr_status, h.admin_manager_id, \
  h.years_of_experience, h.company, h.specialization, h.version, h.updated_at";

pub const REQUEST_COLUMNS: &str = "r.id, r.request_type, r.requester_id, \
  r.requester_role, r.target_id, r.target_role, r.status, r.created_at, \
  r.updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub email:      String,
  pub role:       String,
  pub created_at: String,
}

impl RawUser {
  /// Read [`USER_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(at)?,
      username:   row.get(at + 1)?,
      email:      row.get(at + 2)?,
      role:       row.get(at + 3)?,
      created_at: row.get(at + 4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      email:      self.email,
      role:       self.role.parse()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `hr_records` row.
pub struct RawHrRecord {
  pub hr_id:               String,
  pub hr_status:           String,
  pub admin_manager_id:    Option<String>,
  pub years_of_experience: Option<f64>,
  pub company:             Option<String>,
  pub specialization:      Option<String>,
  pub version:             i64,
  pub updated_at:          String,
}

impl RawHrRecord {
  /// Read [`HR_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      hr_id:               row.get(at)?,
      hr_status:           row.get(at + 1)?,
      admin_manager_id:    row.get(at + 2)?,
      years_of_experience: row.get(at + 3)?,
      company:             row.get(at + 4)?,
      specialization:      row.get(at + 5)?,
      version:             row.get(at + 6)?,
      updated_at:          row.get(at + 7)?,
    })
  }

  pub fn into_record(self) -> Result<HrRecord> {
    let admin_manager_id = self
      .admin_manager_id
      .as_deref()
      .map(decode_uuid)
      .transpose()?;

    Ok(HrRecord {
      hr_id: decode_uuid(&self.hr_id)?,
      hr_status: self.hr_status.parse()?,
      admin_manager_id,
      years_of_experience: self.years_of_experience,
      company: self.company,
      specialization: self.specialization,
      version: self.version as u64,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// A `users` row joined with its `hr_records` row.
pub struct RawHrProfile {
  pub user:   RawUser,
  pub record: RawHrRecord,
}

impl RawHrProfile {
  /// Read [`USER_COLUMNS`] followed by [`HR_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user:   RawUser::from_row(row, 0)?,
      record: RawHrRecord::from_row(row, 5)?,
    })
  }

  pub fn into_profile(self) -> Result<HrProfile> {
    Ok(HrProfile {
      user:   self.user.into_user()?,
      record: self.record.into_record()?,
    })
  }
}

/// Raw strings read directly from a `mapping_requests` row.
pub struct RawRequest {
  pub id:             String,
  pub request_type:   String,
  pub requester_id:   String,
  pub requester_role: String,
  pub target_id:      String,
  pub target_role:    String,
  pub status:         String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawRequest {
  /// Read [`REQUEST_COLUMNS`] from the start of the row.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      request_type:   row.get(1)?,
      requester_id:   row.get(2)?,
      requester_role: row.get(3)?,
      target_id:      row.get(4)?,
      target_role:    row.get(5)?,
      status:         row.get(6)?,
      created_at:     row.get(7)?,
      updated_at:     row.get(8)?,
    })
  }

  pub fn into_request(self) -> Result<MappingRequest> {
    Ok(MappingRequest {
      id:             decode_uuid(&self.id)?,
      request_type:   self.request_type.parse()?,
      requester_id:   decode_uuid(&self.requester_id)?,
      requester_role: self.requester_role.parse()?,
      target_id:      decode_uuid(&self.target_id)?,
      target_role:    self.target_role.parse()?,
      status:         self.status.parse()?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}
