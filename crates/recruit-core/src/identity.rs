//! Identity records: the minimal user and HR fields the mapping workflow
//! reads and writes.
//!
//! Everything else about a person (resume, interviews, messages) lives in
//! other services and never enters this crate.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Role ────────────────────────────────────────────────────────────────────

/// The kind of account a user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Candidate,
  Hr,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Candidate => "candidate",
      Self::Hr => "hr",
      Self::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "candidate" => Ok(Self::Candidate),
      "hr" => Ok(Self::Hr),
      "admin" => Ok(Self::Admin),
      other => Err(Error::UnknownDiscriminant {
        what:  "role",
        value: other.to_owned(),
      }),
    }
  }
}

// ─── HrStatus ────────────────────────────────────────────────────────────────

/// Where an HR user stands in the mapping workflow.
///
/// Never set piecemeal: it is always recomputed by
/// [`crate::engine::derive_hr_status`] after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HrStatus {
  PendingProfile,
  ProfileComplete,
  ApplicationPending,
  AdminRequestPending,
  Mapped,
  Unmapped,
}

impl HrStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::PendingProfile => "pending_profile",
      Self::ProfileComplete => "profile_complete",
      Self::ApplicationPending => "application_pending",
      Self::AdminRequestPending => "admin_request_pending",
      Self::Mapped => "mapped",
      Self::Unmapped => "unmapped",
    }
  }
}

impl fmt::Display for HrStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for HrStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pending_profile" => Ok(Self::PendingProfile),
      "profile_complete" => Ok(Self::ProfileComplete),
      "application_pending" => Ok(Self::ApplicationPending),
      "admin_request_pending" => Ok(Self::AdminRequestPending),
      "mapped" => Ok(Self::Mapped),
      "unmapped" => Ok(Self::Unmapped),
      other => Err(Error::UnknownDiscriminant {
        what:  "hr status",
        value: other.to_owned(),
      }),
    }
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// An account of any role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub email:      String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::MappingStore::add_user`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  pub username: String,
  pub email:    String,
  pub role:     Role,
}

impl NewUser {
  /// Trim the input and reject values that can never be valid.
  pub fn normalize(mut self) -> Result<Self> {
    self.username = self.username.trim().to_owned();
    self.email = self.email.trim().to_lowercase();
    if self.username.is_empty() {
      return Err(Error::InvalidUser("username must not be empty".into()));
    }
    if !self.email.contains('@') {
      return Err(Error::InvalidUser(format!(
        "{:?} is not an email address",
        self.email
      )));
    }
    Ok(self)
  }
}

// ─── HrRecord ────────────────────────────────────────────────────────────────

/// The HR-specific half of an HR user's identity.
///
/// `admin_manager_id` is non-null iff `hr_status == Mapped`. `version` is
/// bumped by every transition that touches this HR and is the unit of
/// optimistic concurrency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrRecord {
  pub hr_id:               Uuid,
  pub hr_status:           HrStatus,
  pub admin_manager_id:    Option<Uuid>,
  pub years_of_experience: Option<f64>,
  pub company:             Option<String>,
  pub specialization:      Option<String>,
  pub version:             u64,
  pub updated_at:          DateTime<Utc>,
}

impl HrRecord {
  /// A freshly registered HR with no profile details.
  pub fn new(hr_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      hr_id,
      hr_status: HrStatus::PendingProfile,
      admin_manager_id: None,
      years_of_experience: None,
      company: None,
      specialization: None,
      version: 0,
      updated_at: now,
    }
  }

  pub fn is_mapped(&self) -> bool { self.admin_manager_id.is_some() }

  /// Enough detail for admins to judge an application.
  pub fn profile_complete(&self) -> bool {
    self.years_of_experience.is_some()
      && self.company.as_deref().is_some_and(|c| !c.trim().is_empty())
  }

  /// Merge `update` into this record. Fields left `None` are unchanged.
  pub fn apply_profile(&mut self, update: &ProfileUpdate) -> Result<()> {
    if let Some(years) = update.years_of_experience {
      if !years.is_finite() || years < 0.0 {
        return Err(Error::InvalidProfile(format!(
          "years_of_experience must be a non-negative number, got {years}"
        )));
      }
      self.years_of_experience = Some(years);
    }
    if let Some(company) = &update.company {
      self.company = Some(company.trim().to_owned());
    }
    if let Some(specialization) = &update.specialization {
      if specialization.chars().count() > 150 {
        return Err(Error::InvalidProfile(
          "specialization is limited to 150 characters".into(),
        ));
      }
      self.specialization = Some(specialization.trim().to_owned());
    }
    Ok(())
  }
}

/// Profile fields an HR may edit about themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
  pub years_of_experience: Option<f64>,
  pub company:             Option<String>,
  pub specialization:      Option<String>,
}

// ─── HrProfile ───────────────────────────────────────────────────────────────

/// A user joined with their HR record, as HR-facing operations return it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrProfile {
  #[serde(flatten)]
  pub user:   User,
  #[serde(flatten)]
  pub record: HrRecord,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record() -> HrRecord { HrRecord::new(Uuid::new_v4(), Utc::now()) }

  #[test]
  fn new_record_is_pending_profile() {
    let r = record();
    assert_eq!(r.hr_status, HrStatus::PendingProfile);
    assert!(!r.is_mapped());
    assert!(!r.profile_complete());
    assert_eq!(r.version, 0);
  }

  #[test]
  fn profile_complete_needs_experience_and_company() {
    let mut r = record();
    r.apply_profile(&ProfileUpdate {
      years_of_experience: Some(4.5),
      ..Default::default()
    })
    .unwrap();
    assert!(!r.profile_complete());

    r.apply_profile(&ProfileUpdate {
      company: Some("   ".into()),
      ..Default::default()
    })
    .unwrap();
    assert!(!r.profile_complete());

    r.apply_profile(&ProfileUpdate {
      company: Some(" Initech ".into()),
      ..Default::default()
    })
    .unwrap();
    assert!(r.profile_complete());
    assert_eq!(r.company.as_deref(), Some("Initech"));
  }

  #[test]
  fn negative_experience_is_rejected() {
    let mut r = record();
    let err = r
      .apply_profile(&ProfileUpdate {
        years_of_experience: Some(-1.0),
        ..Default::default()
      })
      .unwrap_err();
    assert!(matches!(err, Error::InvalidProfile(_)));
    assert_eq!(r.years_of_experience, None);
  }

  #[test]
  fn new_user_is_trimmed_and_checked() {
    let user = NewUser {
      username: "  hr1 ".into(),
      email:    " HR1@Example.com".into(),
      role:     Role::Hr,
    }
    .normalize()
    .unwrap();
    assert_eq!(user.username, "hr1");
    assert_eq!(user.email, "hr1@example.com");

    let err = NewUser {
      username: " ".into(),
      email:    "x@y".into(),
      role:     Role::Admin,
    }
    .normalize()
    .unwrap_err();
    assert!(matches!(err, Error::InvalidUser(_)));
  }

  #[test]
  fn status_strings_parse_back() {
    for s in [
      HrStatus::PendingProfile,
      HrStatus::ProfileComplete,
      HrStatus::ApplicationPending,
      HrStatus::AdminRequestPending,
      HrStatus::Mapped,
      HrStatus::Unmapped,
    ] {
      assert_eq!(s.as_str().parse::<HrStatus>().unwrap(), s);
    }
    assert!("suspended".parse::<HrStatus>().is_err());
  }

  #[test]
  fn profile_serialises_flat() {
    let now = Utc::now();
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   "hr1".into(),
      email:      "hr1@example.com".into(),
      role:       Role::Hr,
      created_at: now,
    };
    let profile = HrProfile {
      record: HrRecord::new(user.user_id, now),
      user,
    };
    let json = serde_json::to_value(&profile).unwrap();
    assert_eq!(json["username"], "hr1");
    assert_eq!(json["role"], "hr");
    assert_eq!(json["hr_status"], "pending_profile");
    assert!(json["admin_manager_id"].is_null());
  }
}
