//! `MappingRequest`, the only entity with a lifecycle.
//!
//! Requests are never deleted. Once a request reaches a terminal status it is
//! kept as history and no further action may touch it.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, identity::Role};

// ─── RequestType ─────────────────────────────────────────────────────────────

/// Which side opened the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
  /// HR → Admin.
  Application,
  /// Admin → HR (an invitation).
  Request,
}

impl RequestType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Application => "application",
      Self::Request => "request",
    }
  }
}

impl fmt::Display for RequestType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RequestType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "application" => Ok(Self::Application),
      "request" => Ok(Self::Request),
      other => Err(Error::UnknownDiscriminant {
        what:  "request type",
        value: other.to_owned(),
      }),
    }
  }
}

// ─── RequestStatus ───────────────────────────────────────────────────────────

/// The closed set of request states.
///
/// `Pending` is never produced by the engine; rows carrying it are treated as
/// awaiting the target party, whichever side that is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
  Pending,
  Accepted,
  Rejected,
  Cancelled,
  PendingAdminApproval,
  AdminApproved,
  AdminRejected,
  HrConfirmedMapping,
  HrRejectedInvitation,
  HrCancelledApplication,
  RequestPendingHrApproval,
  /// Spelled the way stored data and clients already spell it.
  #[serde(rename = "superceded")]
  Superceded,
}

impl RequestStatus {
  pub const ALL: [Self; 12] = [
    Self::Pending,
    Self::Accepted,
    Self::Rejected,
    Self::Cancelled,
    Self::PendingAdminApproval,
    Self::AdminApproved,
    Self::AdminRejected,
    Self::HrConfirmedMapping,
    Self::HrRejectedInvitation,
    Self::HrCancelledApplication,
    Self::RequestPendingHrApproval,
    Self::Superceded,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Accepted => "accepted",
      Self::Rejected => "rejected",
      Self::Cancelled => "cancelled",
      Self::PendingAdminApproval => "pending_admin_approval",
      Self::AdminApproved => "admin_approved",
      Self::AdminRejected => "admin_rejected",
      Self::HrConfirmedMapping => "hr_confirmed_mapping",
      Self::HrRejectedInvitation => "hr_rejected_invitation",
      Self::HrCancelledApplication => "hr_cancelled_application",
      Self::RequestPendingHrApproval => "request_pending_hr_approval",
      Self::Superceded => "superceded",
    }
  }

  /// No further transition is valid from this status.
  pub fn is_terminal(self) -> bool { !self.is_live() }

  /// The request can still end in a mapping.
  pub fn is_live(self) -> bool {
    match self {
      Self::Pending
      | Self::PendingAdminApproval
      | Self::AdminApproved
      | Self::RequestPendingHrApproval => true,
      Self::Accepted
      | Self::Rejected
      | Self::Cancelled
      | Self::AdminRejected
      | Self::HrConfirmedMapping
      | Self::HrRejectedInvitation
      | Self::HrCancelledApplication
      | Self::Superceded => false,
    }
  }

  /// The request ended by mapping its HR.
  pub fn is_mapping(self) -> bool {
    matches!(self, Self::Accepted | Self::HrConfirmedMapping)
  }

  /// How a request closed, so that losing to another admin is never shown
  /// as a refusal.
  pub fn outcome(self) -> Outcome {
    match self {
      Self::Pending
      | Self::PendingAdminApproval
      | Self::AdminApproved
      | Self::RequestPendingHrApproval => Outcome::Open,
      Self::Accepted | Self::HrConfirmedMapping => Outcome::Mapped,
      Self::Rejected | Self::AdminRejected | Self::HrRejectedInvitation => {
        Outcome::Refused
      }
      Self::Cancelled | Self::HrCancelledApplication => Outcome::Withdrawn,
      Self::Superceded => Outcome::MappedElsewhere,
    }
  }
}

impl fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RequestStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| Error::UnknownDiscriminant {
        what:  "request status",
        value: s.to_owned(),
      })
  }
}

/// A coarse reading of [`RequestStatus`] for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Open,
  Mapped,
  Refused,
  Withdrawn,
  /// The HR mapped to a different admin.
  MappedElsewhere,
}

impl Outcome {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Open => "open",
      Self::Mapped => "mapped",
      Self::Refused => "refused",
      Self::Withdrawn => "withdrawn",
      Self::MappedElsewhere => "mapped_elsewhere",
    }
  }
}

// ─── MappingRequest ──────────────────────────────────────────────────────────

/// One application or invitation between an HR and an Admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRequest {
  pub id:             Uuid,
  pub request_type:   RequestType,
  pub requester_id:   Uuid,
  pub requester_role: Role,
  pub target_id:      Uuid,
  pub target_role:    Role,
  pub status:         RequestStatus,
  pub created_at:     DateTime<Utc>,
  /// Changes on every transition.
  pub updated_at:     DateTime<Utc>,
}

impl MappingRequest {
  /// A new application from `hr_id` to `admin_id`, awaiting the admin.
  pub fn application(hr_id: Uuid, admin_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      id:             Uuid::new_v4(),
      request_type:   RequestType::Application,
      requester_id:   hr_id,
      requester_role: Role::Hr,
      target_id:      admin_id,
      target_role:    Role::Admin,
      status:         RequestStatus::PendingAdminApproval,
      created_at:     now,
      updated_at:     now,
    }
  }

  /// A new invitation from `admin_id` to `hr_id`, awaiting the HR.
  pub fn invitation(admin_id: Uuid, hr_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      id:             Uuid::new_v4(),
      request_type:   RequestType::Request,
      requester_id:   admin_id,
      requester_role: Role::Admin,
      target_id:      hr_id,
      target_role:    Role::Hr,
      status:         RequestStatus::RequestPendingHrApproval,
      created_at:     now,
      updated_at:     now,
    }
  }

  /// The HR party, whichever side opened the request.
  pub fn hr_id(&self) -> Uuid {
    match self.request_type {
      RequestType::Application => self.requester_id,
      RequestType::Request => self.target_id,
    }
  }

  /// The Admin party, whichever side opened the request.
  pub fn admin_id(&self) -> Uuid {
    match self.request_type {
      RequestType::Application => self.target_id,
      RequestType::Request => self.requester_id,
    }
  }

  pub fn is_live(&self) -> bool { self.status.is_live() }

  /// Waiting on the admin's decision (applications only).
  pub fn awaits_admin(&self) -> bool {
    self.request_type == RequestType::Application
      && matches!(
        self.status,
        RequestStatus::Pending | RequestStatus::PendingAdminApproval
      )
  }

  /// Waiting on the HR's decision (invitations only).
  pub fn awaits_hr(&self) -> bool {
    self.request_type == RequestType::Request
      && matches!(
        self.status,
        RequestStatus::Pending | RequestStatus::RequestPendingHrApproval
      )
  }

  pub(crate) fn set_status(&mut self, status: RequestStatus, now: DateTime<Utc>) {
    self.status = status;
    self.updated_at = now;
  }
}
