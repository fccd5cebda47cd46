//! Error types for `recruit-core`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  identity::{HrStatus, Role},
  request::{RequestStatus, RequestType},
};

/// How a failure should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// The action is not valid from the current state; refresh and reconsider.
  PreconditionFailed,
  NotFound,
  /// Lost a race against another transition on the same HR; refetch and
  /// retry.
  Conflict,
  /// The acting identity is not a party allowed to take this action.
  Unauthorized,
  /// Malformed input.
  Invalid,
  Internal,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::PreconditionFailed => "precondition_failed",
      Self::NotFound => "not_found",
      Self::Conflict => "conflict",
      Self::Unauthorized => "unauthorized",
      Self::Invalid => "invalid",
      Self::Internal => "internal",
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("request not found: {0}")]
  RequestNotFound(Uuid),

  #[error("user {id} is not {expected}")]
  WrongRole { id: Uuid, expected: Role },

  #[error("request {request_id} is {actual}, not {expected}")]
  WrongRequestType {
    request_id: Uuid,
    expected:   RequestType,
    actual:     RequestType,
  },

  #[error("cannot {action} request {request_id}: status is {status}")]
  RequestState {
    request_id: Uuid,
    status:     RequestStatus,
    action:     &'static str,
  },

  #[error("cannot {action}: HR {hr_id} is {status}")]
  HrState {
    hr_id:  Uuid,
    status: HrStatus,
    action: &'static str,
  },

  #[error("HR {hr_id} and admin {admin_id} already have live request {existing}")]
  DuplicateRequest {
    hr_id:    Uuid,
    admin_id: Uuid,
    existing: Uuid,
  },

  #[error("{field} {value:?} is already taken")]
  Duplicate { field: &'static str, value: String },

  #[error("HR {hr_id} is already mapped to admin {admin_id}")]
  AlreadyMapped { hr_id: Uuid, admin_id: Uuid },

  #[error("HR {hr_id} changed concurrently: expected version {expected}, found {found}")]
  VersionConflict {
    hr_id:    Uuid,
    expected: u64,
    found:    u64,
  },

  #[error("user {actor} may not {action}")]
  Forbidden { actor: Uuid, action: &'static str },

  #[error("invalid profile: {0}")]
  InvalidProfile(String),

  #[error("invalid user: {0}")]
  InvalidUser(String),

  #[error("unknown {what} discriminant: {value:?}")]
  UnknownDiscriminant { what: &'static str, value: String },

  #[error("{action} produced no request")]
  MissingSubject { action: &'static str },
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::UserNotFound(_) | Self::RequestNotFound(_) | Self::WrongRole { .. } => {
        ErrorKind::NotFound
      }
      Self::WrongRequestType { .. }
      | Self::RequestState { .. }
      | Self::HrState { .. }
      | Self::DuplicateRequest { .. }
      | Self::Duplicate { .. } => ErrorKind::PreconditionFailed,
      Self::AlreadyMapped { .. } | Self::VersionConflict { .. } => {
        ErrorKind::Conflict
      }
      Self::Forbidden { .. } => ErrorKind::Unauthorized,
      Self::InvalidProfile(_) | Self::InvalidUser(_) => ErrorKind::Invalid,
      Self::UnknownDiscriminant { .. } | Self::MissingSubject { .. } => {
        ErrorKind::Internal
      }
    }
  }

  /// The state that blocked the action, for callers that want to show it.
  pub fn conflicting_status(&self) -> Option<String> {
    match self {
      Self::RequestState { status, .. } => Some(status.to_string()),
      Self::HrState { status, .. } => Some(status.to_string()),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
