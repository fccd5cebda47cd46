//! The `MappingStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `recruit-store-sqlite`).
//! Higher layers (`recruit-api`, the agent façades) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error, ErrorKind,
  engine::{Command, Transition},
  identity::{HrProfile, HrStatus, NewUser, Role, User},
  request::{MappingRequest, RequestStatus, RequestType},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`MappingStore::query_requests`]. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestQuery {
  pub request_type: Option<RequestType>,
  pub requester_id: Option<Uuid>,
  pub target_id:    Option<Uuid>,
  /// Empty means any status.
  pub statuses:     Vec<RequestStatus>,
  pub limit:        Option<usize>,
}

impl RequestQuery {
  /// Every application an HR has sent, in any status.
  pub fn my_applications(hr_id: Uuid) -> Self {
    Self {
      request_type: Some(RequestType::Application),
      requester_id: Some(hr_id),
      ..Default::default()
    }
  }

  /// Invitations still waiting on the HR.
  pub fn incoming_requests(hr_id: Uuid) -> Self {
    Self {
      request_type: Some(RequestType::Request),
      target_id: Some(hr_id),
      statuses: vec![
        RequestStatus::Pending,
        RequestStatus::RequestPendingHrApproval,
      ],
      ..Default::default()
    }
  }

  /// Applications the HR may now confirm.
  pub fn admin_approved_applications(hr_id: Uuid) -> Self {
    Self {
      request_type: Some(RequestType::Application),
      requester_id: Some(hr_id),
      statuses: vec![RequestStatus::AdminApproved],
      ..Default::default()
    }
  }

  /// Applications waiting on an admin's decision.
  pub fn pending_applications_for_admin(admin_id: Uuid) -> Self {
    Self {
      request_type: Some(RequestType::Application),
      target_id: Some(admin_id),
      statuses: vec![
        RequestStatus::Pending,
        RequestStatus::PendingAdminApproval,
      ],
      ..Default::default()
    }
  }

  /// Every invitation an admin has sent, in any status.
  pub fn sent_requests_by_admin(admin_id: Uuid) -> Self {
    Self {
      request_type: Some(RequestType::Request),
      requester_id: Some(admin_id),
      ..Default::default()
    }
  }

  pub fn matches(&self, request: &MappingRequest) -> bool {
    self.request_type.is_none_or(|t| t == request.request_type)
      && self.requester_id.is_none_or(|id| id == request.requester_id)
      && self.target_id.is_none_or(|id| id == request.target_id)
      && (self.statuses.is_empty() || self.statuses.contains(&request.status))
  }
}

/// Parameters for [`MappingStore::list_hrs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HrQuery {
  pub admin_manager_id: Option<Uuid>,
  pub status:           Option<HrStatus>,
}

impl HrQuery {
  /// HRs currently managed by `admin_id`.
  pub fn managed_by(admin_id: Uuid) -> Self {
    Self { admin_manager_id: Some(admin_id), status: None }
  }
}

// ─── Error seam ──────────────────────────────────────────────────────────────

/// What a backend error must expose so callers can classify it without
/// knowing the backend.
pub trait StoreError:
  std::error::Error + From<Error> + Send + Sync + 'static
{
  /// The workflow error this wraps, if it is one.
  fn as_core(&self) -> Option<&Error>;

  fn kind(&self) -> ErrorKind {
    self.as_core().map_or(ErrorKind::Internal, Error::kind)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a mapping store backend.
///
/// Requests are never deleted. Every state change goes through
/// [`MappingStore::transition`], which must load the affected HR's ledger,
/// run [`crate::engine::apply`], and write the result atomically with a
/// version check on the HR record.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MappingStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Register a user. HR users also get a fresh HR record.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn list_users(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  // ── HR records ────────────────────────────────────────────────────────

  /// Returns `None` if `id` is not an HR.
  fn get_hr(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<HrProfile>, Self::Error>> + Send + '_;

  fn list_hrs<'a>(
    &'a self,
    query: &'a HrQuery,
  ) -> impl Future<Output = Result<Vec<HrProfile>, Self::Error>> + Send + 'a;

  // ── Requests ──────────────────────────────────────────────────────────

  fn get_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MappingRequest>, Self::Error>> + Send + '_;

  fn query_requests<'a>(
    &'a self,
    query: &'a RequestQuery,
  ) -> impl Future<Output = Result<Vec<MappingRequest>, Self::Error>> + Send + 'a;

  // ── Transitions ───────────────────────────────────────────────────────

  /// Apply `command` atomically. On error nothing is written.
  fn transition(
    &self,
    command: Command,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;
}
