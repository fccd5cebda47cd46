//! The request transition engine.
//!
//! [`apply`] is a pure function of a [`Ledger`] (one HR's record plus every
//! request naming that HR) and a [`Command`]. It returns either the complete
//! set of records to write, or an error and nothing to write. Storage
//! backends load the ledger, call [`apply`], and persist the [`Transition`]
//! in one atomic unit; they never decide a status themselves.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  identity::{HrRecord, HrStatus, ProfileUpdate, Role},
  request::{MappingRequest, RequestStatus, RequestType},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// The identity taking an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Actor {
  pub fn hr(user_id: Uuid) -> Self { Self { user_id, role: Role::Hr } }

  pub fn admin(user_id: Uuid) -> Self { Self { user_id, role: Role::Admin } }
}

/// Everything a caller can ask the engine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  /// HR applies to an admin.
  Apply { admin_id: Uuid },
  /// Admin invites an HR.
  Invite { hr_id: Uuid },
  /// Admin approves an application; the HR still has to confirm.
  Approve { request_id: Uuid },
  RejectApplication { request_id: Uuid },
  /// HR picks one admin-approved application.
  Confirm { request_id: Uuid },
  CancelApplication { request_id: Uuid },
  /// HR accepts an invitation.
  Accept { request_id: Uuid },
  RejectInvitation { request_id: Uuid },
  /// Admin takes back an invitation the HR has not answered.
  WithdrawInvitation { request_id: Uuid },
  /// Ends the current mapping; the HR itself or its managing admin.
  Unmap { hr_id: Uuid },
  UpdateProfile(ProfileUpdate),
}

impl Action {
  pub fn name(&self) -> &'static str {
    match self {
      Self::Apply { .. } => "apply",
      Self::Invite { .. } => "invite",
      Self::Approve { .. } => "approve",
      Self::RejectApplication { .. } => "reject application",
      Self::Confirm { .. } => "confirm",
      Self::CancelApplication { .. } => "cancel application",
      Self::Accept { .. } => "accept",
      Self::RejectInvitation { .. } => "reject invitation",
      Self::WithdrawInvitation { .. } => "withdraw invitation",
      Self::Unmap { .. } => "unmap",
      Self::UpdateProfile(_) => "update profile",
    }
  }

  /// The request this action targets, if it targets an existing one.
  pub fn request_id(&self) -> Option<Uuid> {
    match self {
      Self::Approve { request_id }
      | Self::RejectApplication { request_id }
      | Self::Confirm { request_id }
      | Self::CancelApplication { request_id }
      | Self::Accept { request_id }
      | Self::RejectInvitation { request_id }
      | Self::WithdrawInvitation { request_id } => Some(*request_id),
      Self::Apply { .. }
      | Self::Invite { .. }
      | Self::Unmap { .. }
      | Self::UpdateProfile(_) => None,
    }
  }

  /// The HR whose ledger this action runs against, when it can be known
  /// without loading a request.
  pub fn hr_id(&self, actor: &Actor) -> Option<Uuid> {
    match self {
      Self::Apply { .. } | Self::UpdateProfile(_) => Some(actor.user_id),
      Self::Invite { hr_id } | Self::Unmap { hr_id } => Some(*hr_id),
      _ => None,
    }
  }
}

/// An action by an actor, optionally pinned to the HR version the caller
/// last observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
  pub actor:            Actor,
  pub action:           Action,
  pub expected_version: Option<u64>,
}

impl Command {
  pub fn new(actor: Actor, action: Action) -> Self {
    Self { actor, action, expected_version: None }
  }

  pub fn expecting(mut self, version: Option<u64>) -> Self {
    self.expected_version = version;
    self
  }
}

/// One HR's record and every request in which that HR is a party.
#[derive(Debug, Clone)]
pub struct Ledger {
  pub hr:       HrRecord,
  pub requests: Vec<MappingRequest>,
}

impl Ledger {
  /// The live request between this HR and `admin_id`, in either direction.
  pub fn live_with(&self, admin_id: Uuid) -> Option<&MappingRequest> {
    self
      .requests
      .iter()
      .find(|r| r.is_live() && r.admin_id() == admin_id)
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// The records a successful command changed. Must be written all together.
#[derive(Debug, Clone)]
pub struct Transition {
  /// The HR record after the command, version already bumped.
  pub hr:      HrRecord,
  /// A request the command opened.
  pub created: Option<MappingRequest>,
  /// Existing requests whose status changed, including superseded siblings.
  pub updated: Vec<MappingRequest>,
  /// The request the command was about, in its new state.
  pub request: Option<MappingRequest>,
}

impl Transition {
  pub fn superseded(&self) -> impl Iterator<Item = &MappingRequest> {
    self
      .updated
      .iter()
      .filter(|r| r.status == RequestStatus::Superceded)
  }
}

// ─── Derivation ──────────────────────────────────────────────────────────────

/// Compute an HR's status from its mapping and live requests.
///
/// `requests` must be every request in which the HR is a party; only the
/// non-terminal ones count. `Unmapped` is never derived here: it is set by
/// the unmap transition itself.
pub fn derive_hr_status(
  profile_complete: bool,
  admin_manager_id: Option<Uuid>,
  requests: &[MappingRequest],
) -> HrStatus {
  if admin_manager_id.is_some() {
    return HrStatus::Mapped;
  }
  let live = |kind: RequestType| {
    requests
      .iter()
      .any(|r| r.request_type == kind && r.is_live())
  };
  if live(RequestType::Application) {
    HrStatus::ApplicationPending
  } else if live(RequestType::Request) {
    HrStatus::AdminRequestPending
  } else if profile_complete {
    HrStatus::ProfileComplete
  } else {
    HrStatus::PendingProfile
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Validate `command` against `ledger` and compute the resulting records.
///
/// On error nothing in `ledger` is meant to change; the caller must not
/// write anything.
pub fn apply(
  ledger: &Ledger,
  command: &Command,
  now: DateTime<Utc>,
) -> Result<Transition> {
  let hr_id = ledger.hr.hr_id;
  if let Some(expected) = command.expected_version
    && expected != ledger.hr.version
  {
    return Err(Error::VersionConflict {
      hr_id,
      expected,
      found: ledger.hr.version,
    });
  }

  let actor = &command.actor;
  let mut hr = ledger.hr.clone();
  let mut requests = ledger.requests.clone();

  let subject = match &command.action {
    Action::Apply { admin_id } => {
      require_self(actor, &hr, "apply")?;
      require_open(&hr, "apply")?;
      require_no_live_pair(ledger, *admin_id)?;
      let request = MappingRequest::application(hr_id, *admin_id, now);
      let id = request.id;
      requests.push(request);
      Some(id)
    }

    Action::Invite { .. } => {
      require_role(actor, Role::Admin, "invite")?;
      require_open(&hr, "receive an invitation")?;
      require_no_live_pair(ledger, actor.user_id)?;
      let request = MappingRequest::invitation(actor.user_id, hr_id, now);
      let id = request.id;
      requests.push(request);
      Some(id)
    }

    Action::Approve { request_id } => {
      let request = find(&mut requests, *request_id)?;
      require_type(request, RequestType::Application)?;
      require_party(actor, Role::Admin, request.target_id, "approve")?;
      if !request.awaits_admin() {
        return Err(state_error(request, "approve"));
      }
      request.set_status(RequestStatus::AdminApproved, now);
      Some(*request_id)
    }

    Action::RejectApplication { request_id } => {
      let request = find(&mut requests, *request_id)?;
      require_type(request, RequestType::Application)?;
      require_party(actor, Role::Admin, request.target_id, "reject")?;
      if !request.awaits_admin() {
        return Err(state_error(request, "reject"));
      }
      request.set_status(RequestStatus::AdminRejected, now);
      Some(*request_id)
    }

    Action::Confirm { request_id } => {
      let admin_id = {
        let request = find(&mut requests, *request_id)?;
        require_type(request, RequestType::Application)?;
        require_party(actor, Role::Hr, request.requester_id, "confirm")?;
        let ready = request.status == RequestStatus::AdminApproved;
        require_mappable(&hr, request, ready, "confirm")?;
        request.set_status(RequestStatus::HrConfirmedMapping, now);
        request.admin_id()
      };
      map_to(&mut hr, &mut requests, admin_id, *request_id, now);
      Some(*request_id)
    }

    Action::CancelApplication { request_id } => {
      let request = find(&mut requests, *request_id)?;
      require_type(request, RequestType::Application)?;
      require_party(actor, Role::Hr, request.requester_id, "cancel")?;
      if !request.is_live() {
        return Err(state_error(request, "cancel"));
      }
      request.set_status(RequestStatus::HrCancelledApplication, now);
      Some(*request_id)
    }

    Action::Accept { request_id } => {
      let admin_id = {
        let request = find(&mut requests, *request_id)?;
        require_type(request, RequestType::Request)?;
        require_party(actor, Role::Hr, request.target_id, "accept")?;
        let ready = request.awaits_hr();
        require_mappable(&hr, request, ready, "accept")?;
        request.set_status(RequestStatus::Accepted, now);
        request.admin_id()
      };
      map_to(&mut hr, &mut requests, admin_id, *request_id, now);
      Some(*request_id)
    }

    Action::RejectInvitation { request_id } => {
      let request = find(&mut requests, *request_id)?;
      require_type(request, RequestType::Request)?;
      require_party(actor, Role::Hr, request.target_id, "reject")?;
      if !request.awaits_hr() {
        return Err(state_error(request, "reject"));
      }
      request.set_status(RequestStatus::Rejected, now);
      Some(*request_id)
    }

    Action::WithdrawInvitation { request_id } => {
      let request = find(&mut requests, *request_id)?;
      require_type(request, RequestType::Request)?;
      require_party(actor, Role::Admin, request.requester_id, "withdraw")?;
      if !request.awaits_hr() {
        return Err(state_error(request, "withdraw"));
      }
      request.set_status(RequestStatus::Cancelled, now);
      Some(*request_id)
    }

    Action::Unmap { .. } => {
      let is_self = actor.role == Role::Hr && actor.user_id == hr_id;
      let is_manager = actor.role == Role::Admin
        && hr.admin_manager_id == Some(actor.user_id);
      if !is_self && !is_manager {
        return Err(Error::Forbidden {
          actor:  actor.user_id,
          action: "unmap",
        });
      }
      if !hr.is_mapped() {
        return Err(Error::HrState {
          hr_id,
          status: hr.hr_status,
          action: "unmap",
        });
      }
      hr.admin_manager_id = None;
      None
    }

    Action::UpdateProfile(update) => {
      require_self(actor, &hr, "update profile")?;
      hr.apply_profile(update)?;
      None
    }
  };

  let derived =
    derive_hr_status(hr.profile_complete(), hr.admin_manager_id, &requests);
  hr.hr_status = settle(ledger.hr.hr_status, derived, &command.action);
  hr.version = ledger.hr.version + 1;
  hr.updated_at = now;

  let before: HashMap<Uuid, RequestStatus> = ledger
    .requests
    .iter()
    .map(|r| (r.id, r.status))
    .collect();

  let mut created = None;
  let mut updated = Vec::new();
  for request in &requests {
    match before.get(&request.id) {
      None => created = Some(request.clone()),
      Some(status) if *status != request.status => updated.push(request.clone()),
      Some(_) => {}
    }
  }

  let request =
    subject.and_then(|id| requests.iter().find(|r| r.id == id).cloned());

  Ok(Transition { hr, created, updated, request })
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// An idle HR reads `unmapped` right after an unmap, and keeps it through
/// profile edits until a request is opened or closed.
fn settle(previous: HrStatus, derived: HrStatus, action: &Action) -> HrStatus {
  let idle = matches!(
    derived,
    HrStatus::ProfileComplete | HrStatus::PendingProfile
  );
  match action {
    Action::Unmap { .. } if idle => HrStatus::Unmapped,
    Action::UpdateProfile(_) if idle && previous == HrStatus::Unmapped => {
      HrStatus::Unmapped
    }
    _ => derived,
  }
}

fn find(
  requests: &mut [MappingRequest],
  request_id: Uuid,
) -> Result<&mut MappingRequest> {
  requests
    .iter_mut()
    .find(|r| r.id == request_id)
    .ok_or(Error::RequestNotFound(request_id))
}

fn state_error(request: &MappingRequest, action: &'static str) -> Error {
  Error::RequestState {
    request_id: request.id,
    status: request.status,
    action,
  }
}

fn require_role(actor: &Actor, role: Role, action: &'static str) -> Result<()> {
  if actor.role != role {
    return Err(Error::Forbidden { actor: actor.user_id, action });
  }
  Ok(())
}

fn require_self(actor: &Actor, hr: &HrRecord, action: &'static str) -> Result<()> {
  require_party(actor, Role::Hr, hr.hr_id, action)
}

fn require_party(
  actor: &Actor,
  role: Role,
  party: Uuid,
  action: &'static str,
) -> Result<()> {
  if actor.role != role || actor.user_id != party {
    return Err(Error::Forbidden { actor: actor.user_id, action });
  }
  Ok(())
}

fn require_type(request: &MappingRequest, expected: RequestType) -> Result<()> {
  if request.request_type != expected {
    return Err(Error::WrongRequestType {
      request_id: request.id,
      expected,
      actual: request.request_type,
    });
  }
  Ok(())
}

/// The HR may take part in a new request.
fn require_open(hr: &HrRecord, action: &'static str) -> Result<()> {
  if hr.is_mapped() || !hr.profile_complete() {
    return Err(Error::HrState {
      hr_id: hr.hr_id,
      status: hr.hr_status,
      action,
    });
  }
  Ok(())
}

fn require_no_live_pair(ledger: &Ledger, admin_id: Uuid) -> Result<()> {
  match ledger.live_with(admin_id) {
    Some(existing) => Err(Error::DuplicateRequest {
      hr_id: ledger.hr.hr_id,
      admin_id,
      existing: existing.id,
    }),
    None => Ok(()),
  }
}

/// `ready` says whether the request itself is in the state the action needs.
/// A mapped HR means this call lost the race to a sibling.
fn require_mappable(
  hr: &HrRecord,
  request: &MappingRequest,
  ready: bool,
  action: &'static str,
) -> Result<()> {
  match hr.admin_manager_id {
    None if ready => Ok(()),
    Some(admin_id) if ready || request.status == RequestStatus::Superceded => {
      Err(Error::AlreadyMapped { hr_id: hr.hr_id, admin_id })
    }
    _ => Err(state_error(request, action)),
  }
}

/// Map the HR and supersede every other live request in the same step.
fn map_to(
  hr: &mut HrRecord,
  requests: &mut [MappingRequest],
  admin_id: Uuid,
  keep: Uuid,
  now: DateTime<Utc>,
) {
  hr.admin_manager_id = Some(admin_id);
  for sibling in requests.iter_mut() {
    if sibling.id != keep && sibling.is_live() {
      sibling.set_status(RequestStatus::Superceded, now);
    }
  }
}
