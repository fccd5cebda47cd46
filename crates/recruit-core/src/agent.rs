//! Role-scoped façades over a [`MappingStore`].
//!
//! Each method names one operation an HR or Admin can take, turns it into a
//! [`Command`], and shapes the result. No state logic lives here; everything
//! is decided by [`crate::engine::apply`] inside the store's transaction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error,
  engine::{Action, Actor, Command, Transition},
  identity::{HrProfile, HrRecord, ProfileUpdate, Role, User},
  request::MappingRequest,
  store::{HrQuery, MappingStore, RequestQuery},
};

/// Returned by operations whose only result is that they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
  pub message: String,
}

impl Ack {
  fn new(message: impl Into<String>) -> Self {
    Self { message: message.into() }
  }
}

fn primary<E: From<Error>>(
  transition: Transition,
  action: &'static str,
) -> Result<MappingRequest, E> {
  transition
    .request
    .ok_or(Error::MissingSubject { action }.into())
}

// ─── HR ──────────────────────────────────────────────────────────────────────

/// Operations available to one HR user.
pub struct HrAgent<'a, S> {
  store:            &'a S,
  hr_id:            Uuid,
  expected_version: Option<u64>,
}

impl<'a, S: MappingStore> HrAgent<'a, S> {
  pub fn new(store: &'a S, hr_id: Uuid) -> Self {
    Self { store, hr_id, expected_version: None }
  }

  /// Fail mutations with a conflict unless the HR record is still at
  /// `version`.
  pub fn expecting(mut self, version: Option<u64>) -> Self {
    self.expected_version = version;
    self
  }

  pub fn hr_id(&self) -> Uuid { self.hr_id }

  async fn run(&self, action: Action) -> Result<Transition, S::Error> {
    let command = Command::new(Actor::hr(self.hr_id), action)
      .expecting(self.expected_version);
    self.store.transition(command).await
  }

  async fn profile_of(&self, record: HrRecord) -> Result<HrProfile, S::Error> {
    let user = self
      .store
      .get_user(self.hr_id)
      .await?
      .ok_or(Error::UserNotFound(self.hr_id))?;
    Ok(HrProfile { user, record })
  }

  // ── Mutations ─────────────────────────────────────────────────────────

  pub async fn update_profile(
    &self,
    update: ProfileUpdate,
  ) -> Result<HrProfile, S::Error> {
    let t = self.run(Action::UpdateProfile(update)).await?;
    self.profile_of(t.hr).await
  }

  pub async fn apply_to_admin(
    &self,
    admin_id: Uuid,
  ) -> Result<MappingRequest, S::Error> {
    let t = self.run(Action::Apply { admin_id }).await?;
    primary(t, "apply")
  }

  pub async fn cancel_application(
    &self,
    request_id: Uuid,
  ) -> Result<MappingRequest, S::Error> {
    let t = self.run(Action::CancelApplication { request_id }).await?;
    primary(t, "cancel application")
  }

  /// Pick one admin-approved application; every other live request is
  /// superseded.
  pub async fn confirm_admin_choice(
    &self,
    request_id: Uuid,
  ) -> Result<HrProfile, S::Error> {
    let t = self.run(Action::Confirm { request_id }).await?;
    self.profile_of(t.hr).await
  }

  pub async fn accept_request(
    &self,
    request_id: Uuid,
  ) -> Result<HrProfile, S::Error> {
    let t = self.run(Action::Accept { request_id }).await?;
    self.profile_of(t.hr).await
  }

  pub async fn reject_request(&self, request_id: Uuid) -> Result<Ack, S::Error> {
    self.run(Action::RejectInvitation { request_id }).await?;
    Ok(Ack::new("Request rejected"))
  }

  pub async fn unmap(&self) -> Result<HrProfile, S::Error> {
    let t = self.run(Action::Unmap { hr_id: self.hr_id }).await?;
    self.profile_of(t.hr).await
  }

  // ── Views ─────────────────────────────────────────────────────────────

  pub async fn profile(&self) -> Result<HrProfile, S::Error> {
    self
      .store
      .get_hr(self.hr_id)
      .await?
      .ok_or_else(|| Error::UserNotFound(self.hr_id).into())
  }

  pub async fn my_applications(&self) -> Result<Vec<MappingRequest>, S::Error> {
    let query = RequestQuery::my_applications(self.hr_id);
    self.store.query_requests(&query).await
  }

  pub async fn incoming_requests(&self) -> Result<Vec<MappingRequest>, S::Error> {
    let query = RequestQuery::incoming_requests(self.hr_id);
    self.store.query_requests(&query).await
  }

  pub async fn admin_approved_applications(
    &self,
  ) -> Result<Vec<MappingRequest>, S::Error> {
    let query = RequestQuery::admin_approved_applications(self.hr_id);
    self.store.query_requests(&query).await
  }

  /// The admin this HR is mapped to, if any.
  pub async fn current_mapping(&self) -> Result<Option<User>, S::Error> {
    let profile = self.profile().await?;
    match profile.record.admin_manager_id {
      Some(admin_id) => self.store.get_user(admin_id).await,
      None => Ok(None),
    }
  }

  pub async fn list_admins(&self) -> Result<Vec<User>, S::Error> {
    self.store.list_users(Some(Role::Admin)).await
  }
}

// ─── Admin ───────────────────────────────────────────────────────────────────

/// Operations available to one Admin user.
pub struct AdminAgent<'a, S> {
  store:            &'a S,
  admin_id:         Uuid,
  expected_version: Option<u64>,
}

impl<'a, S: MappingStore> AdminAgent<'a, S> {
  pub fn new(store: &'a S, admin_id: Uuid) -> Self {
    Self { store, admin_id, expected_version: None }
  }

  /// Fail mutations with a conflict unless the affected HR record is still
  /// at `version`.
  pub fn expecting(mut self, version: Option<u64>) -> Self {
    self.expected_version = version;
    self
  }

  pub fn admin_id(&self) -> Uuid { self.admin_id }

  async fn run(&self, action: Action) -> Result<Transition, S::Error> {
    let command = Command::new(Actor::admin(self.admin_id), action)
      .expecting(self.expected_version);
    self.store.transition(command).await
  }

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Invite an HR.
  pub async fn send_admin_request(
    &self,
    hr_id: Uuid,
  ) -> Result<MappingRequest, S::Error> {
    let t = self.run(Action::Invite { hr_id }).await?;
    primary(t, "invite")
  }

  pub async fn approve_application(
    &self,
    request_id: Uuid,
  ) -> Result<Ack, S::Error> {
    self.run(Action::Approve { request_id }).await?;
    Ok(Ack::new("Application approved"))
  }

  pub async fn reject_application(
    &self,
    request_id: Uuid,
  ) -> Result<Ack, S::Error> {
    self.run(Action::RejectApplication { request_id }).await?;
    Ok(Ack::new("Application rejected"))
  }

  pub async fn withdraw_request(
    &self,
    request_id: Uuid,
  ) -> Result<MappingRequest, S::Error> {
    let t = self.run(Action::WithdrawInvitation { request_id }).await?;
    primary(t, "withdraw invitation")
  }

  pub async fn unmap_hr(&self, hr_id: Uuid) -> Result<Ack, S::Error> {
    self.run(Action::Unmap { hr_id }).await?;
    Ok(Ack::new("HR unmapped"))
  }

  // ── Views ─────────────────────────────────────────────────────────────

  pub async fn pending_applications(
    &self,
  ) -> Result<Vec<MappingRequest>, S::Error> {
    let query = RequestQuery::pending_applications_for_admin(self.admin_id);
    self.store.query_requests(&query).await
  }

  pub async fn sent_requests(&self) -> Result<Vec<MappingRequest>, S::Error> {
    let query = RequestQuery::sent_requests_by_admin(self.admin_id);
    self.store.query_requests(&query).await
  }

  pub async fn mapped_hrs(&self) -> Result<Vec<HrProfile>, S::Error> {
    let query = HrQuery::managed_by(self.admin_id);
    self.store.list_hrs(&query).await
  }
}
