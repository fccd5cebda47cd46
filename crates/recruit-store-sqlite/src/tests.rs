//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use recruit_core::{
  Error as CoreError, ErrorKind,
  agent::{AdminAgent, HrAgent},
  engine::{Action, Actor, Command},
  identity::{HrStatus, NewUser, ProfileUpdate, Role, User},
  request::RequestStatus,
  store::{HrQuery, MappingStore, RequestQuery, StoreError as _},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str, role: Role) -> User {
  s.add_user(NewUser {
    username: name.into(),
    email: format!("{name}@example.com"),
    role,
  })
  .await
  .unwrap()
}

/// An HR with a complete profile, ready to apply.
async fn ready_hr(s: &SqliteStore, name: &str) -> Uuid {
  let hr = user(s, name, Role::Hr).await;
  HrAgent::new(s, hr.user_id)
    .update_profile(ProfileUpdate {
      years_of_experience: Some(5.0),
      company:             Some("Initech".into()),
      specialization:      Some("Platform hiring".into()),
    })
    .await
    .unwrap();
  hr.user_id
}

async fn admin(s: &SqliteStore, name: &str) -> Uuid {
  user(s, name, Role::Admin).await.user_id
}

async fn status_of(s: &SqliteStore, id: Uuid) -> RequestStatus {
  s.get_request(id).await.unwrap().unwrap().status
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn hr_users_get_a_fresh_record() {
  let s = store().await;
  let hr = user(&s, "hr1", Role::Hr).await;
  let profile = s.get_hr(hr.user_id).await.unwrap().unwrap();
  assert_eq!(profile.user, hr);
  assert_eq!(profile.record.hr_status, HrStatus::PendingProfile);
  assert_eq!(profile.record.version, 0);
  assert_eq!(profile.record.admin_manager_id, None);

  let a = user(&s, "admin1", Role::Admin).await;
  assert!(s.get_hr(a.user_id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_or_email_is_refused() {
  let s = store().await;
  user(&s, "hr1", Role::Hr).await;

  let err = s
    .add_user(NewUser {
      username: "hr1".into(),
      email:    "other@example.com".into(),
      role:     Role::Admin,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Duplicate { field: "username", .. })));
  assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

  let err = s
    .add_user(NewUser {
      username: "someone".into(),
      email:    "HR1@example.com".into(),
      role:     Role::Admin,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Duplicate { field: "email", .. })));
  assert_eq!(s.list_users(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_users_filters_by_role() {
  let s = store().await;
  user(&s, "hr1", Role::Hr).await;
  user(&s, "admin1", Role::Admin).await;
  user(&s, "admin2", Role::Admin).await;
  user(&s, "cand1", Role::Candidate).await;

  let admins = s.list_users(Some(Role::Admin)).await.unwrap();
  let names: Vec<_> = admins.iter().map(|u| u.username.as_str()).collect();
  assert_eq!(names, ["admin1", "admin2"]);
  assert_eq!(s.list_users(None).await.unwrap().len(), 4);
}

#[tokio::test]
async fn profile_update_completes_profile_and_bumps_version() {
  let s = store().await;
  let hr = user(&s, "hr1", Role::Hr).await;
  let agent = HrAgent::new(&s, hr.user_id);

  let profile = agent
    .update_profile(ProfileUpdate {
      years_of_experience: Some(2.0),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(profile.record.hr_status, HrStatus::PendingProfile);
  assert_eq!(profile.record.version, 1);

  let profile = agent
    .update_profile(ProfileUpdate {
      company: Some("Globex".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(profile.record.hr_status, HrStatus::ProfileComplete);
  assert_eq!(profile.record.years_of_experience, Some(2.0));
  assert_eq!(profile.record.version, 2);
  assert_eq!(agent.profile().await.unwrap(), profile);
}

// ─── Walkthrough ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn apply_approve_confirm_unmap_reapply() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let (a1, a2, a3) = (admin(&s, "a1").await, admin(&s, "a2").await, admin(&s, "a3").await);
  let hr = HrAgent::new(&s, h1);

  // 1. two applications
  let r1 = hr.apply_to_admin(a1).await.unwrap();
  let r2 = hr.apply_to_admin(a2).await.unwrap();
  assert_eq!(r1.status, RequestStatus::PendingAdminApproval);
  assert_eq!(r2.status, RequestStatus::PendingAdminApproval);
  assert_eq!(hr.profile().await.unwrap().record.hr_status, HrStatus::ApplicationPending);

  // 2. A1 approves; nothing is mapped yet
  let ack = AdminAgent::new(&s, a1).approve_application(r1.id).await.unwrap();
  assert_eq!(ack.message, "Application approved");
  assert_eq!(status_of(&s, r1.id).await, RequestStatus::AdminApproved);
  assert_eq!(status_of(&s, r2.id).await, RequestStatus::PendingAdminApproval);
  assert_eq!(hr.current_mapping().await.unwrap(), None);
  assert_eq!(hr.admin_approved_applications().await.unwrap().len(), 1);

  // 3. H1 confirms A1; A2's application is superseded in the same step
  let profile = hr.confirm_admin_choice(r1.id).await.unwrap();
  assert_eq!(profile.record.hr_status, HrStatus::Mapped);
  assert_eq!(profile.record.admin_manager_id, Some(a1));
  assert_eq!(status_of(&s, r1.id).await, RequestStatus::HrConfirmedMapping);
  assert_eq!(status_of(&s, r2.id).await, RequestStatus::Superceded);
  assert_eq!(hr.current_mapping().await.unwrap().unwrap().user_id, a1);

  let mapped = AdminAgent::new(&s, a1).mapped_hrs().await.unwrap();
  assert_eq!(mapped.len(), 1);
  assert_eq!(mapped[0].user.user_id, h1);

  // 4. A2 tries to approve the superseded application
  let err = AdminAgent::new(&s, a2)
    .approve_application(r2.id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
  assert_eq!(status_of(&s, r2.id).await, RequestStatus::Superceded);

  // 5. unmap keeps history
  let profile = hr.unmap().await.unwrap();
  assert_eq!(profile.record.hr_status, HrStatus::Unmapped);
  assert_eq!(profile.record.admin_manager_id, None);
  assert_eq!(status_of(&s, r1.id).await, RequestStatus::HrConfirmedMapping);
  assert!(AdminAgent::new(&s, a1).mapped_hrs().await.unwrap().is_empty());

  // 6. re-apply elsewhere
  let r3 = hr.apply_to_admin(a3).await.unwrap();
  assert_eq!(r3.status, RequestStatus::PendingAdminApproval);
  assert_eq!(status_of(&s, r2.id).await, RequestStatus::Superceded);
  assert_eq!(status_of(&s, r1.id).await, RequestStatus::HrConfirmedMapping);

  let mine = hr.my_applications().await.unwrap();
  assert_eq!(
    mine.iter().map(|r| r.id).collect::<Vec<_>>(),
    [r3.id, r2.id, r1.id]
  );

  // 7. cancelling the only live application reverts to profile_complete
  hr.cancel_application(r3.id).await.unwrap();
  let profile = hr.profile().await.unwrap();
  assert_eq!(profile.record.hr_status, HrStatus::ProfileComplete);
}

#[tokio::test]
async fn invitation_accept_supersedes_applications() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let (a1, a2) = (admin(&s, "a1").await, admin(&s, "a2").await);
  let hr = HrAgent::new(&s, h1);

  let app = hr.apply_to_admin(a1).await.unwrap();
  let inv = AdminAgent::new(&s, a2).send_admin_request(h1).await.unwrap();
  assert_eq!(inv.status, RequestStatus::RequestPendingHrApproval);
  assert_eq!(hr.incoming_requests().await.unwrap(), [inv.clone()]);
  assert_eq!(AdminAgent::new(&s, a2).sent_requests().await.unwrap(), [inv.clone()]);
  assert_eq!(
    AdminAgent::new(&s, a1).pending_applications().await.unwrap(),
    [app.clone()]
  );

  let profile = hr.accept_request(inv.id).await.unwrap();
  assert_eq!(profile.record.admin_manager_id, Some(a2));
  assert_eq!(status_of(&s, inv.id).await, RequestStatus::Accepted);
  assert_eq!(status_of(&s, app.id).await, RequestStatus::Superceded);
  assert!(hr.incoming_requests().await.unwrap().is_empty());
  assert!(AdminAgent::new(&s, a1).pending_applications().await.unwrap().is_empty());
}

#[tokio::test]
async fn reject_and_withdraw_invitations() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let (a1, a2) = (admin(&s, "a1").await, admin(&s, "a2").await);
  let hr = HrAgent::new(&s, h1);

  let inv1 = AdminAgent::new(&s, a1).send_admin_request(h1).await.unwrap();
  let inv2 = AdminAgent::new(&s, a2).send_admin_request(h1).await.unwrap();
  assert_eq!(hr.profile().await.unwrap().record.hr_status, HrStatus::AdminRequestPending);

  let ack = hr.reject_request(inv1.id).await.unwrap();
  assert_eq!(ack.message, "Request rejected");
  assert_eq!(status_of(&s, inv1.id).await, RequestStatus::Rejected);

  let withdrawn = AdminAgent::new(&s, a2).withdraw_request(inv2.id).await.unwrap();
  assert_eq!(withdrawn.status, RequestStatus::Cancelled);
  assert_eq!(hr.profile().await.unwrap().record.hr_status, HrStatus::ProfileComplete);
}

#[tokio::test]
async fn cancel_reverts_to_profile_complete() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let a1 = admin(&s, "a1").await;
  let hr = HrAgent::new(&s, h1);

  let app = hr.apply_to_admin(a1).await.unwrap();
  let cancelled = hr.cancel_application(app.id).await.unwrap();
  assert_eq!(cancelled.status, RequestStatus::HrCancelledApplication);
  assert_eq!(hr.profile().await.unwrap().record.hr_status, HrStatus::ProfileComplete);

  let err = AdminAgent::new(&s, a1)
    .approve_application(app.id)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::RequestState {
      status: RequestStatus::HrCancelledApplication,
      ..
    })
  ));
}

#[tokio::test]
async fn admin_can_unmap_its_own_hr_only() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let (a1, a2) = (admin(&s, "a1").await, admin(&s, "a2").await);

  let inv = AdminAgent::new(&s, a1).send_admin_request(h1).await.unwrap();
  HrAgent::new(&s, h1).accept_request(inv.id).await.unwrap();

  let err = AdminAgent::new(&s, a2).unmap_hr(h1).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unauthorized);

  let ack = AdminAgent::new(&s, a1).unmap_hr(h1).await.unwrap();
  assert_eq!(ack.message, "HR unmapped");
  let profile = s.get_hr(h1).await.unwrap().unwrap();
  assert_eq!(profile.record.hr_status, HrStatus::Unmapped);
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn counterpart_must_exist_with_the_right_role() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let h2 = ready_hr(&s, "h2").await;
  let a1 = admin(&s, "a1").await;
  let hr = HrAgent::new(&s, h1);

  let err = hr.apply_to_admin(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(_))));
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let err = hr.apply_to_admin(h2).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::WrongRole { .. })));

  let err = AdminAgent::new(&s, a1).send_admin_request(a1).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let err = hr.accept_request(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::RequestNotFound(_))));
}

#[tokio::test]
async fn acting_identity_must_hold_the_claimed_role() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let a1 = admin(&s, "a1").await;

  // An admin posing as an HR.
  let err = HrAgent::new(&s, a1).apply_to_admin(a1).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unauthorized);

  // An unknown caller.
  let err = s
    .transition(Command::new(Actor::admin(Uuid::new_v4()), Action::Invite { hr_id: h1 }))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn incomplete_profile_blocks_applying() {
  let s = store().await;
  let hr = user(&s, "h1", Role::Hr).await;
  let a1 = admin(&s, "a1").await;

  let err = HrAgent::new(&s, hr.user_id).apply_to_admin(a1).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::HrState { status: HrStatus::PendingProfile, .. })
  ));
  let err = AdminAgent::new(&s, a1).send_admin_request(hr.user_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn failed_transition_writes_nothing() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let a1 = admin(&s, "a1").await;
  let hr = HrAgent::new(&s, h1);

  hr.apply_to_admin(a1).await.unwrap();
  let before = hr.profile().await.unwrap();

  assert!(hr.apply_to_admin(a1).await.is_err());
  assert_eq!(hr.profile().await.unwrap(), before);
  assert_eq!(hr.my_applications().await.unwrap().len(), 1);
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let (a1, a2) = (admin(&s, "a1").await, admin(&s, "a2").await);

  let seen = s.get_hr(h1).await.unwrap().unwrap().record.version;
  HrAgent::new(&s, h1).apply_to_admin(a1).await.unwrap();

  let err = HrAgent::new(&s, h1)
    .expecting(Some(seen))
    .apply_to_admin(a2)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::VersionConflict { .. })));
  assert_eq!(err.kind(), ErrorKind::Conflict);

  // Admin-side commands are versioned against the HR as well.
  let err = AdminAgent::new(&s, a2)
    .expecting(Some(seen))
    .send_admin_request(h1)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let current = s.get_hr(h1).await.unwrap().unwrap().record.version;
  HrAgent::new(&s, h1)
    .expecting(Some(current))
    .apply_to_admin(a2)
    .await
    .unwrap();
}

// ─── Views ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn query_requests_filters_and_limits() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  let h2 = ready_hr(&s, "h2").await;
  let a1 = admin(&s, "a1").await;

  let first = HrAgent::new(&s, h1).apply_to_admin(a1).await.unwrap();
  let second = HrAgent::new(&s, h2).apply_to_admin(a1).await.unwrap();
  AdminAgent::new(&s, a1).reject_application(first.id).await.unwrap();

  let all = s
    .query_requests(&RequestQuery { target_id: Some(a1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), [second.id, first.id]);

  let pending = AdminAgent::new(&s, a1).pending_applications().await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].id, second.id);

  let limited = s
    .query_requests(&RequestQuery {
      target_id: Some(a1),
      limit: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(limited.len(), 1);

  let rejected = s
    .query_requests(&RequestQuery {
      statuses: vec![RequestStatus::AdminRejected],
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(rejected.len(), 1);
  assert_eq!(rejected[0].id, first.id);
}

#[tokio::test]
async fn list_hrs_filters_by_status() {
  let s = store().await;
  ready_hr(&s, "h1").await;
  user(&s, "h2", Role::Hr).await;

  let complete = s
    .list_hrs(&HrQuery { status: Some(HrStatus::ProfileComplete), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(complete.len(), 1);
  assert_eq!(complete[0].user.username, "h1");
  assert_eq!(s.list_hrs(&HrQuery::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn hr_can_list_admins() {
  let s = store().await;
  let h1 = ready_hr(&s, "h1").await;
  admin(&s, "a1").await;
  admin(&s, "a2").await;
  let admins = HrAgent::new(&s, h1).list_admins().await.unwrap();
  assert_eq!(admins.len(), 2);
  assert!(admins.iter().all(|u| u.role == Role::Admin));
}

// ─── Races ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_confirm_and_accept_map_exactly_once() {
  let s = Arc::new(store().await);
  let h1 = ready_hr(&s, "h1").await;
  let (a1, a2) = (admin(&s, "a1").await, admin(&s, "a2").await);

  let app = HrAgent::new(&*s, h1).apply_to_admin(a1).await.unwrap();
  AdminAgent::new(&*s, a1).approve_application(app.id).await.unwrap();
  let inv = AdminAgent::new(&*s, a2).send_admin_request(h1).await.unwrap();

  let confirm = {
    let s = s.clone();
    tokio::spawn(async move {
      HrAgent::new(&*s, h1).confirm_admin_choice(app.id).await
    })
  };
  let accept = {
    let s = s.clone();
    tokio::spawn(async move { HrAgent::new(&*s, h1).accept_request(inv.id).await })
  };
  let (confirm, accept) = (confirm.await.unwrap(), accept.await.unwrap());

  let (winner, loser) = match (confirm, accept) {
    (Ok(p), Err(e)) | (Err(e), Ok(p)) => (p, e),
    (a, b) => panic!("expected exactly one success, got {a:?} and {b:?}"),
  };
  assert_eq!(loser.kind(), ErrorKind::Conflict);

  let manager = winner.record.admin_manager_id.unwrap();
  let profile = s.get_hr(h1).await.unwrap().unwrap();
  assert_eq!(profile.record.admin_manager_id, Some(manager));

  let (won, lost) = if manager == a1 { (app.id, inv.id) } else { (inv.id, app.id) };
  assert!(status_of(&s, won).await.is_mapping());
  assert_eq!(status_of(&s, lost).await, RequestStatus::Superceded);
}

#[tokio::test]
async fn race_across_connections_maps_exactly_once() {
  let path = std::env::temp_dir().join(format!("recruit-race-{}.db", Uuid::new_v4()));
  let first = SqliteStore::open(&path).await.unwrap();
  let second = SqliteStore::open(&path).await.unwrap();

  let h1 = ready_hr(&first, "h1").await;
  let (a1, a2) = (admin(&first, "a1").await, admin(&first, "a2").await);
  let app = HrAgent::new(&first, h1).apply_to_admin(a1).await.unwrap();
  AdminAgent::new(&first, a1).approve_application(app.id).await.unwrap();
  let inv = AdminAgent::new(&first, a2).send_admin_request(h1).await.unwrap();

  let (hr_first, hr_second) = (HrAgent::new(&first, h1), HrAgent::new(&second, h1));
  let (confirm, accept) = tokio::join!(
    hr_first.confirm_admin_choice(app.id),
    hr_second.accept_request(inv.id),
  );
  assert_ne!(confirm.is_ok(), accept.is_ok());
  let err = confirm.err().or(accept.err()).unwrap();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let live = second
    .query_requests(&RequestQuery {
      statuses: vec![
        RequestStatus::PendingAdminApproval,
        RequestStatus::AdminApproved,
        RequestStatus::RequestPendingHrApproval,
      ],
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(live.is_empty());

  drop((first, second));
  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
  }
}
