//! HR-facing handlers. Every route requires an acting HR.
//!
//! Mutations accept an optional `If-Match: <version>` carrying the HR record
//! version the caller last saw; a stale version fails with 409.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use recruit_core::{
  agent::{Ack, HrAgent},
  identity::{HrProfile, ProfileUpdate, User},
  store::MappingStore,
};
use uuid::Uuid;

use crate::{
  RequestOut,
  actor::{ActingHr, ExpectedVersion, etag},
  error::ApiError,
  requests_out,
};

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /hr/me`: the profile, with its version as the `ETag`.
pub async fn me<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
) -> Result<impl IntoResponse, ApiError> {
  let profile = HrAgent::new(&*store, hr.user_id)
    .profile()
    .await
    .map_err(ApiError::store)?;
  let tag = etag(profile.record.version);
  Ok(([(header::ETAG, tag)], Json(profile)))
}

/// `PUT /hr/me/profile`
pub async fn update_profile<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
  ExpectedVersion(version): ExpectedVersion,
  Json(update): Json<ProfileUpdate>,
) -> Result<Json<HrProfile>, ApiError> {
  let profile = HrAgent::new(&*store, hr.user_id)
    .expecting(version)
    .update_profile(update)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile))
}

/// `GET /hr/admins`: admins this HR could apply to.
pub async fn admins<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
) -> Result<Json<Vec<User>>, ApiError> {
  let admins = HrAgent::new(&*store, hr.user_id)
    .list_admins()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(admins))
}

// ─── Applications ────────────────────────────────────────────────────────────

/// `POST /hr/apply/{admin_id}`
pub async fn apply<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
  ExpectedVersion(version): ExpectedVersion,
  Path(admin_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let request = HrAgent::new(&*store, hr.user_id)
    .expecting(version)
    .apply_to_admin(admin_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(RequestOut::from(request))))
}

/// `POST /hr/applications/{id}/cancel`
pub async fn cancel<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
  ExpectedVersion(version): ExpectedVersion,
  Path(id): Path<Uuid>,
) -> Result<Json<RequestOut>, ApiError> {
  let request = HrAgent::new(&*store, hr.user_id)
    .expecting(version)
    .cancel_application(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(request.into()))
}

/// `POST /hr/applications/{id}/confirm`
pub async fn confirm<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
  ExpectedVersion(version): ExpectedVersion,
  Path(id): Path<Uuid>,
) -> Result<Json<HrProfile>, ApiError> {
  let profile = HrAgent::new(&*store, hr.user_id)
    .expecting(version)
    .confirm_admin_choice(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile))
}

/// `GET /hr/applications`: every application this HR sent, newest first.
pub async fn applications<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
) -> Result<Json<Vec<RequestOut>>, ApiError> {
  let requests = HrAgent::new(&*store, hr.user_id)
    .my_applications()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(requests_out(requests)))
}

/// `GET /hr/applications/approved`
pub async fn approved<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
) -> Result<Json<Vec<RequestOut>>, ApiError> {
  let requests = HrAgent::new(&*store, hr.user_id)
    .admin_approved_applications()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(requests_out(requests)))
}

// ─── Invitations ─────────────────────────────────────────────────────────────

/// `GET /hr/requests`: invitations waiting on this HR.
pub async fn requests<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
) -> Result<Json<Vec<RequestOut>>, ApiError> {
  let requests = HrAgent::new(&*store, hr.user_id)
    .incoming_requests()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(requests_out(requests)))
}

/// `POST /hr/requests/{id}/accept`
pub async fn accept<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
  ExpectedVersion(version): ExpectedVersion,
  Path(id): Path<Uuid>,
) -> Result<Json<HrProfile>, ApiError> {
  let profile = HrAgent::new(&*store, hr.user_id)
    .expecting(version)
    .accept_request(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile))
}

/// `POST /hr/requests/{id}/reject`
pub async fn reject<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
  ExpectedVersion(version): ExpectedVersion,
  Path(id): Path<Uuid>,
) -> Result<Json<Ack>, ApiError> {
  let ack = HrAgent::new(&*store, hr.user_id)
    .expecting(version)
    .reject_request(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ack))
}

// ─── Mapping ─────────────────────────────────────────────────────────────────

/// `GET /hr/mapping`: the managing admin, or `null`.
pub async fn mapping<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
) -> Result<Json<Option<User>>, ApiError> {
  let admin = HrAgent::new(&*store, hr.user_id)
    .current_mapping()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(admin))
}

/// `POST /hr/unmap`
pub async fn unmap<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingHr(hr): ActingHr,
  ExpectedVersion(version): ExpectedVersion,
) -> Result<Json<HrProfile>, ApiError> {
  let profile = HrAgent::new(&*store, hr.user_id)
    .expecting(version)
    .unmap()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile))
}
