//! Admin-facing handlers. Every route requires an acting Admin.
//!
//! `If-Match` on a mutation carries the version of the affected HR record.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use recruit_core::{
  agent::{Ack, AdminAgent},
  identity::HrProfile,
  store::MappingStore,
};
use uuid::Uuid;

use crate::{
  RequestOut,
  actor::{ActingAdmin, ExpectedVersion},
  error::ApiError,
  requests_out,
};

// ─── Applications ────────────────────────────────────────────────────────────

/// `GET /admin/applications`: applications awaiting this admin.
pub async fn applications<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingAdmin(admin): ActingAdmin,
) -> Result<Json<Vec<RequestOut>>, ApiError> {
  let requests = AdminAgent::new(&*store, admin.user_id)
    .pending_applications()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(requests_out(requests)))
}

/// `POST /admin/applications/{id}/approve`
pub async fn approve<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingAdmin(admin): ActingAdmin,
  ExpectedVersion(version): ExpectedVersion,
  Path(id): Path<Uuid>,
) -> Result<Json<Ack>, ApiError> {
  let ack = AdminAgent::new(&*store, admin.user_id)
    .expecting(version)
    .approve_application(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ack))
}

/// `POST /admin/applications/{id}/reject`
pub async fn reject<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingAdmin(admin): ActingAdmin,
  ExpectedVersion(version): ExpectedVersion,
  Path(id): Path<Uuid>,
) -> Result<Json<Ack>, ApiError> {
  let ack = AdminAgent::new(&*store, admin.user_id)
    .expecting(version)
    .reject_application(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ack))
}

// ─── Invitations ─────────────────────────────────────────────────────────────

/// `GET /admin/requests`: every invitation this admin sent.
pub async fn requests<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingAdmin(admin): ActingAdmin,
) -> Result<Json<Vec<RequestOut>>, ApiError> {
  let requests = AdminAgent::new(&*store, admin.user_id)
    .sent_requests()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(requests_out(requests)))
}

/// `POST /admin/requests/{hr_id}`: invite an HR.
pub async fn invite<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingAdmin(admin): ActingAdmin,
  ExpectedVersion(version): ExpectedVersion,
  Path(hr_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let request = AdminAgent::new(&*store, admin.user_id)
    .expecting(version)
    .send_admin_request(hr_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(RequestOut::from(request))))
}

/// `POST /admin/requests/{id}/withdraw`
pub async fn withdraw<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingAdmin(admin): ActingAdmin,
  ExpectedVersion(version): ExpectedVersion,
  Path(id): Path<Uuid>,
) -> Result<Json<RequestOut>, ApiError> {
  let request = AdminAgent::new(&*store, admin.user_id)
    .expecting(version)
    .withdraw_request(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(request.into()))
}

// ─── Mapped HRs ──────────────────────────────────────────────────────────────

/// `GET /admin/hrs`: HRs this admin manages.
pub async fn hrs<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingAdmin(admin): ActingAdmin,
) -> Result<Json<Vec<HrProfile>>, ApiError> {
  let hrs = AdminAgent::new(&*store, admin.user_id)
    .mapped_hrs()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(hrs))
}

/// `POST /admin/hrs/{hr_id}/unmap`
pub async fn unmap<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  ActingAdmin(admin): ActingAdmin,
  ExpectedVersion(version): ExpectedVersion,
  Path(hr_id): Path<Uuid>,
) -> Result<Json<Ack>, ApiError> {
  let ack = AdminAgent::new(&*store, admin.user_id)
    .expecting(version)
    .unmap_hr(hr_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ack))
}
