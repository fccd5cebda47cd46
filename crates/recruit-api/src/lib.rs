//! JSON REST API for the HR↔Admin mapping workflow.
//!
//! Exposes an axum [`Router`] backed by any [`recruit_core::store::MappingStore`].
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility; the acting user arrives in the `x-user-id` header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", recruit_api::api_router(store.clone()))
//! ```

pub mod actor;
pub mod admin;
pub mod error;
pub mod hr;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use recruit_core::{
  request::{MappingRequest, Outcome},
  store::MappingStore,
};
use serde::Serialize;

pub use error::ApiError;

/// A request as the API returns it, with its coarse outcome alongside the
/// raw status.
#[derive(Debug, Serialize)]
pub struct RequestOut {
  #[serde(flatten)]
  pub request: MappingRequest,
  pub outcome: Outcome,
}

impl From<MappingRequest> for RequestOut {
  fn from(request: MappingRequest) -> Self {
    Self { outcome: request.status.outcome(), request }
  }
}

pub(crate) fn requests_out(requests: Vec<MappingRequest>) -> Vec<RequestOut> {
  requests.into_iter().map(RequestOut::from).collect()
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: MappingStore + 'static,
{
  Router::new()
    // Identities
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route("/users/{id}", get(users::get_one::<S>))
    // HR-facing
    .route("/hr/me", get(hr::me::<S>))
    .route("/hr/me/profile", put(hr::update_profile::<S>))
    .route("/hr/admins", get(hr::admins::<S>))
    .route("/hr/apply/{admin_id}", post(hr::apply::<S>))
    .route("/hr/applications", get(hr::applications::<S>))
    .route("/hr/applications/approved", get(hr::approved::<S>))
    .route("/hr/applications/{id}/cancel", post(hr::cancel::<S>))
    .route("/hr/applications/{id}/confirm", post(hr::confirm::<S>))
    .route("/hr/requests", get(hr::requests::<S>))
    .route("/hr/requests/{id}/accept", post(hr::accept::<S>))
    .route("/hr/requests/{id}/reject", post(hr::reject::<S>))
    .route("/hr/mapping", get(hr::mapping::<S>))
    .route("/hr/unmap", post(hr::unmap::<S>))
    // Admin-facing
    .route("/admin/applications", get(admin::applications::<S>))
    .route("/admin/applications/{id}/approve", post(admin::approve::<S>))
    .route("/admin/applications/{id}/reject", post(admin::reject::<S>))
    .route("/admin/requests", get(admin::requests::<S>))
    .route("/admin/requests/{id}", post(admin::invite::<S>))
    .route("/admin/requests/{id}/withdraw", post(admin::withdraw::<S>))
    .route("/admin/hrs", get(admin::hrs::<S>))
    .route("/admin/hrs/{id}/unmap", post(admin::unmap::<S>))
    .with_state(store)
}
