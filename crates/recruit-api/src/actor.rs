//! Extractors for who is calling and which HR version they last saw.
//!
//! Authentication happens upstream; the session layer forwards the caller's
//! id in `x-user-id`. The role is always read from the store, never trusted
//! from the request.

use std::sync::Arc;

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use recruit_core::{
  identity::{Role, User},
  store::MappingStore,
};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// Any known user.
pub struct Acting(pub User);

/// A known user holding the HR role.
pub struct ActingHr(pub User);

/// A known user holding the Admin role.
pub struct ActingAdmin(pub User);

async fn resolve<S: MappingStore>(
  parts: &Parts,
  store: &S,
) -> Result<User, ApiError> {
  let id = parts
    .headers
    .get(USER_HEADER)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| Uuid::parse_str(v.trim()).ok())
    .ok_or(ApiError::Unauthenticated)?;

  store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthenticated)
}

fn require(user: User, role: Role) -> Result<User, ApiError> {
  if user.role != role {
    return Err(ApiError::Forbidden(format!(
      "{} is {}, this route is for {role} users",
      user.username, user.role
    )));
  }
  Ok(user)
}

impl<S> FromRequestParts<Arc<S>> for Acting
where
  S: MappingStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self(resolve(parts, &**store).await?))
  }
}

impl<S> FromRequestParts<Arc<S>> for ActingHr
where
  S: MappingStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = resolve(parts, &**store).await?;
    Ok(Self(require(user, Role::Hr)?))
  }
}

impl<S> FromRequestParts<Arc<S>> for ActingAdmin
where
  S: MappingStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = resolve(parts, &**store).await?;
    Ok(Self(require(user, Role::Admin)?))
  }
}

// ─── If-Match ────────────────────────────────────────────────────────────────

/// The HR record version from `If-Match`, if the caller sent one.
pub struct ExpectedVersion(pub Option<u64>);

impl<St: Send + Sync> FromRequestParts<St> for ExpectedVersion {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(header::IF_MATCH) else {
      return Ok(Self(None));
    };
    let raw = value
      .to_str()
      .map_err(|_| ApiError::BadRequest("if-match is not ASCII".into()))?;
    parse_version(raw).map(|v| Self(Some(v)))
  }
}

/// Accepts the version with or without the surrounding `"` of an entity tag.
pub fn parse_version(raw: &str) -> Result<u64, ApiError> {
  let trimmed = raw.trim().trim_start_matches("W/").trim_matches('"');
  trimmed
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("if-match {raw:?} is not a version")))
}

/// The entity tag for an HR record version.
pub fn etag(version: u64) -> String { format!("\"{version}\"") }
