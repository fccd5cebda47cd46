//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users` | Optional `?role=candidate\|hr\|admin` |
//! | `POST` | `/users` | Body: `{"username":…,"email":…,"role":"hr"}` |
//! | `GET`  | `/users/{id}` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use recruit_core::{
  identity::{NewUser, Role, User},
  store::MappingStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor::Acting, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<Role>,
}

/// `GET /users[?role=<role>]`
pub async fn list<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  _caller: Acting,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = store.list_users(params.role).await.map_err(ApiError::store)?;
  Ok(Json(users))
}

/// `POST /users`
///
/// Registration itself is an upstream concern, so this does not require an
/// acting identity.
pub async fn create<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
  let user = store.add_user(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/{id}`
pub async fn get_one<S: MappingStore + 'static>(
  State(store): State<Arc<S>>,
  _caller: Acting,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
  let user = store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}
