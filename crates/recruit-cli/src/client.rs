//! Async HTTP client wrapping the recruit JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use recruit_core::{
  agent::Ack,
  identity::{HrProfile, NewUser, ProfileUpdate, Role, User},
  request::{MappingRequest, Outcome},
};
use reqwest::{Client, Method, RequestBuilder, Response, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Connection settings for the recruit API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Sent as `x-user-id`; most routes refuse requests without it.
  pub user_id:  Option<Uuid>,
  /// Sent as `If-Match` on mutations.
  pub if_match: Option<u64>,
}

/// A request as the API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestView {
  #[serde(flatten)]
  pub request: MappingRequest,
  pub outcome: Outcome,
}

/// The JSON body of a failed call.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  error:  String,
  kind:   String,
  #[serde(default)]
  status: Option<String>,
}

/// Async HTTP client for the recruit JSON REST API.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let mutating = method != Method::GET;
    let mut req = self.client.request(method, self.url(path));
    if let Some(user) = self.config.user_id {
      req = req.header("x-user-id", user.to_string());
    }
    if mutating && let Some(version) = self.config.if_match {
      req = req.header(header::IF_MATCH, format!("\"{version}\""));
    }
    req
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<&(impl Serialize + ?Sized)>,
  ) -> Result<T> {
    let label = format!("{method} {path}");
    let mut req = self.request(method, path);
    if let Some(body) = body {
      req = req.json(body);
    }
    tracing::debug!("{label}");
    let resp = req.send().await.with_context(|| format!("{label} failed"))?;
    let resp = check(&label, resp).await?;
    resp
      .json()
      .await
      .with_context(|| format!("deserialising response to {label}"))
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    self.send(Method::GET, path, None::<&()>).await
  }

  async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    self.send(Method::POST, path, None::<&()>).await
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  /// `GET /api/users[?role=<role>]`
  pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
    match role {
      Some(role) => self.get(&format!("/users?role={role}")).await,
      None => self.get("/users").await,
    }
  }

  /// `POST /api/users`
  pub async fn create_user(&self, user: &NewUser) -> Result<User> {
    self.send(Method::POST, "/users", Some(user)).await
  }

  /// `GET /api/users/<id>`
  pub async fn get_user(&self, id: Uuid) -> Result<User> {
    self.get(&format!("/users/{id}")).await
  }

  // ── HR ────────────────────────────────────────────────────────────────────

  pub async fn me(&self) -> Result<HrProfile> { self.get("/hr/me").await }

  pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<HrProfile> {
    self.send(Method::PUT, "/hr/me/profile", Some(update)).await
  }

  pub async fn admins(&self) -> Result<Vec<User>> { self.get("/hr/admins").await }

  pub async fn apply(&self, admin_id: Uuid) -> Result<RequestView> {
    self.post(&format!("/hr/apply/{admin_id}")).await
  }

  pub async fn cancel_application(&self, id: Uuid) -> Result<RequestView> {
    self.post(&format!("/hr/applications/{id}/cancel")).await
  }

  pub async fn confirm_admin_choice(&self, id: Uuid) -> Result<HrProfile> {
    self.post(&format!("/hr/applications/{id}/confirm")).await
  }

  pub async fn my_applications(&self) -> Result<Vec<RequestView>> {
    self.get("/hr/applications").await
  }

  pub async fn approved_applications(&self) -> Result<Vec<RequestView>> {
    self.get("/hr/applications/approved").await
  }

  pub async fn incoming_requests(&self) -> Result<Vec<RequestView>> {
    self.get("/hr/requests").await
  }

  pub async fn accept_request(&self, id: Uuid) -> Result<HrProfile> {
    self.post(&format!("/hr/requests/{id}/accept")).await
  }

  pub async fn reject_request(&self, id: Uuid) -> Result<Ack> {
    self.post(&format!("/hr/requests/{id}/reject")).await
  }

  pub async fn current_mapping(&self) -> Result<Option<User>> {
    self.get("/hr/mapping").await
  }

  pub async fn unmap_self(&self) -> Result<HrProfile> { self.post("/hr/unmap").await }

  // ── Admin ─────────────────────────────────────────────────────────────────

  pub async fn pending_applications(&self) -> Result<Vec<RequestView>> {
    self.get("/admin/applications").await
  }

  pub async fn approve_application(&self, id: Uuid) -> Result<Ack> {
    self.post(&format!("/admin/applications/{id}/approve")).await
  }

  pub async fn reject_application(&self, id: Uuid) -> Result<Ack> {
    self.post(&format!("/admin/applications/{id}/reject")).await
  }

  pub async fn sent_requests(&self) -> Result<Vec<RequestView>> {
    self.get("/admin/requests").await
  }

  pub async fn invite(&self, hr_id: Uuid) -> Result<RequestView> {
    self.post(&format!("/admin/requests/{hr_id}")).await
  }

  pub async fn withdraw_request(&self, id: Uuid) -> Result<RequestView> {
    self.post(&format!("/admin/requests/{id}/withdraw")).await
  }

  pub async fn mapped_hrs(&self) -> Result<Vec<HrProfile>> {
    self.get("/admin/hrs").await
  }

  pub async fn unmap_hr(&self, hr_id: Uuid) -> Result<Ack> {
    self.post(&format!("/admin/hrs/{hr_id}/unmap")).await
  }
}

/// Turn a non-success response into an error carrying the server's message.
async fn check(label: &str, resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let text = resp.text().await.unwrap_or_default();
  Err(match serde_json::from_str::<ErrorBody>(&text) {
    Ok(body) => anyhow!("{label} → {status}: {}", describe(&body)),
    Err(_) => anyhow!("{label} → {status}"),
  })
}

fn describe(body: &ErrorBody) -> String {
  match &body.status {
    Some(status) => format!("{} [{}; request is {status}]", body.error, body.kind),
    None => format!("{} [{}]", body.error, body.kind),
  }
}
