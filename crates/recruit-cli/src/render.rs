//! Plain-text rendering of API responses.

use recruit_core::{
  agent::Ack,
  identity::{HrProfile, User},
};
use serde::Serialize;

use crate::client::RequestView;

/// Anything a subcommand can print.
#[derive(Serialize)]
#[serde(untagged)]
pub enum Output {
  Users(Vec<User>),
  User(User),
  Mapping(Option<User>),
  Profile(HrProfile),
  Profiles(Vec<HrProfile>),
  Request(RequestView),
  Requests(Vec<RequestView>),
  Ack(Ack),
}

impl Output {
  pub fn render(&self) -> String {
    match self {
      Self::Users(users) => lines(users, user_line, "no users"),
      Self::User(user) => user_line(user),
      Self::Mapping(Some(admin)) => format!("mapped to {}", user_line(admin)),
      Self::Mapping(None) => "not mapped".to_string(),
      Self::Profile(profile) => profile_block(profile),
      Self::Profiles(profiles) => lines(profiles, profile_line, "no HRs"),
      Self::Request(view) => request_line(view),
      Self::Requests(views) => lines(views, request_line, "no requests"),
      Self::Ack(ack) => ack.message.clone(),
    }
  }
}

fn lines<T>(items: &[T], f: impl Fn(&T) -> String, empty: &str) -> String {
  if items.is_empty() {
    return empty.to_string();
  }
  items.iter().map(f).collect::<Vec<_>>().join("\n")
}

pub fn user_line(user: &User) -> String {
  format!("{}  {:<6} {} <{}>", user.user_id, user.role.as_str(), user.username, user.email)
}

pub fn request_line(view: &RequestView) -> String {
  let r = &view.request;
  format!(
    "{}  {:<11} {} → {}  {} ({})  {}",
    r.id,
    r.request_type.as_str(),
    r.requester_id,
    r.target_id,
    r.status,
    view.outcome.as_str(),
    r.created_at.format("%Y-%m-%d %H:%M"),
  )
}

fn profile_line(profile: &HrProfile) -> String {
  let record = &profile.record;
  format!(
    "{}  {} <{}>  {}  v{}",
    record.hr_id,
    profile.user.username,
    profile.user.email,
    record.company.as_deref().unwrap_or("-"),
    record.version,
  )
}

pub fn profile_block(profile: &HrProfile) -> String {
  let record = &profile.record;
  let years = record
    .years_of_experience
    .map(|y| y.to_string())
    .unwrap_or_else(|| "-".into());
  let manager = record
    .admin_manager_id
    .map(|id| id.to_string())
    .unwrap_or_else(|| "-".into());
  [
    format!("user:           {} <{}>", profile.user.username, profile.user.email),
    format!("id:             {}", record.hr_id),
    format!("status:         {}", record.hr_status),
    format!("manager:        {manager}"),
    format!("experience:     {years}"),
    format!("company:        {}", record.company.as_deref().unwrap_or("-")),
    format!("specialization: {}", record.specialization.as_deref().unwrap_or("-")),
    format!("version:        {}", record.version),
  ]
  .join("\n")
}
