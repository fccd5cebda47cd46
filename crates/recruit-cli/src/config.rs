//! Connection settings: flags override the environment, which overrides the
//! config file, which overrides defaults.
//!
//! Flags and environment variables are merged by clap before they reach
//! [`resolve`], so this module only sees "given on the command line" or not.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::client::ApiConfig;

pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug, PartialEq)]
pub struct ConfigFile {
  #[serde(default)]
  pub url:  Option<String>,
  /// The user to act as.
  #[serde(default)]
  pub user: Option<Uuid>,
}

impl ConfigFile {
  pub fn read(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }
}

/// Merge command-line values over `file`.
pub fn resolve(
  url: Option<String>,
  user: Option<Uuid>,
  if_match: Option<u64>,
  file: ConfigFile,
) -> ApiConfig {
  ApiConfig {
    base_url: url
      .or(file.url)
      .filter(|u| !u.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    user_id: user.or(file.user),
    if_match,
  }
}
