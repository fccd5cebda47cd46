//! `recruit`: command-line client for the recruit mapping server.
//!
//! # Usage
//!
//! ```
//! recruit users add hr1 hr1@example.com hr
//! recruit --user <hr-id> hr profile --years 4 --company Initech
//! recruit --user <hr-id> hr apply <admin-id>
//! recruit --user <admin-id> admin approve <request-id>
//! recruit --config ~/.config/recruit/config.toml hr me
//! ```

mod client;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::ApiClient;
use config::ConfigFile;
use recruit_core::identity::{NewUser, ProfileUpdate, Role};
use render::Output;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "recruit", about = "Client for the HR/Admin mapping server")]
struct Args {
  /// Path to a TOML config file (url, user).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the recruit server (default: http://localhost:8080).
  #[arg(long, env = "RECRUIT_URL")]
  url: Option<String>,

  /// Id of the user to act as.
  #[arg(long, env = "RECRUIT_USER")]
  user: Option<Uuid>,

  /// HR record version the mutation expects (sent as If-Match).
  #[arg(long, value_name = "VERSION")]
  if_match: Option<u64>,

  /// Print raw JSON instead of text.
  #[arg(long)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Accounts of every role
  #[command(subcommand)]
  Users(UsersCommand),
  /// Act as an HR
  #[command(subcommand)]
  Hr(HrCommand),
  /// Act as an Admin
  #[command(subcommand)]
  Admin(AdminCommand),
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
  /// List users, optionally of one role
  List {
    #[arg(long)]
    role: Option<Role>,
  },
  /// Register a user
  Add {
    username: String,
    email:    String,
    role:     Role,
  },
  /// Show one user
  Show { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum HrCommand {
  /// Show your profile and status
  Me,
  /// Edit your profile
  Profile {
    #[arg(long)]
    years:          Option<f64>,
    #[arg(long)]
    company:        Option<String>,
    #[arg(long)]
    specialization: Option<String>,
  },
  /// List admins you could apply to
  Admins,
  /// Apply to an admin
  Apply { admin_id: Uuid },
  /// Cancel one of your applications
  Cancel { request_id: Uuid },
  /// Confirm an approved application, mapping you to that admin
  Confirm { request_id: Uuid },
  /// List your applications
  Applications,
  /// List applications admins have approved
  Approved,
  /// List invitations waiting on you
  Requests,
  /// Accept an invitation
  Accept { request_id: Uuid },
  /// Reject an invitation
  Reject { request_id: Uuid },
  /// Show the admin you are mapped to
  Mapping,
  /// Leave your current admin
  Unmap,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
  /// List applications waiting on you
  Applications,
  /// Approve an application
  Approve { request_id: Uuid },
  /// Reject an application
  Reject { request_id: Uuid },
  /// List invitations you sent
  Requests,
  /// Invite an HR
  Invite { hr_id: Uuid },
  /// Withdraw an open invitation
  Withdraw { request_id: Uuid },
  /// List the HRs you manage
  Hrs,
  /// Release an HR you manage
  Unmap { hr_id: Uuid },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg = match &args.config {
    Some(path) => ConfigFile::read(path)?,
    None => ConfigFile::default(),
  };
  let api_config = config::resolve(args.url, args.user, args.if_match, file_cfg);
  let client = ApiClient::new(api_config)?;

  let output = run(&client, args.command).await?;
  if args.json {
    let json = serde_json::to_string_pretty(&output).context("serialising output")?;
    println!("{json}");
  } else {
    println!("{}", output.render());
  }
  Ok(())
}

async fn run(client: &ApiClient, command: Command) -> Result<Output> {
  Ok(match command {
    Command::Users(cmd) => match cmd {
      UsersCommand::List { role } => Output::Users(client.list_users(role).await?),
      UsersCommand::Add { username, email, role } => {
        let user = NewUser { username, email, role };
        Output::User(client.create_user(&user).await?)
      }
      UsersCommand::Show { id } => Output::User(client.get_user(id).await?),
    },
    Command::Hr(cmd) => match cmd {
      HrCommand::Me => Output::Profile(client.me().await?),
      HrCommand::Profile { years, company, specialization } => {
        let update = ProfileUpdate {
          years_of_experience: years,
          company,
          specialization,
        };
        Output::Profile(client.update_profile(&update).await?)
      }
      HrCommand::Admins => Output::Users(client.admins().await?),
      HrCommand::Apply { admin_id } => Output::Request(client.apply(admin_id).await?),
      HrCommand::Cancel { request_id } => {
        Output::Request(client.cancel_application(request_id).await?)
      }
      HrCommand::Confirm { request_id } => {
        Output::Profile(client.confirm_admin_choice(request_id).await?)
      }
      HrCommand::Applications => Output::Requests(client.my_applications().await?),
      HrCommand::Approved => Output::Requests(client.approved_applications().await?),
      HrCommand::Requests => Output::Requests(client.incoming_requests().await?),
      HrCommand::Accept { request_id } => {
        Output::Profile(client.accept_request(request_id).await?)
      }
      HrCommand::Reject { request_id } => {
        Output::Ack(client.reject_request(request_id).await?)
      }
      HrCommand::Mapping => Output::Mapping(client.current_mapping().await?),
      HrCommand::Unmap => Output::Profile(client.unmap_self().await?),
    },
    Command::Admin(cmd) => match cmd {
      AdminCommand::Applications => {
        Output::Requests(client.pending_applications().await?)
      }
      AdminCommand::Approve { request_id } => {
        Output::Ack(client.approve_application(request_id).await?)
      }
      AdminCommand::Reject { request_id } => {
        Output::Ack(client.reject_application(request_id).await?)
      }
      AdminCommand::Requests => Output::Requests(client.sent_requests().await?),
      AdminCommand::Invite { hr_id } => Output::Request(client.invite(hr_id).await?),
      AdminCommand::Withdraw { request_id } => {
        Output::Request(client.withdraw_request(request_id).await?)
      }
      AdminCommand::Hrs => Output::Profiles(client.mapped_hrs().await?),
      AdminCommand::Unmap { hr_id } => Output::Ack(client.unmap_hr(hr_id).await?),
    },
  })
}
