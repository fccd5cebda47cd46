//! [`SqliteStore`]: the SQLite implementation of [`MappingStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use recruit_core::{
  Error as CoreError,
  engine::{self, Action, Command, Ledger, Transition},
  identity::{HrProfile, HrRecord, NewUser, Role, User},
  request::MappingRequest,
  store::{HrQuery, MappingStore, RequestQuery},
};
use rusqlite::{
  Connection, OptionalExtension as _, TransactionBehavior, params,
  params_from_iter, types::Value,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    HR_COLUMNS, REQUEST_COLUMNS, RawHrProfile, RawHrRecord, RawRequest,
    RawUser, USER_COLUMNS, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A mapping store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(&*conn))).await?
  }

  /// Run `f` inside a `BEGIN IMMEDIATE` transaction, committing only if it
  /// succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = f(&*tx);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }
}

/// The current time at the precision timestamps are stored with, so records
/// returned from a write compare equal to the same records read back.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── Reads ───────────────────────────────────────────────────────────────────

fn load_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
      params![encode_uuid(id)],
      |row| RawUser::from_row(row, 0),
    )
    .optional()?;
  raw.map(RawUser::into_user).transpose()
}

fn load_hr(conn: &Connection, id: Uuid) -> Result<Option<HrRecord>> {
  let raw = conn
    .query_row(
      &format!("SELECT {HR_COLUMNS} FROM hr_records h WHERE h.hr_id = ?1"),
      params![encode_uuid(id)],
      |row| RawHrRecord::from_row(row, 0),
    )
    .optional()?;
  raw.map(RawHrRecord::into_record).transpose()
}

fn load_request(conn: &Connection, id: Uuid) -> Result<Option<MappingRequest>> {
  let raw = conn
    .query_row(
      &format!("SELECT {REQUEST_COLUMNS} FROM mapping_requests r WHERE r.id = ?1"),
      params![encode_uuid(id)],
      RawRequest::from_row,
    )
    .optional()?;
  raw.map(RawRequest::into_request).transpose()
}

/// The user must exist and hold `role`.
fn require_role(conn: &Connection, id: Uuid, role: Role) -> Result<User> {
  match load_user(conn, id)? {
    Some(user) if user.role == role => Ok(user),
    Some(_) => Err(CoreError::WrongRole { id, expected: role }.into()),
    None => Err(CoreError::UserNotFound(id).into()),
  }
}

/// The HR record plus every request naming that HR, oldest first.
fn load_ledger(conn: &Connection, hr_id: Uuid) -> Result<Ledger> {
  let hr = match load_hr(conn, hr_id)? {
    Some(hr) => hr,
    None => {
      require_role(conn, hr_id, Role::Hr)?;
      return Err(CoreError::WrongRole { id: hr_id, expected: Role::Hr }.into());
    }
  };

  let mut stmt = conn.prepare(&format!(
    "SELECT {REQUEST_COLUMNS} FROM mapping_requests r
     WHERE r.hr_id = ?1
     ORDER BY r.created_at, r.rowid"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(hr_id)], RawRequest::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let requests = raws
    .into_iter()
    .map(RawRequest::into_request)
    .collect::<Result<_>>()?;

  Ok(Ledger { hr, requests })
}

fn select_hr_profiles(
  conn: &Connection,
  where_clause: &str,
  values: Vec<Value>,
) -> Result<Vec<HrProfile>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {USER_COLUMNS}, {HR_COLUMNS}
     FROM users u
     JOIN hr_records h ON h.hr_id = u.user_id
     {where_clause}
     ORDER BY u.created_at, u.rowid"
  ))?;
  let raws = stmt
    .query_map(params_from_iter(values), RawHrProfile::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawHrProfile::into_profile).collect()
}

fn where_all(conds: &[String]) -> String {
  if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  }
}

fn select_requests(
  conn: &Connection,
  query: &RequestQuery,
) -> Result<Vec<MappingRequest>> {
  let mut conds: Vec<String> = Vec::new();
  let mut values: Vec<Value> = Vec::new();

  if let Some(kind) = query.request_type {
    values.push(Value::Text(kind.as_str().to_owned()));
    conds.push(format!("r.request_type = ?{}", values.len()));
  }
  if let Some(id) = query.requester_id {
    values.push(Value::Text(encode_uuid(id)));
    conds.push(format!("r.requester_id = ?{}", values.len()));
  }
  if let Some(id) = query.target_id {
    values.push(Value::Text(encode_uuid(id)));
    conds.push(format!("r.target_id = ?{}", values.len()));
  }
  if !query.statuses.is_empty() {
    let mut marks = Vec::with_capacity(query.statuses.len());
    for status in &query.statuses {
      values.push(Value::Text(status.as_str().to_owned()));
      marks.push(format!("?{}", values.len()));
    }
    conds.push(format!("r.status IN ({})", marks.join(", ")));
  }

  // SQLite treats a negative LIMIT as no limit.
  values.push(Value::Integer(query.limit.map_or(-1, |l| l as i64)));
  let sql = format!(
    "SELECT {REQUEST_COLUMNS} FROM mapping_requests r
     {}
     ORDER BY r.created_at DESC, r.rowid DESC
     LIMIT ?{}",
    where_all(&conds),
    values.len(),
  );

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(values), RawRequest::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawRequest::into_request).collect()
}

// ─── Writes ──────────────────────────────────────────────────────────────────

fn insert_user(conn: &Connection, user: &User) -> Result<()> {
  for (field, value) in [("username", &user.username), ("email", &user.email)] {
    let taken = conn
      .query_row(
        &format!("SELECT 1 FROM users WHERE {field} = ?1"),
        params![value],
        |_| Ok(()),
      )
      .optional()?
      .is_some();
    if taken {
      return Err(CoreError::Duplicate { field, value: value.clone() }.into());
    }
  }

  conn.execute(
    "INSERT INTO users (user_id, username, email, role, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      encode_uuid(user.user_id),
      user.username,
      user.email,
      user.role.as_str(),
      encode_dt(user.created_at),
    ],
  )?;

  if user.role == Role::Hr {
    let record = HrRecord::new(user.user_id, user.created_at);
    conn.execute(
      "INSERT INTO hr_records (hr_id, hr_status, version, updated_at)
       VALUES (?1, ?2, ?3, ?4)",
      params![
        encode_uuid(record.hr_id),
        record.hr_status.as_str(),
        record.version as i64,
        encode_dt(record.updated_at),
      ],
    )?;
  }
  Ok(())
}

fn insert_request(conn: &Connection, request: &MappingRequest) -> Result<()> {
  conn.execute(
    "INSERT INTO mapping_requests (
       id, request_type, requester_id, requester_role, target_id,
       target_role, hr_id, status, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    params![
      encode_uuid(request.id),
      request.request_type.as_str(),
      encode_uuid(request.requester_id),
      request.requester_role.as_str(),
      encode_uuid(request.target_id),
      request.target_role.as_str(),
      encode_uuid(request.hr_id()),
      request.status.as_str(),
      encode_dt(request.created_at),
      encode_dt(request.updated_at),
    ],
  )?;
  Ok(())
}

/// Persist `transition`, guarded by the version the ledger was loaded at.
fn write_transition(
  conn: &Connection,
  loaded_version: u64,
  transition: &Transition,
) -> Result<()> {
  let hr = &transition.hr;
  let rows = conn.execute(
    "UPDATE hr_records SET
       hr_status = ?1, admin_manager_id = ?2, years_of_experience = ?3,
       company = ?4, specialization = ?5, version = ?6, updated_at = ?7
     WHERE hr_id = ?8 AND version = ?9",
    params![
      hr.hr_status.as_str(),
      hr.admin_manager_id.map(encode_uuid),
      hr.years_of_experience,
      hr.company,
      hr.specialization,
      hr.version as i64,
      encode_dt(hr.updated_at),
      encode_uuid(hr.hr_id),
      loaded_version as i64,
    ],
  )?;
  if rows == 0 {
    let found = load_hr(conn, hr.hr_id)?.map_or(loaded_version, |r| r.version);
    return Err(
      CoreError::VersionConflict {
        hr_id: hr.hr_id,
        expected: loaded_version,
        found,
      }
      .into(),
    );
  }

  if let Some(request) = &transition.created {
    insert_request(conn, request)?;
  }
  for request in &transition.updated {
    conn.execute(
      "UPDATE mapping_requests SET status = ?1, updated_at = ?2 WHERE id = ?3",
      params![
        request.status.as_str(),
        encode_dt(request.updated_at),
        encode_uuid(request.id),
      ],
    )?;
  }
  Ok(())
}

/// Resolve the ledger a command runs against, apply it, and write the result.
/// Must run inside a transaction.
fn run_command(
  conn: &Connection,
  command: &Command,
  now: DateTime<Utc>,
) -> Result<Transition> {
  let actor = command.actor;
  let action = command.action.name();

  match load_user(conn, actor.user_id)? {
    None => return Err(CoreError::UserNotFound(actor.user_id).into()),
    Some(user) if user.role != actor.role => {
      return Err(CoreError::Forbidden { actor: actor.user_id, action }.into());
    }
    Some(_) => {}
  }

  match &command.action {
    Action::Apply { admin_id } => {
      if actor.role != Role::Hr {
        return Err(CoreError::Forbidden { actor: actor.user_id, action }.into());
      }
      require_role(conn, *admin_id, Role::Admin)?;
    }
    Action::UpdateProfile(_) if actor.role != Role::Hr => {
      return Err(CoreError::Forbidden { actor: actor.user_id, action }.into());
    }
    _ => {}
  }

  let hr_id = match command.action.hr_id(&actor) {
    Some(id) => id,
    None => {
      let request_id = command
        .action
        .request_id()
        .ok_or(CoreError::MissingSubject { action })?;
      load_request(conn, request_id)?
        .ok_or(CoreError::RequestNotFound(request_id))?
        .hr_id()
    }
  };

  let ledger = load_ledger(conn, hr_id)?;
  let transition = engine::apply(&ledger, command, now)?;
  write_transition(conn, ledger.hr.version, &transition)?;
  Ok(transition)
}

// ─── MappingStore impl ───────────────────────────────────────────────────────

impl MappingStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let input = input.normalize()?;
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      email:      input.email,
      role:       input.role,
      created_at: now(),
    };

    let row = user.clone();
    self.write(move |conn| insert_user(conn, &row)).await?;
    info!(user_id = %user.user_id, role = %user.role, "user added");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.read(move |conn| load_user(conn, id)).await
  }

  async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
    self
      .read(move |conn| {
        let (where_clause, values) = match role {
          Some(role) => ("WHERE u.role = ?1", vec![Value::Text(role.as_str().to_owned())]),
          None => ("", Vec::new()),
        };
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users u {where_clause}
           ORDER BY u.created_at, u.rowid"
        ))?;
        let raws = stmt
          .query_map(params_from_iter(values), |row| RawUser::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawUser::into_user).collect()
      })
      .await
  }

  // ── HR records ────────────────────────────────────────────────────────────

  async fn get_hr(&self, id: Uuid) -> Result<Option<HrProfile>> {
    let mut found = self
      .read(move |conn| {
        let values = vec![Value::Text(encode_uuid(id))];
        select_hr_profiles(conn, "WHERE u.user_id = ?1", values)
      })
      .await?;
    Ok(found.pop())
  }

  async fn list_hrs(&self, query: &HrQuery) -> Result<Vec<HrProfile>> {
    let query = query.clone();
    let hrs = self
      .read(move |conn| {
        let mut conds = Vec::new();
        let mut values = Vec::new();
        if let Some(admin_id) = query.admin_manager_id {
          values.push(Value::Text(encode_uuid(admin_id)));
          conds.push(format!("h.admin_manager_id = ?{}", values.len()));
        }
        if let Some(status) = query.status {
          values.push(Value::Text(status.as_str().to_owned()));
          conds.push(format!("h.hr_status = ?{}", values.len()));
        }
        select_hr_profiles(conn, &where_all(&conds), values)
      })
      .await?;
    debug!(count = hrs.len(), "listed hr records");
    Ok(hrs)
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn get_request(&self, id: Uuid) -> Result<Option<MappingRequest>> {
    self.read(move |conn| load_request(conn, id)).await
  }

  async fn query_requests(
    &self,
    query: &RequestQuery,
  ) -> Result<Vec<MappingRequest>> {
    let query = query.clone();
    let requests = self.read(move |conn| select_requests(conn, &query)).await?;
    debug!(count = requests.len(), "queried requests");
    Ok(requests)
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  async fn transition(&self, command: Command) -> Result<Transition> {
    let action = command.action.name();
    let actor = command.actor.user_id;
    let at = now();

    let outcome = self
      .write(move |conn| run_command(conn, &command, at))
      .await;

    match &outcome {
      Ok(t) => info!(
        action,
        %actor,
        hr_id = %t.hr.hr_id,
        hr_status = %t.hr.hr_status,
        version = t.hr.version,
        superseded = t.superseded().count(),
        "transition committed"
      ),
      Err(e) => warn!(action, %actor, error = %e, "transition rejected"),
    }
    outcome
  }
}
