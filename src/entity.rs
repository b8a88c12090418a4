//! Auditable entity base: shared persisted fields plus explicit persist hooks.
//!
//! Concrete records embed [`AuditFields`] (usually with `#[serde(flatten)]`) and
//! implement [`Entity`] to describe their table and own columns.

use crate::error::{AppError, PersistenceError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, Row};

pub type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Column names of the audit fields, in select order.
pub const AUDIT_COLUMNS: &[&str] = &[
    "id",
    "create_time",
    "update_time",
    "deleted",
    "create_by",
    "update_by",
    "version",
];

pub const INITIAL_VERSION: i64 = 1;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    /// Assigned by the store on first insert.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub create_by: Option<i64>,
    #[serde(default)]
    pub update_by: Option<i64>,
    /// Optimistic lock counter; 0 until first insert.
    #[serde(default)]
    pub version: i64,
}

impl AuditFields {
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Stamp fields for a first insert. Store-owned fields are overwritten.
    pub fn before_insert(&mut self, now: DateTime<Utc>) {
        self.id = None;
        self.create_time = Some(now);
        self.update_time = Some(now);
        self.deleted = false;
        self.version = INITIAL_VERSION;
    }

    /// Stamp fields for an update. `create_time` and `version` are left alone;
    /// the store bumps the version when the update lands.
    ///
    /// Timestamps have millisecond resolution, so two saves within the same
    /// millisecond leave `update_time` unchanged; only `version` is sure to move.
    pub fn before_update(&mut self, now: DateTime<Utc>) {
        self.update_time = Some(now);
    }

    /// Read the audit columns from a row selected with [`AUDIT_COLUMNS`].
    pub fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
        Ok(AuditFields {
            id: Some(row.try_get::<i64, _>("id")?),
            create_time: Some(millis_to_time(row.try_get("create_time")?)?),
            update_time: Some(millis_to_time(row.try_get("update_time")?)?),
            deleted: row.try_get::<i64, _>("deleted")? != 0,
            create_by: row.try_get("create_by")?,
            update_by: row.try_get("update_by")?,
            version: row.try_get("version")?,
        })
    }
}

/// Current instant truncated to what the store keeps (milliseconds).
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

pub(crate) fn time_to_millis(t: Option<DateTime<Utc>>) -> i64 {
    t.map(|t| t.timestamp_millis()).unwrap_or_default()
}

fn millis_to_time(ms: i64) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| sqlx::Error::Decode(Box::new(PersistenceError::Timestamp(ms))))
}

/// A persisted record with audit fields and soft-delete support.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Table name; identifiers are never taken from user input.
    const TABLE: &'static str;
    /// Domain columns, excluding [`AUDIT_COLUMNS`]. Bound in this order by `bind_columns`.
    const COLUMNS: &'static [&'static str];

    fn audit(&self) -> &AuditFields;
    fn audit_mut(&mut self) -> &mut AuditFields;

    /// Bind one value per entry of [`Entity::COLUMNS`], in order.
    fn bind_columns<'q>(&self, query: AnyQuery<'q>) -> AnyQuery<'q>;

    /// Build the entity from a row holding audit and domain columns.
    fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error>;

    /// Checked before every insert and update.
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn id(&self) -> Option<i64> {
        self.audit().id
    }
}
