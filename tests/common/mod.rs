#![allow(dead_code)]

use axum::body::Body;
use crud_starter::{
    connect, ensure_table, AnyQuery, AppConfig, AppError, AppState, AuditFields, Entity,
};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use std::time::Duration;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(flatten)]
    pub audit: AuditFields,
    pub title: String,
    #[serde(default)]
    pub priority: i64,
}

impl Note {
    pub fn new(title: &str, priority: i64) -> Self {
        Note {
            title: title.to_string(),
            priority,
            ..Default::default()
        }
    }
}

impl Entity for Note {
    const TABLE: &'static str = "notes";
    const COLUMNS: &'static [&'static str] = &["title", "priority"];

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn bind_columns<'q>(&self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query.bind(self.title.clone()).bind(self.priority)
    }

    fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Note {
            audit: AuditFields::from_row(row)?,
            title: row.try_get("title")?,
            priority: row.try_get("priority")?,
        })
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::invalid_argument("title must not be blank"));
        }
        Ok(())
    }
}

/// Negative priorities pass validation but violate the table constraint.
pub const NOTE_COLUMNS: &str = "\"title\" TEXT NOT NULL, \"priority\" BIGINT NOT NULL CHECK (\"priority\" >= 0)";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        batch_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

pub async fn note_pool() -> AnyPool {
    let pool = connect(&test_config()).await.unwrap();
    ensure_table::<Note>(&pool, NOTE_COLUMNS).await.unwrap();
    pool
}

pub async fn note_state() -> AppState {
    AppState::new(note_pool().await, &test_config())
}

pub async fn body_json(resp: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
