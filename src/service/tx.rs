//! Transaction helpers: read-only marking and batch timeouts.

use crate::error::{AppError, PersistenceError};
use sqlx::{Any, AnyPool, Transaction};
use std::future::Future;
use std::time::Duration;

const POSTGRES_BACKEND: &str = "PostgreSQL";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxMode {
    ReadWrite,
    ReadOnly,
}

/// Begin a transaction. Read-only transactions are declared as such where the backend supports it.
pub async fn begin(pool: &AnyPool, mode: TxMode) -> Result<Transaction<'static, Any>, AppError> {
    let mut tx = pool.begin().await?;
    if mode == TxMode::ReadOnly && tx.backend_name() == POSTGRES_BACKEND {
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
    }
    Ok(tx)
}

/// Run `fut` with an upper bound. Dropping the future on expiry drops its
/// transaction uncommitted, which rolls it back.
pub async fn bounded<T, F>(table: &'static str, limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(table, seconds = limit.as_secs(), "batch transaction timed out");
            Err(PersistenceError::Timeout {
                table,
                seconds: limit.as_secs(),
            }
            .into())
        }
    }
}
