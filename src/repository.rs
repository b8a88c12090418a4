//! Soft-delete repository: identity-keyed CRUD plus deleted-flag aware queries.
//!
//! Every method runs on a caller-supplied connection so the service layer owns
//! transaction boundaries.

use crate::entity::{time_to_millis, Entity};
use crate::error::{AppError, PersistenceError};
use crate::page::{Page, PageRequest};
use crate::sql;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::AnyConnection;
use std::marker::PhantomData;

/// Ids bound per bulk statement. Keeps every statement well under the
/// bind-parameter caps of SQLite (32766) and PostgreSQL (65535).
pub const IDS_PER_STATEMENT: usize = 500;

#[async_trait]
pub trait SoftDeleteRepository<E: Entity>: Send + Sync {
    /// Insert a new row; audit fields must already be stamped.
    async fn insert(&self, conn: &mut AnyConnection, entity: &E) -> Result<E, AppError>;
    /// Version-checked update. Fails on a stale version or a missing id.
    async fn update(&self, conn: &mut AnyConnection, entity: &E) -> Result<E, AppError>;
    async fn find_by_id(&self, conn: &mut AnyConnection, id: i64) -> Result<Option<E>, AppError>;
    async fn exists_by_id(&self, conn: &mut AnyConnection, id: i64) -> Result<bool, AppError>;
    async fn count(&self, conn: &mut AnyConnection) -> Result<u64, AppError>;
    async fn delete_by_id(&self, conn: &mut AnyConnection, id: i64) -> Result<u64, AppError>;
    async fn delete_by_ids(&self, conn: &mut AnyConnection, ids: &[i64]) -> Result<u64, AppError>;

    /// Live rows, newest `create_time` first.
    async fn find_all_not_deleted(&self, conn: &mut AnyConnection) -> Result<Vec<E>, AppError>;
    async fn find_all_not_deleted_paged(
        &self,
        conn: &mut AnyConnection,
        request: &PageRequest,
    ) -> Result<Page<E>, AppError>;
    async fn find_by_id_not_deleted(&self, conn: &mut AnyConnection, id: i64) -> Result<Option<E>, AppError>;
    async fn exists_not_deleted(&self, conn: &mut AnyConnection, id: i64) -> Result<bool, AppError>;
    /// Mark a live row deleted, stamping `update_time` and bumping `version`.
    /// Absent or already deleted ids touch nothing: a repeated logical delete
    /// leaves the first deletion's `update_time` in place.
    async fn logical_delete_by_id(
        &self,
        conn: &mut AnyConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;
    async fn logical_delete_by_ids(
        &self,
        conn: &mut AnyConnection,
        ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;
    async fn count_not_deleted(&self, conn: &mut AnyConnection) -> Result<u64, AppError>;
}

/// SQL-backed repository for any [`Entity`].
pub struct SqlRepository<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> SqlRepository<E> {
    pub fn new() -> Self {
        SqlRepository {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for SqlRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for SqlRepository<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E: Entity> SqlRepository<E> {
    async fn fetch_one_by_id(
        conn: &mut AnyConnection,
        sql: &str,
        id: i64,
    ) -> Result<Option<E>, AppError> {
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query(sql).bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.map(|r| E::from_row(&r)).transpose()?)
    }

    async fn scalar_count(conn: &mut AnyConnection, sql: &str, id: Option<i64>) -> Result<u64, AppError> {
        tracing::debug!(sql = %sql, id = ?id, "query");
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        if let Some(id) = id {
            query = query.bind(id);
        }
        let n = query.fetch_one(&mut *conn).await?;
        Ok(u64::try_from(n).unwrap_or_default())
    }
}

#[async_trait]
impl<E: Entity> SoftDeleteRepository<E> for SqlRepository<E> {
    async fn insert(&self, conn: &mut AnyConnection, entity: &E) -> Result<E, AppError> {
        let sql = sql::insert::<E>();
        tracing::debug!(sql = %sql, "query");
        let audit = entity.audit();
        let query = sqlx::query(&sql)
            .bind(time_to_millis(audit.create_time))
            .bind(time_to_millis(audit.update_time))
            .bind(i64::from(audit.deleted))
            .bind(audit.create_by)
            .bind(audit.update_by)
            .bind(audit.version);
        let row = entity.bind_columns(query).fetch_one(&mut *conn).await?;
        Ok(E::from_row(&row)?)
    }

    async fn update(&self, conn: &mut AnyConnection, entity: &E) -> Result<E, AppError> {
        let audit = entity.audit();
        let Some(id) = audit.id else {
            return Err(AppError::invalid_argument("cannot update an entity without id"));
        };
        let sql = sql::update::<E>();
        tracing::debug!(sql = %sql, id, version = audit.version, "query");
        let query = sqlx::query(&sql)
            .bind(time_to_millis(audit.update_time))
            .bind(i64::from(audit.deleted))
            .bind(audit.update_by);
        let row = entity
            .bind_columns(query)
            .bind(id)
            .bind(audit.version)
            .fetch_optional(&mut *conn)
            .await?;
        if let Some(row) = row {
            return Ok(E::from_row(&row)?);
        }
        if self.exists_by_id(conn, id).await? {
            Err(PersistenceError::StaleVersion {
                table: E::TABLE,
                id,
                version: audit.version,
            }
            .into())
        } else {
            Err(PersistenceError::MissingRow { table: E::TABLE, id }.into())
        }
    }

    async fn find_by_id(&self, conn: &mut AnyConnection, id: i64) -> Result<Option<E>, AppError> {
        Self::fetch_one_by_id(conn, &sql::select_by_id::<E>(), id).await
    }

    async fn exists_by_id(&self, conn: &mut AnyConnection, id: i64) -> Result<bool, AppError> {
        Ok(Self::scalar_count(conn, &sql::count_by_id::<E>(), Some(id)).await? > 0)
    }

    async fn count(&self, conn: &mut AnyConnection) -> Result<u64, AppError> {
        Self::scalar_count(conn, &sql::count_all::<E>(), None).await
    }

    async fn delete_by_id(&self, conn: &mut AnyConnection, id: i64) -> Result<u64, AppError> {
        self.delete_by_ids(conn, &[id]).await
    }

    async fn delete_by_ids(&self, conn: &mut AnyConnection, ids: &[i64]) -> Result<u64, AppError> {
        let mut affected = 0;
        for chunk in ids.chunks(IDS_PER_STATEMENT) {
            let sql = sql::delete_by_ids::<E>(chunk.len());
            tracing::debug!(sql = %sql, count = chunk.len(), "query");
            let mut query = sqlx::query(&sql);
            for id in chunk {
                query = query.bind(*id);
            }
            affected += query.execute(&mut *conn).await?.rows_affected();
        }
        Ok(affected)
    }

    async fn find_all_not_deleted(&self, conn: &mut AnyConnection) -> Result<Vec<E>, AppError> {
        let sql = sql::select_not_deleted::<E>(None, None);
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(E::from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_all_not_deleted_paged(
        &self,
        conn: &mut AnyConnection,
        request: &PageRequest,
    ) -> Result<Page<E>, AppError> {
        let total = self.count_not_deleted(conn).await?;
        let sql = sql::select_not_deleted::<E>(Some(request.size), Some(request.offset()));
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
        let content = rows.iter().map(E::from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(content, request, total))
    }

    async fn find_by_id_not_deleted(&self, conn: &mut AnyConnection, id: i64) -> Result<Option<E>, AppError> {
        Self::fetch_one_by_id(conn, &sql::select_by_id_not_deleted::<E>(), id).await
    }

    async fn exists_not_deleted(&self, conn: &mut AnyConnection, id: i64) -> Result<bool, AppError> {
        Ok(Self::scalar_count(conn, &sql::count_by_id_not_deleted::<E>(), Some(id)).await? > 0)
    }

    async fn logical_delete_by_id(
        &self,
        conn: &mut AnyConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        self.logical_delete_by_ids(conn, &[id], now).await
    }

    async fn logical_delete_by_ids(
        &self,
        conn: &mut AnyConnection,
        ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut affected = 0;
        for chunk in ids.chunks(IDS_PER_STATEMENT) {
            let sql = sql::logical_delete_by_ids::<E>(chunk.len());
            tracing::debug!(sql = %sql, count = chunk.len(), "query");
            let mut query = sqlx::query(&sql).bind(now.timestamp_millis());
            for id in chunk {
                query = query.bind(*id);
            }
            affected += query.execute(&mut *conn).await?.rows_affected();
        }
        Ok(affected)
    }

    async fn count_not_deleted(&self, conn: &mut AnyConnection) -> Result<u64, AppError> {
        Self::scalar_count(conn, &sql::count_not_deleted::<E>(), None).await
    }
}
