//! CrudService: transactional operations over a soft-delete repository.

use super::tx::{self, TxMode};
use crate::entity::{now_millis, Entity};
use crate::error::AppError;
use crate::page::{Page, PageRequest};
use crate::repository::{SoftDeleteRepository, SqlRepository};
use sqlx::{AnyConnection, AnyPool};
use std::marker::PhantomData;
use std::time::Duration;

/// Settings shared by every service built from one application state.
#[derive(Clone, Copy, Debug)]
pub struct ServiceSettings {
    pub batch_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            batch_timeout: Duration::from_secs(crate::config::DEFAULT_BATCH_TIMEOUT_SECS),
        }
    }
}

/// Each call opens and finishes its own transaction. Errors roll the
/// transaction back and propagate unchanged; nothing is retried.
pub struct CrudService<E, R = SqlRepository<E>> {
    pool: AnyPool,
    repository: R,
    settings: ServiceSettings,
    _marker: PhantomData<fn() -> E>,
}

impl<E, R: Clone> Clone for CrudService<E, R> {
    fn clone(&self) -> Self {
        CrudService {
            pool: self.pool.clone(),
            repository: self.repository.clone(),
            settings: self.settings,
            _marker: PhantomData,
        }
    }
}

impl<E: Entity> CrudService<E> {
    pub fn new(pool: AnyPool, settings: ServiceSettings) -> Self {
        Self::with_repository(pool, SqlRepository::new(), settings)
    }
}

impl<E, R> CrudService<E, R>
where
    E: Entity,
    R: SoftDeleteRepository<E>,
{
    pub fn with_repository(pool: AnyPool, repository: R, settings: ServiceSettings) -> Self {
        CrudService {
            pool,
            repository,
            settings,
            _marker: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Insert when the entity has no id, otherwise a version-checked update.
    pub async fn save(&self, entity: E) -> Result<E, AppError> {
        tracing::debug!(table = E::TABLE, id = ?entity.id(), "saving entity");
        let mut tx = tx::begin(&self.pool, TxMode::ReadWrite).await?;
        let saved = self.persist(&mut tx, entity).await?;
        tx.commit().await?;
        tracing::debug!(table = E::TABLE, id = ?saved.id(), version = saved.audit().version, "saved entity");
        Ok(saved)
    }

    /// All-or-nothing batch save under one bounded transaction.
    pub async fn save_all(&self, entities: Vec<E>) -> Result<Vec<E>, AppError> {
        let count = entities.len();
        tracing::debug!(table = E::TABLE, count, "saving entities");
        let saved = tx::bounded(E::TABLE, self.settings.batch_timeout, async {
            let mut tx = tx::begin(&self.pool, TxMode::ReadWrite).await?;
            let mut out = Vec::with_capacity(count);
            for entity in entities {
                out.push(self.persist(&mut tx, entity).await?);
            }
            tx.commit().await?;
            Ok::<_, AppError>(out)
        })
        .await?;
        tracing::debug!(table = E::TABLE, count = saved.len(), "saved entities");
        Ok(saved)
    }

    async fn persist(&self, conn: &mut AnyConnection, mut entity: E) -> Result<E, AppError> {
        entity.validate()?;
        let now = now_millis();
        if entity.audit().is_new() {
            entity.audit_mut().before_insert(now);
            self.repository.insert(conn, &entity).await
        } else {
            entity.audit_mut().before_update(now);
            self.repository.update(conn, &entity).await
        }
    }

    /// Physical delete. Absent ids are not an error.
    pub async fn delete_by_id(&self, id: i64) -> Result<u64, AppError> {
        tracing::debug!(table = E::TABLE, id, "deleting entity");
        let mut tx = tx::begin(&self.pool, TxMode::ReadWrite).await?;
        let n = self.repository.delete_by_id(&mut tx, id).await?;
        tx.commit().await?;
        tracing::debug!(table = E::TABLE, id, rows = n, "deleted entity");
        Ok(n)
    }

    pub async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64, AppError> {
        tracing::debug!(table = E::TABLE, count = ids.len(), "deleting entities");
        let n = tx::bounded(E::TABLE, self.settings.batch_timeout, async {
            let mut tx = tx::begin(&self.pool, TxMode::ReadWrite).await?;
            let n = self.repository.delete_by_ids(&mut tx, ids).await?;
            tx.commit().await?;
            Ok::<_, AppError>(n)
        })
        .await?;
        tracing::debug!(table = E::TABLE, rows = n, "deleted entities");
        Ok(n)
    }

    /// Flip the deleted flag; the row stays in the table.
    pub async fn delete_by_id_logical(&self, id: i64) -> Result<u64, AppError> {
        tracing::debug!(table = E::TABLE, id, "logically deleting entity");
        let mut tx = tx::begin(&self.pool, TxMode::ReadWrite).await?;
        let n = self
            .repository
            .logical_delete_by_id(&mut tx, id, now_millis())
            .await?;
        tx.commit().await?;
        tracing::debug!(table = E::TABLE, id, rows = n, "logically deleted entity");
        Ok(n)
    }

    pub async fn delete_by_ids_logical(&self, ids: &[i64]) -> Result<u64, AppError> {
        tracing::debug!(table = E::TABLE, count = ids.len(), "logically deleting entities");
        let n = tx::bounded(E::TABLE, self.settings.batch_timeout, async {
            let mut tx = tx::begin(&self.pool, TxMode::ReadWrite).await?;
            let n = self
                .repository
                .logical_delete_by_ids(&mut tx, ids, now_millis())
                .await?;
            tx.commit().await?;
            Ok::<_, AppError>(n)
        })
        .await?;
        tracing::debug!(table = E::TABLE, rows = n, "logically deleted entities");
        Ok(n)
    }

    /// Lookup ignoring the deleted flag.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError> {
        tracing::debug!(table = E::TABLE, id, "finding entity");
        let mut tx = tx::begin(&self.pool, TxMode::ReadOnly).await?;
        let found = self.repository.find_by_id(&mut tx, id).await?;
        tx.commit().await?;
        Ok(found)
    }

    pub async fn find_by_id_and_not_deleted(&self, id: i64) -> Result<Option<E>, AppError> {
        tracing::debug!(table = E::TABLE, id, "finding live entity");
        let mut tx = tx::begin(&self.pool, TxMode::ReadOnly).await?;
        let found = self.repository.find_by_id_not_deleted(&mut tx, id).await?;
        tx.commit().await?;
        Ok(found)
    }

    /// All live rows, newest first.
    pub async fn find_all(&self) -> Result<Vec<E>, AppError> {
        tracing::debug!(table = E::TABLE, "finding live entities");
        let mut tx = tx::begin(&self.pool, TxMode::ReadOnly).await?;
        let rows = self.repository.find_all_not_deleted(&mut tx).await?;
        tx.commit().await?;
        tracing::debug!(table = E::TABLE, count = rows.len(), "found live entities");
        Ok(rows)
    }

    pub async fn find_all_by_page(&self, request: PageRequest) -> Result<Page<E>, AppError> {
        let request = request.validated()?;
        tracing::debug!(table = E::TABLE, page = request.page, size = request.size, "finding page");
        let mut tx = tx::begin(&self.pool, TxMode::ReadOnly).await?;
        let page = self
            .repository
            .find_all_not_deleted_paged(&mut tx, &request)
            .await?;
        tx.commit().await?;
        tracing::debug!(
            table = E::TABLE,
            total = page.total_elements,
            count = page.number_of_elements(),
            "found page"
        );
        Ok(page)
    }

    pub async fn exists_by_id(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = tx::begin(&self.pool, TxMode::ReadOnly).await?;
        let exists = self.repository.exists_by_id(&mut tx, id).await?;
        tx.commit().await?;
        tracing::debug!(table = E::TABLE, id, exists, "checked existence");
        Ok(exists)
    }

    pub async fn exists_by_id_and_not_deleted(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = tx::begin(&self.pool, TxMode::ReadOnly).await?;
        let exists = self.repository.exists_not_deleted(&mut tx, id).await?;
        tx.commit().await?;
        tracing::debug!(table = E::TABLE, id, exists, "checked live existence");
        Ok(exists)
    }

    /// Every row, deleted or not.
    pub async fn count(&self) -> Result<u64, AppError> {
        let mut tx = tx::begin(&self.pool, TxMode::ReadOnly).await?;
        let n = self.repository.count(&mut tx).await?;
        tx.commit().await?;
        tracing::debug!(table = E::TABLE, count = n, "counted entities");
        Ok(n)
    }

    pub async fn count_not_deleted(&self) -> Result<u64, AppError> {
        let mut tx = tx::begin(&self.pool, TxMode::ReadOnly).await?;
        let n = self.repository.count_not_deleted(&mut tx).await?;
        tx.commit().await?;
        tracing::debug!(table = E::TABLE, count = n, "counted live entities");
        Ok(n)
    }
}
