mod common;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{note_pool, Note};
use crud_starter::repository::IDS_PER_STATEMENT;
use crud_starter::{
    AppError, CrudService, Page, PageRequest, ServiceSettings, SoftDeleteRepository, SqlRepository,
};
use sqlx::AnyConnection;
use std::time::Duration;

async fn service() -> CrudService<Note> {
    CrudService::new(note_pool().await, ServiceSettings::default())
}

#[tokio::test]
async fn first_save_assigns_id_and_equal_timestamps() {
    let svc = service().await;
    let saved = svc.save(Note::new("first", 1)).await.unwrap();

    assert!(saved.audit.id.is_some());
    assert!(saved.audit.create_time.is_some());
    assert_eq!(saved.audit.create_time, saved.audit.update_time);
    assert!(!saved.audit.deleted);
    assert_eq!(saved.audit.version, 1);
}

#[tokio::test]
async fn second_save_keeps_create_time_and_bumps_version() {
    let svc = service().await;
    let saved = svc.save(Note::new("draft", 1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let mut edited = saved.clone();
    edited.title = "final".into();
    let updated = svc.save(edited).await.unwrap();

    assert_eq!(updated.audit.id, saved.audit.id);
    assert_eq!(updated.audit.create_time, saved.audit.create_time);
    assert!(updated.audit.update_time > saved.audit.update_time);
    assert_eq!(updated.audit.version, saved.audit.version + 1);
    assert_eq!(updated.title, "final");
}

#[tokio::test]
async fn stale_version_is_rejected_and_row_untouched() {
    let svc = service().await;
    let saved = svc.save(Note::new("v1", 1)).await.unwrap();

    let mut winner = saved.clone();
    winner.title = "winner".into();
    svc.save(winner).await.unwrap();

    let mut loser = saved.clone();
    loser.title = "loser".into();
    let err = svc.save(loser).await.unwrap_err();
    assert!(matches!(err, AppError::Internal { .. }));
    assert!(err.to_string().contains("stale version"), "{}", err);

    let current = svc.find_by_id(saved.audit.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(current.title, "winner");
    assert_eq!(current.audit.version, 2);
}

#[tokio::test]
async fn saving_unknown_id_is_missing_row() {
    let svc = service().await;
    let mut ghost = Note::new("ghost", 1);
    ghost.audit.id = Some(404);
    ghost.audit.version = 1;
    let err = svc.save(ghost).await.unwrap_err();
    assert!(err.to_string().contains("does not exist"), "{}", err);
}

#[tokio::test]
async fn logical_delete_hides_row_from_live_reads() {
    let svc = service().await;
    let saved = svc.save(Note::new("doomed", 1)).await.unwrap();
    let id = saved.audit.id.unwrap();

    assert_eq!(svc.delete_by_id_logical(id).await.unwrap(), 1);

    assert!(svc.find_by_id_and_not_deleted(id).await.unwrap().is_none());
    assert!(!svc.exists_by_id_and_not_deleted(id).await.unwrap());
    assert!(svc.exists_by_id(id).await.unwrap());

    let raw = svc.find_by_id(id).await.unwrap().unwrap();
    assert!(raw.audit.deleted);
    assert_eq!(raw.audit.version, saved.audit.version + 1);

    // Already deleted rows are not touched again.
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(svc.delete_by_id_logical(id).await.unwrap(), 0);
    assert_eq!(svc.delete_by_ids_logical(&[id]).await.unwrap(), 0);
    let again = svc.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(again.audit.update_time, raw.audit.update_time);
    assert_eq!(again.audit.version, raw.audit.version);
}

#[tokio::test]
async fn find_all_excludes_deleted_and_is_newest_first() {
    let svc = service().await;
    let a = svc.save(Note::new("a", 1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3)).await;
    let b = svc.save(Note::new("b", 1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3)).await;
    let c = svc.save(Note::new("c", 1)).await.unwrap();

    svc.delete_by_id_logical(b.audit.id.unwrap()).await.unwrap();

    let titles: Vec<_> = svc
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["c", "a"]);
    assert_eq!(svc.count().await.unwrap(), 3);
    assert_eq!(svc.count_not_deleted().await.unwrap(), 2);
    assert!(c.audit.create_time > a.audit.create_time);
}

#[tokio::test]
async fn save_all_is_all_or_nothing_on_validation() {
    let svc = service().await;
    let batch = vec![Note::new("ok-1", 1), Note::new("ok-2", 2), Note::new("  ", 3)];

    let err = svc.save_all(batch).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert_eq!(svc.count().await.unwrap(), 0);
}

#[tokio::test]
async fn save_all_rolls_back_on_store_failure() {
    let svc = service().await;
    let batch = vec![Note::new("ok", 1), Note::new("negative", -1)];

    let err = svc.save_all(batch).await.unwrap_err();
    assert!(matches!(err, AppError::Internal { .. }));
    assert_eq!(svc.count().await.unwrap(), 0);
}

#[tokio::test]
async fn save_all_persists_every_row() {
    let svc = service().await;
    let saved = svc
        .save_all(vec![Note::new("x", 1), Note::new("y", 2)])
        .await
        .unwrap();
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|n| n.audit.id.is_some()));
    assert_eq!(svc.count_not_deleted().await.unwrap(), 2);
}

#[tokio::test]
async fn paging_reports_totals_over_live_rows() {
    let svc = service().await;
    let notes = (0..5).map(|i| Note::new(&format!("n{}", i), i)).collect();
    let saved = svc.save_all(notes).await.unwrap();
    svc.delete_by_id_logical(saved[0].audit.id.unwrap()).await.unwrap();

    let page = svc.find_all_by_page(PageRequest::new(1, 3).unwrap()).await.unwrap();
    assert_eq!(page.total_elements, 4);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.page, 1);
    assert_eq!(page.content.len(), 1);

    let err = svc
        .find_all_by_page(PageRequest { page: 0, size: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
}

#[tokio::test]
async fn batch_deletes_count_affected_rows() {
    let svc = service().await;
    let saved = svc
        .save_all(vec![Note::new("p", 1), Note::new("q", 1), Note::new("r", 1)])
        .await
        .unwrap();
    let ids: Vec<i64> = saved.iter().filter_map(|n| n.audit.id).collect();

    assert_eq!(svc.delete_by_ids_logical(&ids[..2]).await.unwrap(), 2);
    assert_eq!(svc.count_not_deleted().await.unwrap(), 1);

    assert_eq!(svc.delete_by_ids(&[ids[0], 9999]).await.unwrap(), 1);
    assert_eq!(svc.delete_by_id(ids[2]).await.unwrap(), 1);
    assert_eq!(svc.count().await.unwrap(), 1);

    assert_eq!(svc.delete_by_ids(&[]).await.unwrap(), 0);
    assert_eq!(svc.delete_by_ids_logical(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn bulk_deletes_accept_more_ids_than_bind_limits() {
    let svc = service().await;
    let saved = svc
        .save_all(vec![Note::new("keep", 1), Note::new("drop", 1), Note::new("hide", 1)])
        .await
        .unwrap();
    let drop_id = saved[1].audit.id.unwrap();
    let hide_id = saved[2].audit.id.unwrap();

    // Real ids sit at the far end, past the first statement's chunk.
    let mut ids: Vec<i64> = (1_000_000..1_040_000).collect();
    assert!(ids.len() > 32_766 && ids.len() > IDS_PER_STATEMENT);
    ids.push(hide_id);
    assert_eq!(svc.delete_by_ids_logical(&ids).await.unwrap(), 1);

    ids.pop();
    ids.push(drop_id);
    assert_eq!(svc.delete_by_ids(&ids).await.unwrap(), 1);

    assert_eq!(svc.count().await.unwrap(), 2);
    assert_eq!(svc.count_not_deleted().await.unwrap(), 1);
}

/// Inserts normally, then stalls while still holding the transaction.
#[derive(Clone)]
struct StallingRepository {
    inner: SqlRepository<Note>,
    stall: Duration,
}

#[async_trait]
impl SoftDeleteRepository<Note> for StallingRepository {
    async fn insert(&self, conn: &mut AnyConnection, entity: &Note) -> Result<Note, AppError> {
        let saved = self.inner.insert(conn, entity).await?;
        tokio::time::sleep(self.stall).await;
        Ok(saved)
    }

    async fn update(&self, conn: &mut AnyConnection, entity: &Note) -> Result<Note, AppError> {
        self.inner.update(conn, entity).await
    }

    async fn find_by_id(&self, conn: &mut AnyConnection, id: i64) -> Result<Option<Note>, AppError> {
        self.inner.find_by_id(conn, id).await
    }

    async fn exists_by_id(&self, conn: &mut AnyConnection, id: i64) -> Result<bool, AppError> {
        self.inner.exists_by_id(conn, id).await
    }

    async fn count(&self, conn: &mut AnyConnection) -> Result<u64, AppError> {
        self.inner.count(conn).await
    }

    async fn delete_by_id(&self, conn: &mut AnyConnection, id: i64) -> Result<u64, AppError> {
        self.inner.delete_by_id(conn, id).await
    }

    async fn delete_by_ids(&self, conn: &mut AnyConnection, ids: &[i64]) -> Result<u64, AppError> {
        self.inner.delete_by_ids(conn, ids).await
    }

    async fn find_all_not_deleted(&self, conn: &mut AnyConnection) -> Result<Vec<Note>, AppError> {
        self.inner.find_all_not_deleted(conn).await
    }

    async fn find_all_not_deleted_paged(
        &self,
        conn: &mut AnyConnection,
        request: &PageRequest,
    ) -> Result<Page<Note>, AppError> {
        self.inner.find_all_not_deleted_paged(conn, request).await
    }

    async fn find_by_id_not_deleted(&self, conn: &mut AnyConnection, id: i64) -> Result<Option<Note>, AppError> {
        self.inner.find_by_id_not_deleted(conn, id).await
    }

    async fn exists_not_deleted(&self, conn: &mut AnyConnection, id: i64) -> Result<bool, AppError> {
        self.inner.exists_not_deleted(conn, id).await
    }

    async fn logical_delete_by_id(
        &self,
        conn: &mut AnyConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        self.inner.logical_delete_by_id(conn, id, now).await
    }

    async fn logical_delete_by_ids(
        &self,
        conn: &mut AnyConnection,
        ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        self.inner.logical_delete_by_ids(conn, ids, now).await
    }

    async fn count_not_deleted(&self, conn: &mut AnyConnection) -> Result<u64, AppError> {
        self.inner.count_not_deleted(conn).await
    }
}

#[tokio::test]
async fn timed_out_batch_rolls_back_its_inserts() {
    let repository = StallingRepository {
        inner: SqlRepository::new(),
        stall: Duration::from_millis(300),
    };
    let settings = ServiceSettings {
        batch_timeout: Duration::from_millis(50),
    };
    let svc = CrudService::with_repository(note_pool().await, repository, settings);

    let err = svc
        .save_all(vec![Note::new("first", 1), Note::new("second", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal { .. }));
    assert!(err.to_string().contains("exceeded"), "{}", err);

    assert_eq!(svc.count().await.unwrap(), 0);
}
