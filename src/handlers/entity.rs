//! Generic entity CRUD handlers. Every response is an envelope at HTTP 200.

use crate::entity::Entity;
use crate::error::{AppError, BusinessError};
use crate::extractors::{Actor, ApiJson, ApiPath, ApiQuery};
use crate::page::{Page, PageRequest};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Affected {
    pub rows: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Counts {
    pub total: u64,
    pub live: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Existence {
    pub exists: bool,
    pub live: bool,
}

fn not_found(id: i64) -> AppError {
    BusinessError::with_code(404, format!("资源未找到: {}", id)).into()
}

/// Prepare a client body for insertion: store-owned audit fields are reset.
fn as_new<E: Entity>(mut entity: E, actor: Actor) -> E {
    let audit = entity.audit_mut();
    *audit = Default::default();
    audit.create_by = actor.0;
    audit.update_by = actor.0;
    entity
}

pub async fn list<E: Entity>(State(state): State<AppState>) -> Result<ApiResponse<Vec<E>>, AppError> {
    let rows = state.service::<E>().find_all().await?;
    Ok(ApiResponse::success_with(rows))
}

pub async fn page<E: Entity>(
    State(state): State<AppState>,
    ApiQuery(request): ApiQuery<PageRequest>,
) -> Result<ApiResponse<Page<E>>, AppError> {
    let page = state.service::<E>().find_all_by_page(request).await?;
    Ok(ApiResponse::success_with(page))
}

pub async fn create<E: Entity>(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(body): ApiJson<E>,
) -> Result<ApiResponse<E>, AppError> {
    let saved = state.service::<E>().save(as_new(body, actor)).await?;
    Ok(ApiResponse::success_with(saved))
}

pub async fn bulk_create<E: Entity>(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(body): ApiJson<Vec<E>>,
) -> Result<ApiResponse<Vec<E>>, AppError> {
    let items = body.into_iter().map(|e| as_new(e, actor)).collect();
    let saved = state.service::<E>().save_all(items).await?;
    Ok(ApiResponse::success_with(saved))
}

pub async fn read<E: Entity>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<E>, AppError> {
    let row = state
        .service::<E>()
        .find_by_id_and_not_deleted(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::success_with(row))
}

/// Full update. The body must carry the `version` it was read at.
pub async fn update<E: Entity>(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(mut body): ApiJson<E>,
) -> Result<ApiResponse<E>, AppError> {
    let service = state.service::<E>();
    let current = service
        .find_by_id_and_not_deleted(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let audit = body.audit_mut();
    if audit.version == 0 {
        return Err(AppError::invalid_argument("version is required for update"));
    }
    audit.id = Some(id);
    audit.deleted = false;
    audit.create_time = current.audit().create_time;
    audit.create_by = current.audit().create_by;
    audit.update_by = actor.0.or(current.audit().update_by);
    let saved = service.save(body).await?;
    Ok(ApiResponse::success_with(saved))
}

pub async fn delete<E: Entity>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Affected>, AppError> {
    let rows = state.service::<E>().delete_by_id(id).await?;
    Ok(ApiResponse::success_with(Affected { rows }))
}

pub async fn delete_logical<E: Entity>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Affected>, AppError> {
    let rows = state.service::<E>().delete_by_id_logical(id).await?;
    Ok(ApiResponse::success_with(Affected { rows }))
}

pub async fn bulk_delete<E: Entity>(
    State(state): State<AppState>,
    ApiJson(ids): ApiJson<Vec<i64>>,
) -> Result<ApiResponse<Affected>, AppError> {
    let rows = state.service::<E>().delete_by_ids(&ids).await?;
    Ok(ApiResponse::success_with(Affected { rows }))
}

pub async fn bulk_delete_logical<E: Entity>(
    State(state): State<AppState>,
    ApiJson(ids): ApiJson<Vec<i64>>,
) -> Result<ApiResponse<Affected>, AppError> {
    let rows = state.service::<E>().delete_by_ids_logical(&ids).await?;
    Ok(ApiResponse::success_with(Affected { rows }))
}

pub async fn count<E: Entity>(State(state): State<AppState>) -> Result<ApiResponse<Counts>, AppError> {
    let service = state.service::<E>();
    let total = service.count().await?;
    let live = service.count_not_deleted().await?;
    Ok(ApiResponse::success_with(Counts { total, live }))
}

pub async fn exists<E: Entity>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Existence>, AppError> {
    let service = state.service::<E>();
    let exists = service.exists_by_id(id).await?;
    let live = service.exists_by_id_and_not_deleted(id).await?;
    Ok(ApiResponse::success_with(Existence { exists, live }))
}
