//! CRUD routes for one entity type, mounted under a caller-chosen prefix.

use crate::entity::Entity;
use crate::handlers::entity::{
    bulk_create, bulk_delete, bulk_delete_logical, count, create, delete as delete_handler,
    delete_logical, exists, list, page, read, update,
};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

/// Routes relative to the entity's mount point, e.g. `router.nest("/articles", entity_routes::<Article>(state))`.
pub fn entity_routes<E: Entity>(state: AppState) -> Router {
    Router::new()
        .route("/", get(list::<E>).post(create::<E>))
        .route("/page", get(page::<E>))
        .route("/count", get(count::<E>))
        .route("/batch", post(bulk_create::<E>))
        .route("/delete", post(bulk_delete::<E>))
        .route("/delete-logical", post(bulk_delete_logical::<E>))
        .route(
            "/:id",
            get(read::<E>).put(update::<E>).delete(delete_handler::<E>),
        )
        .route("/:id/logical", delete(delete_logical::<E>))
        .route("/:id/exists", get(exists::<E>))
        .with_state(state)
}
