//! Shared application state for all routes.

use crate::config::AppConfig;
use crate::entity::Entity;
use crate::service::{CrudService, ServiceSettings};
use sqlx::AnyPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: AnyPool,
    pub settings: ServiceSettings,
}

impl AppState {
    pub fn new(pool: AnyPool, config: &AppConfig) -> Self {
        AppState {
            pool,
            settings: ServiceSettings {
                batch_timeout: config.batch_timeout,
            },
        }
    }

    /// A service for `E` sharing this state's pool. Cheap: the pool is reference counted.
    pub fn service<E: Entity>(&self) -> CrudService<E> {
        CrudService::new(self.pool.clone(), self.settings)
    }
}
