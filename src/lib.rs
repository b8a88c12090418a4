//! CRUD starter: soft-delete aware repositories, a generic service layer, and a
//! uniform response envelope served over axum.

pub mod config;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod page;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use entity::{AnyQuery, AuditFields, Entity};
pub use error::{AppError, BusinessError, ConfigError, PersistenceError};
pub use page::{Page, PageRequest};
pub use repository::{SoftDeleteRepository, SqlRepository};
pub use response::ApiResponse;
pub use routes::{base_routes, entity_routes, with_layers};
pub use service::{CrudService, ServiceSettings};
pub use state::AppState;
pub use store::{connect, ensure_database_exists, ensure_table, Backend};
