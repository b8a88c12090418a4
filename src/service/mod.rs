//! CrudService: generic transactional CRUD over the soft-delete repository.

mod crud;
pub mod tx;
pub use crud::{CrudService, ServiceSettings};
