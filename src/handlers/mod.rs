//! HTTP handlers for generic entity CRUD and the diagnostic endpoints.

pub mod diagnostics;
pub mod entity;
