//! Request extractors that reject with the envelope-producing `AppError`.

mod actor;
mod rejection;

pub use actor::{Actor, ACTOR_ID_HEADER};
pub use rejection::{ApiJson, ApiPath, ApiQuery};
