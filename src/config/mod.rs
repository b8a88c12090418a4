//! Application settings read from the environment.

mod env;

pub use env::*;
