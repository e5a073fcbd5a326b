//! Configuration loading and schema definitions
//!
//! Startup configuration for the server and CLI. Loaded once, never
//! mutated afterwards.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
