//! truthbot/crates/domains/src/lib.rs
//!
//! Entities, error taxonomy and port traits shared by every other crate.
//! Nothing in here performs I/O.

pub mod error;
pub mod models;
pub mod pagination;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use pagination::*;
pub use ports::*;
