//! truthbot/crates/storage-adapters/src/lib.rs
//!
//! Persistence adapters for the repository ports in `domains`.
//! `memory` is always compiled; PostgreSQL sits behind `db-postgres`.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
