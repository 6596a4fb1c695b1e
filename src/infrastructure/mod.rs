// src/infrastructure/mod.rs
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;
