// src/domain/mod.rs
pub mod errors;
pub mod model;
pub mod repository;

// Re-export common types for convenience
pub use errors::{AppError, AppResult, StoreError, StoreResult};
pub use model::{
    Address, Book, Order, OrderDraft, OrderItem, OrderStatus, Review, User, UserRole, UserStatus,
};
