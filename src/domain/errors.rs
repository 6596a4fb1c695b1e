// src/domain/errors.rs
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid shipping address: {0} must not be empty")]
    InvalidAddress(&'static str),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Account suspended")]
    Suspended,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// True when the failure is caused by the caller's input rather
    /// than by the service or its storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::InvalidAddress(_)
                | AppError::Unauthorized(_)
                | AppError::Store(StoreError::NotFound { .. })
                | AppError::Store(StoreError::InsufficientStock { .. })
                | AppError::Store(StoreError::Conflict(_))
        )
    }
}

/// Failures surfaced by the catalog/order/user/review stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("insufficient stock for \"{title}\" ({book_id}): requested {requested}, available {available}")]
    InsufficientStock {
        book_id: Uuid,
        title: String,
        requested: u32,
        available: u32,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        StoreError::NotFound { entity, id }
    }
}

// Result type aliases for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type StoreResult<T> = Result<T, StoreError>;
