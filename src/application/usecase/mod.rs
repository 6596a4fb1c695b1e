// src/application/usecase/mod.rs
pub mod account_usecase;
pub mod catalog_usecase;
pub mod order_usecase;
pub mod review_usecase;

// Re-export public API
pub use account_usecase::{AccountService, AccountUseCase};
pub use catalog_usecase::{CatalogService, CatalogUseCase};
pub use order_usecase::{OrderManagementUseCase, OrderService};
pub use review_usecase::{ReviewService, ReviewUseCase};
