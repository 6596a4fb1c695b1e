// src/domain/repository/mod.rs
// Storage ports for domain entities, with their input/result shapes.
// Implemented by the in-memory store and the Postgres store.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::errors::StoreResult;
use crate::domain::model::{
    Book, Order, OrderDraft, OrderStatus, Review, User, UserRole, UserStatus,
};

/// Catalog store: book records and their stock.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn create(&self, book: NewBook) -> StoreResult<Book>;
    async fn get(&self, id: Uuid) -> StoreResult<Book>;
    /// Filter, sort and paginate the catalog. The returned total counts
    /// matches before pagination.
    async fn list(&self, query: &CatalogQuery) -> StoreResult<CatalogPage>;
    async fn update(&self, id: Uuid, patch: BookPatch) -> StoreResult<Book>;
    async fn delete(&self, id: Uuid) -> StoreResult<Book>;
    /// Guarded check-and-decrement, safe under concurrent callers.
    /// Stock never goes negative.
    async fn decrement_stock(&self, id: Uuid, amount: u32) -> StoreResult<Book>;
}

/// Order store: order headers plus their line items.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Commit a validated draft: apply every stock decrement and persist
    /// the order with its line items as one all-or-nothing unit. Any
    /// failure leaves stock and orders untouched.
    async fn place(&self, draft: OrderDraft) -> StoreResult<Order>;
    async fn get(&self, id: Uuid) -> StoreResult<Order>;
    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;
    /// Set the order's status and bump `updated_at`. Line items and the
    /// total are never touched.
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Order>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create an account. Email is a unique key; duplicates are a conflict.
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    async fn get(&self, id: Uuid) -> StoreResult<User>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Admin moderation: activate, approve or suspend an account.
    async fn set_status(&self, id: Uuid, status: UserStatus) -> StoreResult<User>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, review: NewReview) -> StoreResult<Review>;
    async fn list_for_book(&self, book_id: Uuid) -> StoreResult<Vec<Review>>;
    async fn list_for_seller(&self, seller_id: Uuid) -> StoreResult<Vec<Review>>;
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub seller_id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: String,
    pub genre: String,
    pub publisher: String,
    pub price: Decimal,
    pub stock: u32,
    pub image_url: String,
    pub publication_year: i32,
    pub language: String,
    pub pages: u32,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
    pub image_url: Option<String>,
    pub publication_year: Option<i32>,
    pub language: Option<String>,
    pub pages: Option<u32>,
}

/// Catalog list/search filters. All provided filters are conjunctive,
/// except that `search` replaces `genre` as the base result set when
/// both are present.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    /// Case-insensitive substring match on title or author.
    pub search: Option<String>,
    /// Exact genre match; ignored when `search` is set.
    pub genre: Option<String>,
    /// Case-insensitive substring match on author.
    pub author: Option<String>,
    /// Case-insensitive substring match on publisher.
    pub publisher: Option<String>,
    pub seller_id: Option<Uuid>,
    /// Inclusive bounds.
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: Option<SortBy>,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub offset: usize,
}

pub const DEFAULT_PAGE_SIZE: usize = 20;

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: None,
            genre: None,
            author: None,
            publisher: None,
            seller_id: None,
            min_price: None,
            max_price: None,
            sort_by: None,
            sort_order: SortOrder::Asc,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Price,
    Title,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// One page of catalog results plus the pre-pagination match count.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub books: Vec<Book>,
    pub total: usize,
}

impl CatalogPage {
    pub fn has_more(&self, query: &CatalogQuery) -> bool {
        query.offset + query.limit < self.total
    }
}

/// Order listing filter; the seller filter matches orders containing at
/// least one line item sold by that seller.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub buyer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub book_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub rating: u8,
    pub comment: String,
}
