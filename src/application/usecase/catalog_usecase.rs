// src/application/usecase/catalog_usecase.rs
// Catalog management and query use cases

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::errors::{AppError, AppResult};
use crate::domain::model::Book;
use crate::domain::repository::{BookPatch, BookRepository, CatalogPage, CatalogQuery, NewBook};

const MIN_ISBN_LEN: usize = 10;

/// Catalog use case: seller CRUD plus the public list/search/filter query.
#[async_trait]
pub trait CatalogUseCase {
    async fn create_book(&self, book: NewBook) -> AppResult<Book>;
    async fn get_book(&self, id: Uuid) -> AppResult<Book>;
    async fn update_book(&self, id: Uuid, patch: BookPatch) -> AppResult<Book>;
    async fn delete_book(&self, id: Uuid) -> AppResult<Book>;
    /// Filter, sort and paginate the catalog; see `CatalogQuery` for the
    /// filter semantics.
    async fn list_books(&self, query: CatalogQuery) -> AppResult<CatalogPage>;
}

pub struct CatalogService {
    books: Arc<dyn BookRepository>,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookRepository>) -> Self {
        Self { books }
    }

    fn check_title(title: &str) -> AppResult<()> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        Ok(())
    }

    fn check_author(author: &str) -> AppResult<()> {
        if author.trim().is_empty() {
            return Err(AppError::Validation("author must not be empty".into()));
        }
        Ok(())
    }

    fn check_isbn(isbn: &str) -> AppResult<()> {
        if isbn.len() < MIN_ISBN_LEN {
            return Err(AppError::Validation(format!(
                "isbn must be at least {} characters",
                MIN_ISBN_LEN
            )));
        }
        Ok(())
    }

    fn check_price(price: Decimal) -> AppResult<()> {
        if price.is_sign_negative() {
            return Err(AppError::Validation("price must not be negative".into()));
        }
        Ok(())
    }

    fn check_pages(pages: u32) -> AppResult<()> {
        if pages == 0 {
            return Err(AppError::Validation("pages must be positive".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogUseCase for CatalogService {
    async fn create_book(&self, book: NewBook) -> AppResult<Book> {
        Self::check_title(&book.title)?;
        Self::check_author(&book.author)?;
        Self::check_isbn(&book.isbn)?;
        Self::check_price(book.price)?;
        Self::check_pages(book.pages)?;

        let created = self.books.create(book).await?;
        log::info!("Created book {} (\"{}\")", created.id, created.title);
        Ok(created)
    }

    async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        Ok(self.books.get(id).await?)
    }

    async fn update_book(&self, id: Uuid, patch: BookPatch) -> AppResult<Book> {
        if let Some(title) = &patch.title {
            Self::check_title(title)?;
        }
        if let Some(author) = &patch.author {
            Self::check_author(author)?;
        }
        if let Some(isbn) = &patch.isbn {
            Self::check_isbn(isbn)?;
        }
        if let Some(price) = patch.price {
            Self::check_price(price)?;
        }
        if let Some(pages) = patch.pages {
            Self::check_pages(pages)?;
        }

        Ok(self.books.update(id, patch).await?)
    }

    async fn delete_book(&self, id: Uuid) -> AppResult<Book> {
        let removed = self.books.delete(id).await?;
        log::info!("Deleted book {} (\"{}\")", removed.id, removed.title);
        Ok(removed)
    }

    async fn list_books(&self, query: CatalogQuery) -> AppResult<CatalogPage> {
        Ok(self.books.list(&query).await?)
    }
}
