// src/infrastructure/memory/mod.rs
// In-memory store used for local development and tests. One struct backs
// all four repositories so order placement can hold a single write guard
// across the stock check-and-decrement and the order insert, keeping
// concurrent placements serialized and every commit all-or-nothing.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::model::{
    Book, Order, OrderDraft, OrderStatus, Review, User, UserRole, UserStatus,
};
use crate::domain::repository::{
    BookPatch, BookRepository, CatalogPage, CatalogQuery, NewBook, NewReview, NewUser,
    OrderFilter, OrderRepository, ReviewRepository, SortBy, SortOrder, UserRepository,
};

#[derive(Default)]
pub struct MemoryStore {
    books: RwLock<HashMap<Uuid, Book>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    users: RwLock<HashMap<Uuid, User>>,
    reviews: RwLock<HashMap<Uuid, Review>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let mut books = self.books.write().await;

        if books.values().any(|existing| existing.isbn == book.isbn) {
            return Err(StoreError::Conflict(format!(
                "isbn {} already exists",
                book.isbn
            )));
        }

        let now = Utc::now();
        let created = Book {
            id: Uuid::new_v4(),
            seller_id: book.seller_id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            description: book.description,
            genre: book.genre,
            publisher: book.publisher,
            price: book.price,
            stock: book.stock,
            image_url: book.image_url,
            publication_year: book.publication_year,
            language: book.language,
            pages: book.pages,
            created_at: now,
            updated_at: now,
        };
        books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Book> {
        self.books
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("book", id))
    }

    async fn list(&self, query: &CatalogQuery) -> StoreResult<CatalogPage> {
        let books = self.books.read().await;
        Ok(filter_catalog(books.values().cloned().collect(), query))
    }

    async fn update(&self, id: Uuid, patch: BookPatch) -> StoreResult<Book> {
        let mut books = self.books.write().await;

        if let Some(isbn) = &patch.isbn {
            if books
                .values()
                .any(|existing| existing.id != id && &existing.isbn == isbn)
            {
                return Err(StoreError::Conflict(format!("isbn {} already exists", isbn)));
            }
        }

        let book = books
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("book", id))?;

        if let Some(title) = patch.title {
            book.title = title;
        }
        if let Some(author) = patch.author {
            book.author = author;
        }
        if let Some(isbn) = patch.isbn {
            book.isbn = isbn;
        }
        if let Some(description) = patch.description {
            book.description = description;
        }
        if let Some(genre) = patch.genre {
            book.genre = genre;
        }
        if let Some(publisher) = patch.publisher {
            book.publisher = publisher;
        }
        if let Some(price) = patch.price {
            book.price = price;
        }
        if let Some(stock) = patch.stock {
            book.stock = stock;
        }
        if let Some(image_url) = patch.image_url {
            book.image_url = image_url;
        }
        if let Some(publication_year) = patch.publication_year {
            book.publication_year = publication_year;
        }
        if let Some(language) = patch.language {
            book.language = language;
        }
        if let Some(pages) = patch.pages {
            book.pages = pages;
        }
        book.updated_at = Utc::now();

        Ok(book.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Book> {
        self.books
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("book", id))
    }

    async fn decrement_stock(&self, id: Uuid, amount: u32) -> StoreResult<Book> {
        let mut books = self.books.write().await;
        let book = books
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("book", id))?;

        if book.stock < amount {
            return Err(StoreError::InsufficientStock {
                book_id: book.id,
                title: book.title.clone(),
                requested: amount,
                available: book.stock,
            });
        }

        book.stock -= amount;
        book.updated_at = Utc::now();
        Ok(book.clone())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place(&self, draft: OrderDraft) -> StoreResult<Order> {
        // The write guard is held for the whole commit; placements
        // touching the same books cannot interleave.
        let mut books = self.books.write().await;

        // Re-check every line against a staged view before mutating
        // anything, so a failing line leaves earlier lines untouched.
        let mut staged: HashMap<Uuid, u32> = HashMap::new();
        for item in &draft.items {
            let book = books
                .get(&item.book_id)
                .ok_or_else(|| StoreError::not_found("book", item.book_id))?;
            let available = *staged.get(&item.book_id).unwrap_or(&book.stock);

            if available < item.quantity {
                return Err(StoreError::InsufficientStock {
                    book_id: book.id,
                    title: book.title.clone(),
                    requested: item.quantity,
                    available,
                });
            }
            staged.insert(item.book_id, available - item.quantity);
        }

        let now = Utc::now();
        for (book_id, stock) in staged {
            if let Some(book) = books.get_mut(&book_id) {
                book.stock = stock;
                book.updated_at = now;
            }
        }

        let order = Order {
            id: Uuid::new_v4(),
            buyer_id: draft.buyer_id,
            items: draft.items,
            total_amount: draft.total_amount,
            status: OrderStatus::Pending,
            shipping_address: draft.shipping_address,
            created_at: now,
            updated_at: now,
        };
        self.orders.write().await.insert(order.id, order.clone());

        Ok(order)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Order> {
        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|order| {
                filter
                    .buyer_id
                    .map_or(true, |buyer| order.buyer_id == buyer)
            })
            .filter(|order| {
                filter.seller_id.map_or(true, |seller| {
                    order.items.iter().any(|item| item.seller_id == seller)
                })
            })
            .filter(|order| filter.status.map_or(true, |status| order.status == status))
            .cloned()
            .collect();

        // Newest first, matching the persistent store's ordering
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("order", id))?;

        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }

        let now = Utc::now();
        let status = match user.role {
            UserRole::Seller => UserStatus::Pending,
            _ => UserStatus::Active,
        };
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password: user.password,
            name: user.name,
            role: user.role,
            status,
            company_name: user.company_name,
            company_verified: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> StoreResult<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("user", id))?;

        user.status = status;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create(&self, review: NewReview) -> StoreResult<Review> {
        let created = Review {
            id: Uuid::new_v4(),
            book_id: review.book_id,
            buyer_id: review.buyer_id,
            seller_id: review.seller_id,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        self.reviews
            .write()
            .await
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_for_book(&self, book_id: Uuid) -> StoreResult<Vec<Review>> {
        Ok(collect_reviews(&self.reviews, |review| review.book_id == book_id).await)
    }

    async fn list_for_seller(&self, seller_id: Uuid) -> StoreResult<Vec<Review>> {
        Ok(collect_reviews(&self.reviews, |review| review.seller_id == seller_id).await)
    }
}

async fn collect_reviews<F>(reviews: &RwLock<HashMap<Uuid, Review>>, pred: F) -> Vec<Review>
where
    F: Fn(&Review) -> bool,
{
    let mut matched: Vec<Review> = reviews
        .read()
        .await
        .values()
        .filter(|review| pred(review))
        .cloned()
        .collect();
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matched
}

/// Apply catalog query semantics to a full snapshot of the book table:
/// base set from search (title/author substring) or genre, conjunctive
/// narrowing filters, stable sort, then offset/limit pagination.
fn filter_catalog(books: Vec<Book>, query: &CatalogQuery) -> CatalogPage {
    let mut matched: Vec<Book> = if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        books
            .into_iter()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
            })
            .collect()
    } else if let Some(genre) = &query.genre {
        books.into_iter().filter(|book| &book.genre == genre).collect()
    } else {
        books
    };

    if let Some(author) = &query.author {
        let needle = author.to_lowercase();
        matched.retain(|book| book.author.to_lowercase().contains(&needle));
    }
    if let Some(publisher) = &query.publisher {
        let needle = publisher.to_lowercase();
        matched.retain(|book| book.publisher.to_lowercase().contains(&needle));
    }
    if let Some(seller_id) = query.seller_id {
        matched.retain(|book| book.seller_id == seller_id);
    }
    if let Some(min_price) = query.min_price {
        matched.retain(|book| book.price >= min_price);
    }
    if let Some(max_price) = query.max_price {
        matched.retain(|book| book.price <= max_price);
    }

    match query.sort_by {
        Some(sort_by) => {
            matched.sort_by(|a, b| {
                let ordering = match sort_by {
                    SortBy::Price => a.price.cmp(&b.price),
                    SortBy::Title => a.title.cmp(&b.title),
                    SortBy::Date => a.created_at.cmp(&b.created_at),
                };
                match query.sort_order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }
        // No explicit sort: search and genre listings read best by
        // title, everything else newest first.
        None if query.search.is_some() || query.genre.is_some() => {
            matched.sort_by(|a, b| a.title.cmp(&b.title));
        }
        None => {
            matched.sort_by(|a, b| match b.created_at.cmp(&a.created_at) {
                Ordering::Equal => a.id.cmp(&b.id),
                other => other,
            });
        }
    }

    let total = matched.len();
    let books = matched
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();

    CatalogPage { books, total }
}
