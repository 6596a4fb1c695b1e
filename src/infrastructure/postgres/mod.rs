// src/infrastructure/postgres/mod.rs
// Postgres-backed store. Order placement runs in a single transaction:
// guarded stock decrements plus the order/line-item inserts commit
// together or not at all, and the conditional UPDATE serializes
// check-and-decrement per book row.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::{QueryBuilder, Row};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::errors::{AppError, AppResult, StoreError, StoreResult};
use crate::domain::model::{
    Address, Book, Order, OrderDraft, OrderItem, OrderStatus, Review, User, UserRole, UserStatus,
};
use crate::domain::repository::{
    BookPatch, BookRepository, CatalogPage, CatalogQuery, NewBook, NewReview, NewUser,
    OrderFilter, OrderRepository, ReviewRepository, SortBy, SortOrder, UserRepository,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    name TEXT NOT NULL,
    role TEXT NOT NULL,
    status TEXT NOT NULL,
    company_name TEXT,
    company_verified BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS books (
    id UUID PRIMARY KEY,
    seller_id UUID NOT NULL,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    isbn TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    genre TEXT NOT NULL DEFAULT '',
    publisher TEXT NOT NULL DEFAULT '',
    price NUMERIC NOT NULL CHECK (price >= 0),
    stock INTEGER NOT NULL CHECK (stock >= 0),
    image_url TEXT NOT NULL DEFAULT '',
    publication_year INTEGER NOT NULL DEFAULT 0,
    language TEXT NOT NULL DEFAULT '',
    pages INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    buyer_id UUID NOT NULL,
    total_amount NUMERIC NOT NULL,
    status TEXT NOT NULL,
    street TEXT NOT NULL,
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    postal_code TEXT NOT NULL,
    country TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS order_items (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    book_id UUID NOT NULL,
    seller_id UUID NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    price NUMERIC NOT NULL
);

CREATE TABLE IF NOT EXISTS reviews (
    id UUID PRIMARY KEY,
    book_id UUID NOT NULL,
    buyer_id UUID NOT NULL,
    seller_id UUID NOT NULL,
    rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

const BOOK_COLUMNS: &str = "id, seller_id, title, author, isbn, description, genre, publisher, \
                            price, stock, image_url, publication_year, language, pages, \
                            created_at, updated_at";

const ORDER_COLUMNS: &str = "id, buyer_id, total_amount, status, street, city, state, \
                             postal_code, country, created_at, updated_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the tables exist.
    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Config(format!("Failed to connect to Postgres: {}", e)))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_schema(&self) -> AppResult<()> {
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Config(format!("Failed to apply schema: {}", e)))?;
        }
        Ok(())
    }

    /// Fetch the line items for a set of orders in one round trip.
    async fn items_for(&self, order_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<OrderItem>>> {
        let rows = sqlx::query(
            "SELECT order_id, book_id, seller_id, quantity, price FROM order_items \
             WHERE order_id = ANY($1) ORDER BY order_id",
        )
        .bind(order_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id: Uuid = row.try_get("order_id").map_err(internal)?;
            grouped
                .entry(order_id)
                .or_default()
                .push(order_item_from_row(&row).map_err(internal)?);
        }
        Ok(grouped)
    }
}

fn internal(err: sqlx::Error) -> StoreError {
    StoreError::Internal(err.to_string())
}

fn map_insert_err(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("{} already exists", what))
        }
        _ => internal(err),
    }
}

fn book_from_row(row: &PgRow) -> Result<Book, sqlx::Error> {
    Ok(Book {
        id: row.try_get("id")?,
        seller_id: row.try_get("seller_id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        isbn: row.try_get("isbn")?,
        description: row.try_get("description")?,
        genre: row.try_get("genre")?,
        publisher: row.try_get("publisher")?,
        price: row.try_get("price")?,
        stock: row.try_get::<i32, _>("stock")? as u32,
        image_url: row.try_get("image_url")?,
        publication_year: row.try_get("publication_year")?,
        language: row.try_get("language")?,
        pages: row.try_get::<i32, _>("pages")? as u32,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_item_from_row(row: &PgRow) -> Result<OrderItem, sqlx::Error> {
    Ok(OrderItem {
        book_id: row.try_get("book_id")?,
        seller_id: row.try_get("seller_id")?,
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        price: row.try_get("price")?,
    })
}

fn order_from_row(row: &PgRow, items: Vec<OrderItem>) -> StoreResult<Order> {
    let status: String = row.try_get("status").map_err(internal)?;
    Ok(Order {
        id: row.try_get("id").map_err(internal)?,
        buyer_id: row.try_get("buyer_id").map_err(internal)?,
        items,
        total_amount: row.try_get("total_amount").map_err(internal)?,
        status: OrderStatus::from_str(&status).map_err(StoreError::Internal)?,
        shipping_address: Address {
            street: row.try_get("street").map_err(internal)?,
            city: row.try_get("city").map_err(internal)?,
            state: row.try_get("state").map_err(internal)?,
            postal_code: row.try_get("postal_code").map_err(internal)?,
            country: row.try_get("country").map_err(internal)?,
        },
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
    })
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = row.try_get("role").map_err(internal)?;
    let status: String = row.try_get("status").map_err(internal)?;
    Ok(User {
        id: row.try_get("id").map_err(internal)?,
        email: row.try_get("email").map_err(internal)?,
        password: row.try_get("password").map_err(internal)?,
        name: row.try_get("name").map_err(internal)?,
        role: match role.as_str() {
            "buyer" => UserRole::Buyer,
            "seller" => UserRole::Seller,
            "admin" => UserRole::Admin,
            other => return Err(StoreError::Internal(format!("unknown role: {}", other))),
        },
        status: match status.as_str() {
            "active" => UserStatus::Active,
            "pending" => UserStatus::Pending,
            "suspended" => UserStatus::Suspended,
            other => return Err(StoreError::Internal(format!("unknown status: {}", other))),
        },
        company_name: row.try_get("company_name").map_err(internal)?,
        company_verified: row.try_get("company_verified").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
    })
}

fn review_from_row(row: &PgRow) -> Result<Review, sqlx::Error> {
    Ok(Review {
        id: row.try_get("id")?,
        book_id: row.try_get("book_id")?,
        buyer_id: row.try_get("buyer_id")?,
        seller_id: row.try_get("seller_id")?,
        rating: row.try_get::<i16, _>("rating")? as u8,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Append the catalog filter conditions shared by the page and count
/// queries. Search takes precedence over genre as the base set.
fn push_catalog_filters(qb: &mut QueryBuilder<Postgres>, query: &CatalogQuery) {
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR author ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    } else if let Some(genre) = &query.genre {
        qb.push(" AND genre = ");
        qb.push_bind(genre.clone());
    }

    if let Some(author) = &query.author {
        qb.push(" AND author ILIKE ");
        qb.push_bind(format!("%{}%", author));
    }
    if let Some(publisher) = &query.publisher {
        qb.push(" AND publisher ILIKE ");
        qb.push_bind(format!("%{}%", publisher));
    }
    if let Some(seller_id) = query.seller_id {
        qb.push(" AND seller_id = ");
        qb.push_bind(seller_id);
    }
    if let Some(min_price) = query.min_price {
        qb.push(" AND price >= ");
        qb.push_bind(min_price);
    }
    if let Some(max_price) = query.max_price {
        qb.push(" AND price <= ");
        qb.push_bind(max_price);
    }
}

fn order_by_clause(query: &CatalogQuery) -> &'static str {
    let direction_asc = query.sort_order == SortOrder::Asc;
    match query.sort_by {
        Some(SortBy::Price) => {
            if direction_asc {
                " ORDER BY price ASC, id ASC"
            } else {
                " ORDER BY price DESC, id ASC"
            }
        }
        Some(SortBy::Title) => {
            if direction_asc {
                " ORDER BY title ASC, id ASC"
            } else {
                " ORDER BY title DESC, id ASC"
            }
        }
        Some(SortBy::Date) => {
            if direction_asc {
                " ORDER BY created_at ASC, id ASC"
            } else {
                " ORDER BY created_at DESC, id ASC"
            }
        }
        // Default ordering mirrors the in-memory store
        None if query.search.is_some() || query.genre.is_some() => " ORDER BY title ASC, id ASC",
        None => " ORDER BY created_at DESC, id ASC",
    }
}

#[async_trait]
impl BookRepository for PgStore {
    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            "INSERT INTO books (id, seller_id, title, author, isbn, description, genre, \
             publisher, price, stock, image_url, publication_year, language, pages) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(book.seller_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(&book.genre)
        .bind(&book.publisher)
        .bind(book.price)
        .bind(book.stock as i32)
        .bind(&book.image_url)
        .bind(book.publication_year)
        .bind(&book.language)
        .bind(book.pages as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "isbn"))?;

        book_from_row(&row).map_err(internal)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Book> {
        let row = sqlx::query(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or_else(|| StoreError::not_found("book", id))?;

        book_from_row(&row).map_err(internal)
    }

    async fn list(&self, query: &CatalogQuery) -> StoreResult<CatalogPage> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM books WHERE TRUE");
        push_catalog_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?
            .try_get("total")
            .map_err(internal)?;

        let mut page_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM books WHERE TRUE",
            BOOK_COLUMNS
        ));
        push_catalog_filters(&mut page_qb, query);
        page_qb.push(order_by_clause(query));
        page_qb.push(" LIMIT ");
        page_qb.push_bind(query.limit as i64);
        page_qb.push(" OFFSET ");
        page_qb.push_bind(query.offset as i64);

        let rows = page_qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;

        let books = rows
            .iter()
            .map(book_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(CatalogPage {
            books,
            total: total as usize,
        })
    }

    async fn update(&self, id: Uuid, patch: BookPatch) -> StoreResult<Book> {
        let row = sqlx::query(&format!(
            "UPDATE books SET \
             title = COALESCE($2, title), \
             author = COALESCE($3, author), \
             isbn = COALESCE($4, isbn), \
             description = COALESCE($5, description), \
             genre = COALESCE($6, genre), \
             publisher = COALESCE($7, publisher), \
             price = COALESCE($8, price), \
             stock = COALESCE($9, stock), \
             image_url = COALESCE($10, image_url), \
             publication_year = COALESCE($11, publication_year), \
             language = COALESCE($12, language), \
             pages = COALESCE($13, pages), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.author)
        .bind(patch.isbn)
        .bind(patch.description)
        .bind(patch.genre)
        .bind(patch.publisher)
        .bind(patch.price)
        .bind(patch.stock.map(|s| s as i32))
        .bind(patch.image_url)
        .bind(patch.publication_year)
        .bind(patch.language)
        .bind(patch.pages.map(|p| p as i32))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "isbn"))?
        .ok_or_else(|| StoreError::not_found("book", id))?;

        book_from_row(&row).map_err(internal)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Book> {
        let row = sqlx::query(&format!(
            "DELETE FROM books WHERE id = $1 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?
        .ok_or_else(|| StoreError::not_found("book", id))?;

        book_from_row(&row).map_err(internal)
    }

    async fn decrement_stock(&self, id: Uuid, amount: u32) -> StoreResult<Book> {
        let row = sqlx::query(&format!(
            "UPDATE books SET stock = stock - $2, updated_at = NOW() \
             WHERE id = $1 AND stock >= $2 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(amount as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        match row {
            Some(row) => book_from_row(&row).map_err(internal),
            // No row matched: gone, or not enough stock
            None => {
                let current = sqlx::query("SELECT title, stock FROM books WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(internal)?;
                match current {
                    Some(row) => Err(StoreError::InsufficientStock {
                        book_id: id,
                        title: row.try_get("title").map_err(internal)?,
                        requested: amount,
                        available: row.try_get::<i32, _>("stock").map_err(internal)? as u32,
                    }),
                    None => Err(StoreError::not_found("book", id)),
                }
            }
        }
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn place(&self, draft: OrderDraft) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        // Guarded per-line decrement; a line that cannot be satisfied
        // aborts the transaction, rolling back every earlier decrement.
        for item in &draft.items {
            let updated = sqlx::query(
                "UPDATE books SET stock = stock - $2, updated_at = NOW() \
                 WHERE id = $1 AND stock >= $2",
            )
            .bind(item.book_id)
            .bind(item.quantity as i32)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;

            if updated.rows_affected() == 0 {
                let current = sqlx::query("SELECT title, stock FROM books WHERE id = $1")
                    .bind(item.book_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(internal)?;
                let err = match current {
                    Some(row) => StoreError::InsufficientStock {
                        book_id: item.book_id,
                        title: row.try_get("title").map_err(internal)?,
                        requested: item.quantity,
                        available: row.try_get::<i32, _>("stock").map_err(internal)? as u32,
                    },
                    None => StoreError::not_found("book", item.book_id),
                };
                tx.rollback().await.map_err(internal)?;
                return Err(err);
            }
        }

        let order_id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            "INSERT INTO orders (id, buyer_id, total_amount, status, street, city, state, \
             postal_code, country) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(draft.buyer_id)
        .bind(draft.total_amount)
        .bind(OrderStatus::Pending.as_str())
        .bind(&draft.shipping_address.street)
        .bind(&draft.shipping_address.city)
        .bind(&draft.shipping_address.state)
        .bind(&draft.shipping_address.postal_code)
        .bind(&draft.shipping_address.country)
        .fetch_one(&mut *tx)
        .await
        .map_err(internal)?;

        for item in &draft.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, book_id, seller_id, quantity, price) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(item.book_id)
            .bind(item.seller_id)
            .bind(item.quantity as i32)
            .bind(item.price)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        }

        tx.commit().await.map_err(internal)?;

        order_from_row(&row, draft.items)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Order> {
        let row = sqlx::query(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or_else(|| StoreError::not_found("order", id))?;

        let mut items = self.items_for(&[id]).await?;
        order_from_row(&row, items.remove(&id).unwrap_or_default())
    }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM orders WHERE TRUE",
            ORDER_COLUMNS
        ));
        if let Some(buyer_id) = filter.buyer_id {
            qb.push(" AND buyer_id = ");
            qb.push_bind(buyer_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ");
            qb.push_bind(status.as_str());
        }
        if let Some(seller_id) = filter.seller_id {
            qb.push(
                " AND EXISTS (SELECT 1 FROM order_items oi \
                 WHERE oi.order_id = orders.id AND oi.seller_id = ",
            );
            qb.push_bind(seller_id);
            qb.push(")");
        }
        qb.push(" ORDER BY created_at DESC, id ASC");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(internal)?;

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<Result<_, _>>()
            .map_err(internal)?;
        let mut items = self.items_for(&ids).await?;

        rows.iter()
            .zip(ids)
            .map(|(row, id)| order_from_row(row, items.remove(&id).unwrap_or_default()))
            .collect()
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Order> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?
        .ok_or_else(|| StoreError::not_found("order", id))?;

        let mut items = self.items_for(&[id]).await?;
        order_from_row(&row, items.remove(&id).unwrap_or_default())
    }
}

const USER_COLUMNS: &str = "id, email, password, name, role, status, company_name, \
                            company_verified, created_at, updated_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let status = match user.role {
            UserRole::Seller => "pending",
            _ => "active",
        };
        let row = sqlx::query(&format!(
            "INSERT INTO users (id, email, password, name, role, status, company_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(user.role.to_string())
        .bind(status)
        .bind(&user.company_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "email"))?;

        user_from_row(&row)
    }

    async fn get(&self, id: Uuid) -> StoreResult<User> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or_else(|| StoreError::not_found("user", id))?;

        user_from_row(&row)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> StoreResult<User> {
        let status = match status {
            UserStatus::Active => "active",
            UserStatus::Pending => "pending",
            UserStatus::Suspended => "suspended",
        };
        let row = sqlx::query(&format!(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?
        .ok_or_else(|| StoreError::not_found("user", id))?;

        user_from_row(&row)
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn create(&self, review: NewReview) -> StoreResult<Review> {
        let row = sqlx::query(
            "INSERT INTO reviews (id, book_id, buyer_id, seller_id, rating, comment) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, book_id, buyer_id, seller_id, rating, comment, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(review.book_id)
        .bind(review.buyer_id)
        .bind(review.seller_id)
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;

        review_from_row(&row).map_err(internal)
    }

    async fn list_for_book(&self, book_id: Uuid) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query(
            "SELECT id, book_id, buyer_id, seller_id, rating, comment, created_at \
             FROM reviews WHERE book_id = $1 ORDER BY created_at DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        rows.iter()
            .map(review_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)
    }

    async fn list_for_seller(&self, seller_id: Uuid) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query(
            "SELECT id, book_id, buyer_id, seller_id, rating, comment, created_at \
             FROM reviews WHERE seller_id = $1 ORDER BY created_at DESC",
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        rows.iter()
            .map(review_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)
    }
}
