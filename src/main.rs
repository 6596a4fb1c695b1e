// src/main.rs
// Wiring binary: builds the configured store, the usecases on top of it,
// and runs a short smoke flow through the marketplace.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use bookmarket::application::dto::{OrderLineRequest, PlaceOrderRequest, RegisterRequest};
use bookmarket::application::usecase::{
    AccountService, AccountUseCase, CatalogService, CatalogUseCase, OrderManagementUseCase,
    OrderService, ReviewService, ReviewUseCase,
};
use bookmarket::config::Config;
use bookmarket::domain::errors::{AppError, AppResult};
use bookmarket::domain::model::{Address, OrderStatus, UserRole};
use bookmarket::domain::repository::{
    BookRepository, CatalogQuery, NewBook, OrderFilter, OrderRepository, ReviewRepository,
    UserRepository,
};
use bookmarket::infrastructure::{MemoryStore, PgStore};

struct Repositories {
    books: Arc<dyn BookRepository>,
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl Repositories {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: BookRepository + OrderRepository + UserRepository + ReviewRepository + 'static,
    {
        Self {
            books: store.clone(),
            orders: store.clone(),
            users: store.clone(),
            reviews: store,
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting bookmarket v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using {} storage backend", config.storage.backend);

    let repos = build_repositories(&config).await?;

    let catalog = CatalogService::new(repos.books.clone());
    let orders = OrderService::new(repos.books.clone(), repos.orders.clone());
    let accounts = AccountService::new(repos.users.clone());
    let reviews = ReviewService::new(repos.books.clone(), repos.reviews.clone());

    if config.storage.backend == "memory" && config.storage.seed_demo_data {
        let seller_id = Uuid::new_v4();
        seed_demo_catalog(&catalog, seller_id).await?;

        let buyer = accounts
            .register(RegisterRequest {
                email: "buyer@example.com".to_string(),
                password: "secret123".to_string(),
                name: "Demo Buyer".to_string(),
                role: UserRole::Buyer,
                company_name: None,
            })
            .await?;

        let page = catalog
            .list_books(CatalogQuery {
                search: Some("tolkien".to_string()),
                ..CatalogQuery::default()
            })
            .await?;
        log::info!("Catalog search for \"tolkien\": {} match(es)", page.total);

        let first = page
            .books
            .first()
            .ok_or_else(|| AppError::Config("demo catalog seeded empty".to_string()))?;

        let order = orders
            .place_order(PlaceOrderRequest {
                buyer_id: buyer.id,
                items: vec![OrderLineRequest {
                    book_id: first.id,
                    quantity: 2,
                }],
                shipping_address: Address {
                    street: "221B Baker Street".to_string(),
                    city: "London".to_string(),
                    state: "Greater London".to_string(),
                    postal_code: "NW1 6XE".to_string(),
                    country: "UK".to_string(),
                },
            })
            .await?;

        orders
            .update_status(order.id, OrderStatus::Processing)
            .await?;

        reviews
            .create_review(first.id, buyer.id, 5, "Arrived quickly, great print".to_string())
            .await?;
        let rating = reviews.seller_rating(first.seller_id).await?;
        log::info!(
            "Seller {} rating: {} ({} review(s))",
            rating.seller_id,
            rating.average_rating,
            rating.total_reviews
        );

        let placed = orders
            .list_orders(OrderFilter {
                buyer_id: Some(buyer.id),
                ..OrderFilter::default()
            })
            .await?;
        log::info!("Buyer {} now has {} order(s)", buyer.id, placed.len());

        let stats = orders.order_stats().await?;
        log::info!(
            "Order stats: {} order(s), status counts {:?}",
            stats.total_orders,
            stats.status_counts
        );
    }

    log::info!("Done");
    Ok(())
}

/// Build the repository set for the configured backend
async fn build_repositories(config: &Config) -> AppResult<Repositories> {
    match config.storage.backend.as_str() {
        "memory" => Ok(Repositories::from_store(Arc::new(MemoryStore::new()))),
        "postgres" => {
            let url = config.storage.database_url.as_deref().ok_or_else(|| {
                AppError::Config("postgres backend requires DATABASE_URL".to_string())
            })?;
            let store = PgStore::connect(url, config.storage.max_connections).await?;
            Ok(Repositories::from_store(Arc::new(store)))
        }
        other => Err(AppError::Config(format!(
            "Unsupported storage backend: {}",
            other
        ))),
    }
}

async fn seed_demo_catalog(catalog: &CatalogService, seller_id: Uuid) -> AppResult<()> {
    let titles = [
        ("The Hobbit", "J.R.R. Tolkien", "9780261102217", "Fantasy", Decimal::new(1250, 2), 12),
        ("The Fellowship of the Ring", "J.R.R. Tolkien", "9780261103573", "Fantasy", Decimal::new(1499, 2), 8),
        ("Dune", "Frank Herbert", "9780441172719", "Science Fiction", Decimal::new(1099, 2), 15),
    ];

    for (title, author, isbn, genre, price, stock) in titles {
        catalog
            .create_book(NewBook {
                seller_id,
                title: title.to_string(),
                author: author.to_string(),
                isbn: isbn.to_string(),
                description: String::new(),
                genre: genre.to_string(),
                publisher: "Demo Press".to_string(),
                price,
                stock,
                image_url: "https://example.com/cover.jpg".to_string(),
                publication_year: 1965,
                language: "en".to_string(),
                pages: 400,
            })
            .await?;
    }

    log::info!("Seeded demo catalog with {} book(s)", titles.len());
    Ok(())
}
