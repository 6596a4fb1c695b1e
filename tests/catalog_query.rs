use std::sync::Arc;

use rust_decimal_macros::dec;
use uuid::Uuid;

use bookmarket::application::usecase::{CatalogService, CatalogUseCase};
use bookmarket::domain::errors::{AppError, StoreError};
use bookmarket::domain::repository::{CatalogQuery, NewBook, SortBy, SortOrder};
use bookmarket::infrastructure::MemoryStore;

fn catalog() -> CatalogService {
    CatalogService::new(Arc::new(MemoryStore::new()))
}

struct BookRow<'a> {
    title: &'a str,
    author: &'a str,
    genre: &'a str,
    publisher: &'a str,
    isbn: &'a str,
    price: rust_decimal::Decimal,
}

async fn seed(catalog: &CatalogService, rows: &[BookRow<'_>]) {
    for row in rows {
        catalog
            .create_book(NewBook {
                seller_id: Uuid::new_v4(),
                title: row.title.to_string(),
                author: row.author.to_string(),
                isbn: row.isbn.to_string(),
                description: String::new(),
                genre: row.genre.to_string(),
                publisher: row.publisher.to_string(),
                price: row.price,
                stock: 10,
                image_url: "https://example.com/cover.jpg".to_string(),
                publication_year: 2000,
                language: "en".to_string(),
                pages: 320,
            })
            .await
            .unwrap();
    }
}

fn shelf() -> Vec<BookRow<'static>> {
    vec![
        BookRow {
            title: "The Hobbit",
            author: "J.R.R. Tolkien",
            genre: "Fantasy",
            publisher: "HarperCollins",
            isbn: "9780000000101",
            price: dec!(12.00),
        },
        BookRow {
            title: "The Silmarillion",
            author: "J.R.R. Tolkien",
            genre: "Fantasy",
            publisher: "HarperCollins",
            isbn: "9780000000102",
            price: dec!(25.00),
        },
        BookRow {
            title: "Tolkien: A Biography",
            author: "Humphrey Carpenter",
            genre: "Biography",
            publisher: "Allen & Unwin",
            isbn: "9780000000103",
            price: dec!(18.00),
        },
        BookRow {
            title: "Dune",
            author: "Frank Herbert",
            genre: "Science Fiction",
            publisher: "Ace Books",
            isbn: "9780000000104",
            price: dec!(15.00),
        },
    ]
}

#[tokio::test]
async fn search_matches_title_or_author_case_insensitively() {
    let catalog = catalog();
    seed(&catalog, &shelf()).await;

    let page = catalog
        .list_books(CatalogQuery {
            search: Some("tolkien".to_string()),
            ..CatalogQuery::default()
        })
        .await
        .unwrap();

    // Two by author, one by title
    assert_eq!(page.total, 3);
    assert!(page
        .books
        .iter()
        .all(|book| book.title.to_lowercase().contains("tolkien")
            || book.author.to_lowercase().contains("tolkien")));
}

#[tokio::test]
async fn search_combines_with_price_bounds() {
    let catalog = catalog();
    seed(&catalog, &shelf()).await;

    let page = catalog
        .list_books(CatalogQuery {
            search: Some("tolkien".to_string()),
            min_price: Some(dec!(12.00)),
            max_price: Some(dec!(18.00)),
            ..CatalogQuery::default()
        })
        .await
        .unwrap();

    // Bounds are inclusive: 12.00 and 18.00 stay, 25.00 goes
    assert_eq!(page.total, 2);
    assert!(page.books.iter().all(|book| book.price >= dec!(12.00)
        && book.price <= dec!(18.00)));
}

#[tokio::test]
async fn search_takes_precedence_over_genre() {
    let catalog = catalog();
    seed(&catalog, &shelf()).await;

    // With search present the genre filter does not constrain the base
    // set, so the Biography title still matches.
    let page = catalog
        .list_books(CatalogQuery {
            search: Some("tolkien".to_string()),
            genre: Some("Fantasy".to_string()),
            ..CatalogQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);

    let genre_only = catalog
        .list_books(CatalogQuery {
            genre: Some("Fantasy".to_string()),
            ..CatalogQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(genre_only.total, 2);
}

#[tokio::test]
async fn author_and_publisher_filters_are_conjunctive_substrings() {
    let catalog = catalog();
    seed(&catalog, &shelf()).await;

    let page = catalog
        .list_books(CatalogQuery {
            author: Some("tolkien".to_string()),
            publisher: Some("harper".to_string()),
            ..CatalogQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert!(page.books.iter().all(|book| book.publisher == "HarperCollins"));
}

#[tokio::test]
async fn sort_by_price_descending() {
    let catalog = catalog();
    seed(&catalog, &shelf()).await;

    let page = catalog
        .list_books(CatalogQuery {
            sort_by: Some(SortBy::Price),
            sort_order: SortOrder::Desc,
            ..CatalogQuery::default()
        })
        .await
        .unwrap();

    let prices: Vec<_> = page.books.iter().map(|book| book.price).collect();
    assert_eq!(prices, vec![dec!(25.00), dec!(18.00), dec!(15.00), dec!(12.00)]);
}

#[tokio::test]
async fn pagination_reports_total_before_slicing() {
    let catalog = catalog();
    seed(&catalog, &shelf()).await;

    let page = catalog
        .list_books(CatalogQuery {
            sort_by: Some(SortBy::Title),
            limit: 2,
            offset: 2,
            ..CatalogQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 4);
    assert_eq!(page.books.len(), 2);

    // Sorted by title ascending, the last page holds the tail
    let titles: Vec<_> = page.books.iter().map(|book| book.title.as_str()).collect();
    assert_eq!(titles, vec!["The Silmarillion", "Tolkien: A Biography"]);
}

#[tokio::test]
async fn create_rejects_short_isbn_and_duplicate_isbn() {
    let catalog = catalog();
    seed(&catalog, &shelf()).await;

    let mut short = shelf().remove(0);
    short.isbn = "123";
    let err = seed_one(&catalog, short).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let duplicate = shelf().remove(0);
    let err = seed_one(&catalog, duplicate).await.unwrap_err();
    assert!(matches!(err, AppError::Store(StoreError::Conflict(_))));
}

async fn seed_one(catalog: &CatalogService, row: BookRow<'_>) -> Result<(), AppError> {
    catalog
        .create_book(NewBook {
            seller_id: Uuid::new_v4(),
            title: row.title.to_string(),
            author: row.author.to_string(),
            isbn: row.isbn.to_string(),
            description: String::new(),
            genre: row.genre.to_string(),
            publisher: row.publisher.to_string(),
            price: row.price,
            stock: 10,
            image_url: "https://example.com/cover.jpg".to_string(),
            publication_year: 2000,
            language: "en".to_string(),
            pages: 320,
        })
        .await?;
    Ok(())
}
