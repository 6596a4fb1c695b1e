// src/application/usecase/review_usecase.rs
// Book reviews and seller ratings

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::application::dto::SellerRating;
use crate::domain::errors::{AppError, AppResult};
use crate::domain::model::Review;
use crate::domain::repository::{BookRepository, NewReview, ReviewRepository};

#[async_trait]
pub trait ReviewUseCase {
    /// Leave a review on a book; the seller is resolved from the book.
    async fn create_review(
        &self,
        book_id: Uuid,
        buyer_id: Uuid,
        rating: u8,
        comment: String,
    ) -> AppResult<Review>;

    async fn reviews_for_book(&self, book_id: Uuid) -> AppResult<Vec<Review>>;

    async fn reviews_for_seller(&self, seller_id: Uuid) -> AppResult<Vec<Review>>;

    async fn seller_rating(&self, seller_id: Uuid) -> AppResult<SellerRating>;
}

pub struct ReviewService {
    books: Arc<dyn BookRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    pub fn new(books: Arc<dyn BookRepository>, reviews: Arc<dyn ReviewRepository>) -> Self {
        Self { books, reviews }
    }
}

#[async_trait]
impl ReviewUseCase for ReviewService {
    async fn create_review(
        &self,
        book_id: Uuid,
        buyer_id: Uuid,
        rating: u8,
        comment: String,
    ) -> AppResult<Review> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation("rating must be between 1 and 5".into()));
        }

        let book = self.books.get(book_id).await?;

        let review = self
            .reviews
            .create(NewReview {
                book_id,
                buyer_id,
                seller_id: book.seller_id,
                rating,
                comment,
            })
            .await?;

        Ok(review)
    }

    async fn reviews_for_book(&self, book_id: Uuid) -> AppResult<Vec<Review>> {
        Ok(self.reviews.list_for_book(book_id).await?)
    }

    async fn reviews_for_seller(&self, seller_id: Uuid) -> AppResult<Vec<Review>> {
        Ok(self.reviews.list_for_seller(seller_id).await?)
    }

    async fn seller_rating(&self, seller_id: Uuid) -> AppResult<SellerRating> {
        let reviews = self.reviews.list_for_seller(seller_id).await?;
        let total_reviews = reviews.len();

        let average_rating = if total_reviews > 0 {
            let sum: u32 = reviews.iter().map(|review| u32::from(review.rating)).sum();
            (Decimal::from(sum) / Decimal::from(total_reviews as u64)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(SellerRating {
            seller_id,
            average_rating,
            total_reviews,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::StoreError;
    use crate::domain::repository::NewBook;
    use crate::infrastructure::MemoryStore;
    use rust_decimal_macros::dec;

    async fn seeded() -> (ReviewService, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let seller_id = Uuid::new_v4();
        let books: Arc<dyn BookRepository> = store.clone();
        let book = books
            .create(NewBook {
                seller_id,
                title: "Reviewed Book".to_string(),
                author: "Somebody".to_string(),
                isbn: "9780000000001".to_string(),
                description: String::new(),
                genre: "Fiction".to_string(),
                publisher: "Acme Press".to_string(),
                price: dec!(10.00),
                stock: 5,
                image_url: "https://example.com/cover.jpg".to_string(),
                publication_year: 2020,
                language: "en".to_string(),
                pages: 300,
            })
            .await
            .unwrap();
        (ReviewService::new(books, store), book.id, seller_id)
    }

    #[tokio::test]
    async fn rating_out_of_bounds_is_rejected() {
        let (service, book_id, _) = seeded().await;
        let err = service
            .create_review(book_id, Uuid::new_v4(), 0, "bad".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .create_review(book_id, Uuid::new_v4(), 6, "too good".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn review_on_unknown_book_is_not_found() {
        let (service, _, _) = seeded().await;
        let err = service
            .create_review(Uuid::new_v4(), Uuid::new_v4(), 4, "ok".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Store(StoreError::NotFound { entity: "book", .. })
        ));
    }

    #[tokio::test]
    async fn seller_rating_averages_across_reviews() {
        let (service, book_id, seller_id) = seeded().await;
        for rating in [5, 4, 4] {
            service
                .create_review(book_id, Uuid::new_v4(), rating, "fine".to_string())
                .await
                .unwrap();
        }

        let rating = service.seller_rating(seller_id).await.unwrap();
        assert_eq!(rating.total_reviews, 3);
        assert_eq!(rating.average_rating, dec!(4.33));

        let empty = service.seller_rating(Uuid::new_v4()).await.unwrap();
        assert_eq!(empty.total_reviews, 0);
        assert_eq!(empty.average_rating, Decimal::ZERO);
    }
}
