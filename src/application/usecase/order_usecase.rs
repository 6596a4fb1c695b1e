// src/application/usecase/order_usecase.rs
// Order placement and lifecycle use cases

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::application::dto::{OrderStats, PlaceOrderRequest};
use crate::domain::errors::{AppError, AppResult, StoreError};
use crate::domain::model::{Book, Order, OrderDraft, OrderItem, OrderStatus};
use crate::domain::repository::{BookRepository, OrderFilter, OrderRepository};

/// Order placement and lifecycle use case
#[async_trait]
pub trait OrderManagementUseCase {
    /// Convert a cart into a persisted order, decrementing stock for
    /// every line as a single all-or-nothing operation.
    async fn place_order(&self, request: PlaceOrderRequest) -> AppResult<Order>;

    /// Set an order's status. Any status may follow any other; transition
    /// legality is deliberately not checked.
    async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> AppResult<Order>;

    async fn get_order(&self, order_id: Uuid) -> AppResult<Order>;

    async fn list_orders(&self, filter: OrderFilter) -> AppResult<Vec<Order>>;

    async fn order_stats(&self) -> AppResult<OrderStats>;
}

pub struct OrderService {
    books: Arc<dyn BookRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(books: Arc<dyn BookRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { books, orders }
    }

    /// Validate the request before any storage read. Zero side effects.
    fn validate(&self, request: &PlaceOrderRequest) -> AppResult<()> {
        if request.items.is_empty() {
            return Err(AppError::Validation("order has no line items".into()));
        }

        for line in &request.items {
            if line.quantity == 0 {
                return Err(AppError::Validation(format!(
                    "quantity for book {} must be positive",
                    line.book_id
                )));
            }
        }

        if let Some(field) = request.shipping_address.first_empty_field() {
            return Err(AppError::InvalidAddress(field));
        }

        Ok(())
    }
}

#[async_trait]
impl OrderManagementUseCase for OrderService {
    async fn place_order(&self, request: PlaceOrderRequest) -> AppResult<Order> {
        self.validate(&request)?;

        // Stage line items in caller order. Reads only: prices are
        // snapshotted and stock is checked against a staged view so a
        // cart holding the same book twice cannot oversell, but nothing
        // is written until the commit below.
        let mut fetched: HashMap<Uuid, Book> = HashMap::new();
        let mut remaining: HashMap<Uuid, u32> = HashMap::new();
        let mut items = Vec::with_capacity(request.items.len());

        for line in &request.items {
            if !fetched.contains_key(&line.book_id) {
                let book = self.books.get(line.book_id).await?;
                remaining.insert(line.book_id, book.stock);
                fetched.insert(line.book_id, book);
            }
            let book = &fetched[&line.book_id];
            let available = remaining[&line.book_id];

            if available < line.quantity {
                return Err(StoreError::InsufficientStock {
                    book_id: book.id,
                    title: book.title.clone(),
                    requested: line.quantity,
                    available,
                }
                .into());
            }

            remaining.insert(line.book_id, available - line.quantity);
            items.push(OrderItem {
                book_id: book.id,
                seller_id: book.seller_id,
                quantity: line.quantity,
                price: book.price,
            });
        }

        let draft = OrderDraft::new(request.buyer_id, items, request.shipping_address);

        // Single atomic commit. The store re-applies every decrement with
        // a guarded check, so a concurrent placement that won the stock in
        // the meantime surfaces as InsufficientStock, never as oversell.
        let order = self.orders.place(draft).await?;

        log::info!(
            "Placed order {} for buyer {}: {} line(s), total {}",
            order.id,
            order.buyer_id,
            order.items.len(),
            order.total_amount
        );

        Ok(order)
    }

    async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> AppResult<Order> {
        let order = self.orders.update_status(order_id, status).await?;
        log::info!("Order {} status set to {}", order.id, order.status);
        Ok(order)
    }

    async fn get_order(&self, order_id: Uuid) -> AppResult<Order> {
        Ok(self.orders.get(order_id).await?)
    }

    async fn list_orders(&self, filter: OrderFilter) -> AppResult<Vec<Order>> {
        Ok(self.orders.list(&filter).await?)
    }

    async fn order_stats(&self) -> AppResult<OrderStats> {
        let orders = self.orders.list(&OrderFilter::default()).await?;

        let total_orders = orders.len();
        let total_revenue: Decimal = orders
            .iter()
            .filter(|order| order.status == OrderStatus::Delivered)
            .map(|order| order.total_amount)
            .sum();

        let mut status_counts: HashMap<String, usize> = HashMap::new();
        for order in &orders {
            *status_counts.entry(order.status.to_string()).or_insert(0) += 1;
        }

        let average_order_value = if total_orders > 0 {
            total_revenue / Decimal::from(total_orders as u64)
        } else {
            Decimal::ZERO
        };

        Ok(OrderStats {
            total_orders,
            total_revenue,
            status_counts,
            average_order_value,
        })
    }
}
