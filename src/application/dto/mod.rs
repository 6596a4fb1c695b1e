// src/application/dto/mod.rs
// Request/response shapes exchanged with callers of the usecases.
// Field names follow the app-shaped camelCase wire format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::model::{Address, UserRole};

/// A cart ready to be placed as an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub buyer_id: Uuid,
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub book_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// "buyer" or "seller"; admins are not self-service.
    pub role: UserRole,
    pub company_name: Option<String>,
}

/// Aggregate order figures for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    /// Revenue over delivered orders only.
    pub total_revenue: Decimal,
    pub status_counts: HashMap<String, usize>,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerRating {
    pub seller_id: Uuid,
    pub average_rating: Decimal,
    pub total_reviews: usize,
}
