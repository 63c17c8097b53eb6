use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Public view of an account. The password hash never leaves the DB layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub join_date: DateTime<Utc>,
}

/// A storefront. Every user owns exactly one, created alongside the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: i64,
    pub business_name: String,
    pub city: String,
    pub region: String,
    pub business_description: Option<String>,
    pub logo: String,
    pub owner_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub original_price: f64,
    pub new_price: f64,
    pub percentage_discount: i64,
    pub offer_expiration_date: NaiveDate,
    pub product_image: String,
    pub date_published: DateTime<Utc>,
    pub business_id: i64,
}
