//! Database row types. `UserRow` carries the password hash and so is kept
//! apart from the public `User` model; businesses and products map onto
//! their storefront-types models directly.

use chrono::{DateTime, NaiveDate, Utc};
use storefront_types::models::{Business, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_verified: bool,
    pub join_date: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            is_verified: row.is_verified,
            join_date: row.join_date,
        }
    }
}

/// Outcome of inserting a new account. A username or email already on
/// record is reported here rather than as a constraint error.
#[derive(Debug)]
pub enum NewAccount {
    Created { user: UserRow, business: Business },
    UsernameTaken,
    EmailTaken,
}

/// Writable product columns. `percentage_discount` is computed by the caller.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub category: String,
    pub original_price: f64,
    pub new_price: f64,
    pub percentage_discount: i64,
    pub offer_expiration_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct BusinessFields {
    pub business_name: String,
    pub city: String,
    pub region: String,
    pub business_description: Option<String>,
}
