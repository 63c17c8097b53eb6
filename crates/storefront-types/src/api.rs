use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Business, Product};

// -- JWT Claims --

/// Claim set carried by both login and verification tokens. The two kinds
/// share this encoding; callers decide which identifying claims to check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Only present when a token lifetime is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

// -- Auth --

/// Form body of `POST /token`, OAuth2 password-grant style.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

// -- Pagination --

pub const MAX_PAGE_LIMIT: u32 = 100;

/// Id-window pagination: rows with `skip < id <= skip + limit`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub skip: u32,
}

fn default_limit() -> u32 {
    MAX_PAGE_LIMIT
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            limit: MAX_PAGE_LIMIT,
            skip: 0,
        }
    }
}

// -- Profile --

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub status: String,
    pub data: ProfileData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileData {
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    /// Formatted as `%b %d %Y`, e.g. `Mar 04 2024`.
    pub join_date: String,
    pub logo: String,
    pub business: Business,
}

// -- Business --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessUpdateRequest {
    pub business_name: String,
    #[serde(default = "unspecified")]
    pub city: String,
    #[serde(default = "unspecified")]
    pub region: String,
    #[serde(default)]
    pub business_description: Option<String>,
}

fn unspecified() -> String {
    "Unspecified".to_string()
}

// -- Products --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductRequest {
    pub name: String,
    pub category: String,
    pub original_price: f64,
    pub new_price: f64,
    /// Defaults to today (UTC) when omitted.
    #[serde(default)]
    pub offer_expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductDetailResponse {
    pub product_details: Product,
    pub business_details: BusinessSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BusinessSummary {
    pub name: String,
    pub city: String,
    pub region: String,
    pub description: Option<String>,
    pub logo: String,
    pub owner_id: i64,
    pub email: String,
    pub join_date: String,
}
