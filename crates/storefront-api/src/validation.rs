use std::sync::LazyLock;

use regex::Regex;
use storefront_types::api::RegisterRequest;

use crate::error::ApiError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_USERNAME_LENGTH: usize = 5;
pub const MAX_USERNAME_LENGTH: usize = 30;
pub const MAX_EMAIL_LENGTH: usize = 200;
pub const MAX_BUSINESS_NAME_LENGTH: usize = 30;
pub const MAX_LOCATION_LENGTH: usize = 100;
pub const MAX_PRODUCT_NAME_LENGTH: usize = 100;
pub const MAX_CATEGORY_LENGTH: usize = 30;

// Approximate on purpose: quoted local parts, IP literals and single-label
// domains are all rejected even though they are valid addresses.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static email regex")
});

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(email)
}

/// Field checks run before any lookup, in a fixed order so the first
/// failing rule decides the message.
pub fn check_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest("Password must be longer than 8 characters"));
    }
    let username_len = req.username.chars().count();
    if username_len < MIN_USERNAME_LENGTH {
        return Err(ApiError::BadRequest("Username must be longer than 5 characters"));
    }
    if username_len > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest("Username must be at most 30 characters"));
    }
    if !is_valid_email(&req.email) {
        return Err(ApiError::BadRequest("This is not a valid email"));
    }
    Ok(())
}

pub fn check_business_name(name: &str) -> Result<(), ApiError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_BUSINESS_NAME_LENGTH {
        return Err(ApiError::BadRequest("Business name must be 1 to 30 characters"));
    }
    Ok(())
}

pub fn check_location(city: &str, region: &str) -> Result<(), ApiError> {
    if city.chars().count() > MAX_LOCATION_LENGTH {
        return Err(ApiError::BadRequest("City must be at most 100 characters"));
    }
    if region.chars().count() > MAX_LOCATION_LENGTH {
        return Err(ApiError::BadRequest("Region must be at most 100 characters"));
    }
    Ok(())
}

pub fn check_product(name: &str, category: &str) -> Result<(), ApiError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_PRODUCT_NAME_LENGTH {
        return Err(ApiError::BadRequest("Product name must be 1 to 100 characters"));
    }
    if category.chars().count() > MAX_CATEGORY_LENGTH {
        return Err(ApiError::BadRequest("Category must be at most 30 characters"));
    }
    Ok(())
}
