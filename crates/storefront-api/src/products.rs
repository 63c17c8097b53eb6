use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use tracing::info;

use storefront_db::models::ProductFields;
use storefront_types::api::{BusinessSummary, PageQuery, ProductDetailResponse, ProductRequest};
use storefront_types::models::{Business, Product};

use crate::business::NOT_OWNER;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, db_call};
use crate::users::{JOIN_DATE_FORMAT, check_page};
use crate::validation::check_product;

const PRODUCT_NOT_FOUND: &str = "Product Not Found";

/// `(original - new) / original * 100`, truncated toward zero.
pub fn percentage_discount(original_price: f64, new_price: f64) -> Result<i64, ApiError> {
    if !(original_price.is_finite() && original_price > 0.0) || !new_price.is_finite() {
        return Err(ApiError::BadRequest("The original price must be greater than 0"));
    }
    Ok(((original_price - new_price) / original_price * 100.0) as i64)
}

fn product_fields(req: ProductRequest) -> Result<ProductFields, ApiError> {
    check_product(&req.name, &req.category)?;
    let percentage_discount = percentage_discount(req.original_price, req.new_price)?;
    Ok(ProductFields {
        name: req.name,
        category: req.category,
        original_price: req.original_price,
        new_price: req.new_price,
        percentage_discount,
        offer_expiration_date: req
            .offer_expiration_date
            .unwrap_or_else(|| Utc::now().date_naive()),
    })
}

/// Load a product and confirm the caller owns the business selling it.
pub(crate) async fn owned_product(
    state: &AppState,
    id: i64,
    user_id: i64,
) -> Result<Product, ApiError> {
    let (product, business) = db_call(state, move |db| {
        let Some(product) = db.get_product(id)? else {
            return Ok(None);
        };
        let business = db.get_business(product.business_id)?;
        Ok(Some((product, business)))
    })
    .await?
    .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;

    match business {
        Some(Business { owner_id, .. }) if owner_id == user_id => Ok(product),
        _ => Err(ApiError::Unauthorized(NOT_OWNER)),
    }
}

/// POST /products/ — list a product under the caller's storefront.
pub async fn create_product(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<ProductRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = product_fields(req)?;

    let owner_id = user.id;
    let business = db_call(&state, move |db| db.get_business_by_owner(owner_id))
        .await?
        .ok_or(ApiError::NotFound("Business Not Found"))?;

    let business_id = business.id;
    let product = db_call(&state, move |db| db.insert_product(business_id, &fields)).await?;

    info!("Business {} listed product {}", business_id, product.id);
    Ok(Json(product))
}

/// GET /products — public id-window listing.
pub async fn list_products(
    State(state): State<AppState>,
    WithRejection(Query(page), _): WithRejection<Query<PageQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    check_page(&page)?;
    let products = db_call(&state, move |db| db.list_products(page.skip, page.limit)).await?;
    Ok(Json(products))
}

/// GET /products/{id} — product plus a summary of the storefront selling it.
pub async fn product_detail(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let found = db_call(&state, move |db| {
        let Some(product) = db.get_product(id)? else {
            return Ok(None);
        };
        let Some(business) = db.get_business(product.business_id)? else {
            return Ok(None);
        };
        let owner = db.get_user_by_id(business.owner_id)?;
        Ok(owner.map(|owner| (product, business, owner)))
    })
    .await?;

    let (mut product, business, owner) = found.ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;
    product.product_image = state.site.absolute(&product.product_image);

    Ok(Json(ProductDetailResponse {
        product_details: product,
        business_details: BusinessSummary {
            name: business.business_name,
            city: business.city,
            region: business.region,
            description: business.business_description,
            logo: state.site.absolute(&business.logo),
            owner_id: owner.id,
            email: owner.email,
            join_date: owner.join_date.format(JOIN_DATE_FORMAT).to_string(),
        },
    }))
}

/// PUT /products/{id} — owner-only; the discount is recomputed.
pub async fn update_product(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<ProductRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    owned_product(&state, id, user.id).await?;
    let fields = product_fields(req)?;

    let product = db_call(&state, move |db| db.update_product(id, &fields))
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;
    Ok(Json(product))
}

/// DELETE /products/{id} — owner-only.
pub async fn delete_product(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    owned_product(&state, id, user.id).await?;
    db_call(&state, move |db| db.delete_product(id)).await?;

    info!("User {} deleted product {}", user.id, id);
    Ok(StatusCode::NO_CONTENT)
}
