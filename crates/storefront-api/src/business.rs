use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use storefront_db::models::BusinessFields;
use storefront_types::api::BusinessUpdateRequest;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, db_call};
use crate::validation::{check_business_name, check_location};

pub const NOT_OWNER: &str = "Not authenticated to perform this action";

/// PUT /business/{id} — owner-only profile update.
pub async fn update_business(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<BusinessUpdateRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let business = db_call(&state, move |db| db.get_business(id))
        .await?
        .ok_or(ApiError::NotFound("Business Not Found"))?;

    if business.owner_id != user.id {
        return Err(ApiError::Unauthorized(NOT_OWNER));
    }

    check_business_name(&req.business_name)?;
    check_location(&req.city, &req.region)?;
    let fields = BusinessFields {
        business_name: req.business_name.trim().to_string(),
        city: req.city,
        region: req.region,
        business_description: req.business_description,
    };

    // Also refuses another user's username, which stays reserved for
    // that user's storefront.
    let name = fields.business_name.clone();
    if db_call(&state, move |db| db.business_name_taken(&name, id)).await? {
        return Err(ApiError::BadRequest("Business name already exists"));
    }

    let updated = db_call(&state, move |db| db.update_business(id, &fields))
        .await?
        .ok_or(ApiError::NotFound("Business Not Found"))?;

    info!("User {} updated business {}", user.id, id);
    Ok(Json(updated))
}
