use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use storefront_types::api::{MAX_PAGE_LIMIT, PageQuery, ProfileData, ProfileResponse};
use storefront_types::models::User;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, db_call};

pub const JOIN_DATE_FORMAT: &str = "%b %d %Y";

/// POST /users/me — the caller's account and storefront.
pub async fn profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let owner_id = user.id;
    let business = db_call(&state, move |db| db.get_business_by_owner(owner_id))
        .await?
        .ok_or(ApiError::NotFound("Business Not Found"))?;

    Ok(Json(ProfileResponse {
        status: "ok".to_string(),
        data: ProfileData {
            username: user.username,
            email: user.email,
            is_verified: user.is_verified,
            join_date: user.join_date.format(JOIN_DATE_FORMAT).to_string(),
            logo: state.site.absolute(&business.logo),
            business,
        },
    }))
}

/// GET /users/ — id-window listing, authenticated callers only.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    WithRejection(Query(page), _): WithRejection<Query<PageQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    check_page(&page)?;

    let rows = db_call(&state, move |db| db.list_users(page.skip, page.limit)).await?;
    let users: Vec<User> = rows.into_iter().map(User::from).collect();
    Ok(Json(users))
}

pub(crate) fn check_page(page: &PageQuery) -> Result<(), ApiError> {
    if page.limit > MAX_PAGE_LIMIT {
        return Err(ApiError::BadRequest("limit must not exceed 100"));
    }
    Ok(())
}
