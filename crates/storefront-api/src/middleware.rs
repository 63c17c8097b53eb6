use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use storefront_db::models::UserRow;
use tracing::warn;

use crate::error::ApiError;
use crate::state::{AppState, db_call};
use crate::tokens::TokenKind;

/// The account behind the bearer token, inserted by `require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

/// Validate the bearer token and re-fetch the user it names. A token whose
/// claims no longer match a stored row is treated like a forged one.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.map_err(|_| ApiError::Unauthorized("Not authenticated"))?;

    let user = authenticate(&state, bearer.token()).await?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

pub async fn authenticate(state: &AppState, token: &str) -> Result<UserRow, ApiError> {
    let claims = state.tokens.verify(token).map_err(|_| {
        warn!("Rejected bearer token: failed to decode");
        invalid_token()
    })?;

    let id = claims.id;
    let user = db_call(state, move |db| db.get_user_by_id(id))
        .await?
        .filter(|row| TokenKind::Login.matches(&claims, row));

    user.ok_or_else(|| {
        warn!("Rejected bearer token for user {}: no matching account", id);
        invalid_token()
    })
}

fn invalid_token() -> ApiError {
    ApiError::Unauthorized("Invalid token")
}
