use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use axum_extra::extract::WithRejection;
use tracing::{error, info, warn};

use storefront_db::models::{NewAccount, UserRow};
use storefront_types::api::{RegisterRequest, TokenRequest, TokenResponse, VerifyQuery};
use storefront_types::models::User;

use crate::credentials::{hash_password, verify_password};
use crate::error::ApiError;
use crate::mailer::{escape_html, verification_mail};
use crate::state::{AppState, db_call};
use crate::tokens::TokenKind;
use crate::validation::check_registration;

/// POST /token — exchange username/password for a bearer token.
/// Unverified accounts are refused here, which gates every protected route.
pub async fn issue_token(
    State(state): State<AppState>,
    WithRejection(Form(req), _): WithRejection<Form<TokenRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    const BAD_CREDENTIALS: &str = "Invalid username or password";

    let username = req.username.clone();
    let user = db_call(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))?;

    // Argon2 is CPU-bound; run it on the blocking pool.
    let digest = user.password.clone();
    let password = req.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &digest))
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    if !valid {
        warn!("Failed login for {}", user.username);
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
    }

    if !user.is_verified {
        return Err(ApiError::Unauthorized("Email not verified"));
    }

    let token = state.tokens.issue(&user)?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

/// POST /users/ — create an unverified account plus its storefront, then
/// email the verification link.
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    check_registration(&req)?;
    let RegisterRequest { username, email, password } = req;

    let name = username.clone();
    if db_call(&state, move |db| db.username_exists(&name)).await? {
        return Err(ApiError::BadRequest("Username already exists"));
    }
    let address = email.clone();
    if db_call(&state, move |db| db.email_exists(&address)).await? {
        return Err(ApiError::BadRequest("Email already exists"));
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.into()))??;

    // Checked again inside the insert transaction, which closes the race
    // between two registrations passing the checks above together.
    let (user, business) = match db_call(&state, move |db| {
        db.create_user_with_business(&username, &email, &password_hash)
    })
    .await?
    {
        NewAccount::Created { user, business } => (user, business),
        NewAccount::UsernameTaken => return Err(ApiError::BadRequest("Username already exists")),
        NewAccount::EmailTaken => return Err(ApiError::BadRequest("Email already exists")),
    };

    info!(
        "Registered user {} ({}) with storefront {}",
        user.username, user.id, business.id
    );

    // No compensation on failure: the account stays, unverified.
    if let Err(e) = send_verification(&state, &user).await {
        error!("Failed to send verification email to {}: {:#}", user.email, e);
    }

    Ok((StatusCode::CREATED, Json(User::from(user))))
}

pub async fn send_verification(state: &AppState, user: &UserRow) -> anyhow::Result<()> {
    let token = state.tokens.issue(user)?;
    let link = format!(
        "{}?token={}",
        state.site.absolute("verification/email"),
        token
    );
    let mail = verification_mail(&user.email, &state.site.name, &link);
    state.mailer.send(mail).await
}

/// GET /verification/email?token=… — redeem an emailed token.
/// Idempotent: an already verified account just sees the confirmation page.
pub async fn verify_email(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<VerifyQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    const INVALID: &str = "Invalid Token or expired token";

    let claims = state
        .tokens
        .verify(&query.token)
        .map_err(|_| ApiError::Unauthorized(INVALID))?;

    let id = claims.id;
    let user = db_call(&state, move |db| db.get_user_by_id(id))
        .await?
        .filter(|row| TokenKind::Verification.matches(&claims, row))
        .ok_or(ApiError::Unauthorized(INVALID))?;

    if !user.is_verified {
        db_call(&state, move |db| db.mark_verified(id)).await?;
        info!("Verified email for user {} ({})", user.username, id);
    }

    Ok(Html(verification_page(&user.username)))
}

fn verification_page(username: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Account verified</title>
</head>
<body>
    <div style="display: flex; align-items: center; flex-direction: column">
        <h3>Account verified</h3>
        <p>Thanks {}, your email address is confirmed. You can now log in.</p>
    </div>
</body>
</html>
"#,
        escape_html(username)
    )
}
