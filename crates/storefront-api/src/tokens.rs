use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use storefront_db::models::UserRow;
use storefront_types::api::Claims;

/// The two token kinds share one encoding. They differ only in which
/// identifying claim must agree with the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bearer token returned by `/token`; bound to the username.
    Login,
    /// Emailed link token; bound to the email address it was sent to.
    Verification,
}

impl TokenKind {
    pub fn matches(self, claims: &Claims, row: &UserRow) -> bool {
        if claims.id != row.id {
            return false;
        }
        match self {
            TokenKind::Login => claims.username == row.username,
            TokenKind::Verification => claims.email == row.email,
        }
    }
}

/// Decoding failed for any reason. Deliberately carries no detail.
#[derive(Debug, thiserror::Error)]
#[error("invalid token")]
pub struct InvalidToken;

/// HS256 signer/verifier over a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl TokenService {
    /// `ttl = None` issues tokens without an `exp` claim; they never expire.
    pub fn new(secret: &str, ttl: Option<Duration>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is optional; when present it is still enforced.
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, user: &UserRow) -> anyhow::Result<String> {
        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            exp: self
                .ttl
                .map(|ttl| (Utc::now() + ttl).timestamp().max(0) as usize),
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| InvalidToken)
    }
}
