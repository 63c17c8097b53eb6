use std::path::PathBuf;
use std::sync::Arc;

use storefront_db::Database;
use tracing::error;

use crate::error::ApiError;
use crate::mailer::Mailer;
use crate::tokens::TokenService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub mailer: Mailer,
    pub site: Site,
    /// Directory uploaded images are written to.
    pub upload_dir: PathBuf,
}

/// Public identity of the deployment, used for absolute links.
#[derive(Debug, Clone)]
pub struct Site {
    pub url: String,
    pub name: String,
}

impl Site {
    /// Join a stored relative path (or route) onto the site URL.
    pub fn absolute(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Run a blocking DB call off the async runtime.
pub async fn db_call<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
        .map_err(ApiError::from)
}
