pub mod auth;
pub mod business;
pub mod credentials;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod products;
pub mod routes;
pub mod state;
pub mod tokens;
pub mod uploads;
pub mod users;
pub mod validation;

pub use routes::router;
pub use state::{AppState, AppStateInner, Site};
