//! HTTP API layer for edumatch.
//!
//! - **Endpoints**: JSON resources under `/api`
//! - **Extractors**: Authenticated user and resolved actor
//! - **Middleware**: Bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::Router;

pub use endpoints::router;
pub use middleware::AppState;

/// The API mounted under `/api` with authentication applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}
