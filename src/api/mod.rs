pub mod auth;
mod categories;
mod customers;
mod error;
mod products;
mod validation;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Customers
        .route("/customers/sign-up", post(customers::sign_up))
        .route("/customers/sign-in", post(customers::sign_in))
        .route("/customers/sign-out", get(customers::sign_out))
        .route("/customers/authenticate", get(customers::authenticate))
        // Categories
        .route("/categories", get(categories::list_categories))
        .route("/categories", post(categories::create_category))
        .route("/categories", put(categories::update_category))
        .route("/categories/:id", get(categories::get_category))
        // Products
        .route("/products", get(products::list_products))
        .route("/products", post(products::create_product))
        .route("/products/category/:id", get(products::list_products_by_category))
        .route("/products/:id", get(products::get_product))
        // Identity resolution runs for every api route; handlers decide
        // whether an identity is required
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identity_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Cross-origin policy for browser frontends. Local dev servers are
/// allowed (with credentials, so the identity cookie flows); production
/// serves no CORS headers at all.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = if config.server.environment == "production" {
        Vec::new()
    } else {
        vec![
            HeaderValue::from_static("http://localhost:8080"),
            HeaderValue::from_static("http://0.0.0.0:8080"),
        ]
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
}

async fn health_check() -> &'static str {
    "OK"
}
