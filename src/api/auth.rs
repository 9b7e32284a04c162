//! Request authentication.
//!
//! Every API request passes through `identity_middleware` before its
//! handler runs. The middleware resolves the `authToken` cookie against
//! the session store and attaches an `Identity` to the request when the
//! token is live. Requests without a cookie, or with a token the store
//! no longer knows, proceed anonymously; whether identity is required is
//! each handler's decision. A store outage is the one case that fails
//! the request, so "logged out" and "broken" stay distinguishable.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

use crate::config::Config;
use crate::AppState;

use super::error::ApiError;

/// Name of the identity cookie
pub const AUTH_COOKIE: &str = "authToken";

/// Request-scoped identity, attached as an extension when the session
/// token resolves.
#[derive(Debug, Clone)]
pub struct Identity {
    pub customer_id: String,
}

/// Resolve the identity cookie into a request extension. Read-only with
/// respect to the store.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        if let Some(payload) = state.store.get(cookie.value()).await? {
            request.extensions_mut().insert(Identity {
                customer_id: payload.customer_id,
            });
        }
    }

    Ok(next.run(request).await)
}

/// Build the identity cookie for a freshly issued token. HttpOnly always;
/// Secure everywhere except development. No Max-Age: the session lasts
/// until sign-out or store expiry.
pub fn identity_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(!config.server.is_development())
        .path("/")
        .build()
}

/// Cookie used to clear the identity cookie on sign-out.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE).path("/").build()
}
