use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::db::{CustomerResponse, SignInRequest, SignUpRequest};
use crate::AppState;

use super::auth::{self, Identity};
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password};

/// Validate a SignUpRequest
fn validate_sign_up_request(req: &SignUpRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_email(&req.email) {
        errors.add("email", &e);
    }

    if let Err(e) = validate_password(&req.password) {
        errors.add("password", &e);
    }

    errors.finish()
}

/// Create a customer account
///
/// POST /api/customers/sign-up
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    validate_sign_up_request(&req)?;

    let customer = state.sessions.sign_up(&req.email, &req.password).await?;

    Ok(Json(customer))
}

/// Authenticate a customer and set the identity cookie
///
/// POST /api/customers/sign-in
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SignInRequest>,
) -> Result<(CookieJar, Json<CustomerResponse>), ApiError> {
    // Presence checks live in the manager; no format rules here, since
    // existing accounts may predate them
    let (customer, token) = state.sessions.sign_in(&req.email, &req.password).await?;

    let jar = jar.add(auth::identity_cookie(token, &state.config));

    Ok((jar, Json(customer)))
}

/// Close the current session and clear the identity cookie. Succeeds no
/// matter what state the token is in.
///
/// GET /api/customers/sign-out
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    identity: Option<Extension<Identity>>,
) -> Result<(StatusCode, CookieJar), ApiError> {
    if let Some(cookie) = jar.get(auth::AUTH_COOKIE) {
        let token = cookie.value().to_string();
        let customer_id = identity.as_ref().map(|ext| ext.0.customer_id.as_str());
        state.sessions.sign_out(customer_id, &token).await?;
    }

    Ok((StatusCode::NO_CONTENT, jar.remove(auth::removal_cookie())))
}

/// Resolve the current identity: `null` for anonymous requests, the
/// sanitized customer view otherwise
///
/// GET /api/customers/authenticate
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    identity: Option<Extension<Identity>>,
) -> Result<Json<Option<CustomerResponse>>, ApiError> {
    let Some(Extension(identity)) = identity else {
        return Ok(Json(None));
    };

    let customer = state.sessions.resolve_identity(&identity.customer_id).await?;

    Ok(Json(Some(customer)))
}
