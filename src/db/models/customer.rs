//! Customer models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// JSON array of live session tokens, newest first
    #[serde(skip_serializing)]
    pub sessions: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Customer {
    /// Decode the session token list from its JSON column.
    pub fn session_tokens(&self) -> Vec<String> {
        parse_sessions(Some(&self.sessions))
    }
}

/// Sanitized customer view. This is the only customer shape that leaves
/// the service: no password hash, no session list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email,
            created_at: customer.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Helper to parse the session token list JSON from the database
pub fn parse_sessions(json: Option<&str>) -> Vec<String> {
    json.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Helper to serialize the session token list to JSON for the database
pub fn serialize_sessions(tokens: &[String]) -> String {
    serde_json::to_string(tokens).unwrap_or_else(|_| "[]".to_string())
}
