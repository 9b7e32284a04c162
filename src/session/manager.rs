use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::crypto::{self, CredentialVerifier};
use crate::db::{serialize_sessions, Customer, CustomerResponse, DbPool};

use super::{SessionPayload, SessionStore, SessionStoreError};

/// Failures from sign-up/sign-in/sign-out orchestration.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Customer not found")]
    NotFound,
    #[error("A customer with this email already exists")]
    AlreadyExists,
    #[error("Email and password do not match")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] SessionStoreError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Password hashing failed")]
    Hash(String),
}

/// Orchestrates customer sign-up, sign-in and sign-out.
///
/// Owns the mapping from a customer to their live session tokens (the
/// `sessions` column, newest first); the store owns the token payloads
/// themselves. The two writes are sequential, not transactional: a crash
/// between them can leave a token live in one place only, which the next
/// sign-in/sign-out pass narrows. See DESIGN.md.
#[derive(Clone)]
pub struct SessionManager {
    db: DbPool,
    store: Arc<dyn SessionStore>,
    verifier: CredentialVerifier,
}

impl SessionManager {
    pub fn new(db: DbPool, store: Arc<dyn SessionStore>, verifier: CredentialVerifier) -> Self {
        Self {
            db,
            store,
            verifier,
        }
    }

    /// Create a customer account. Never returns the password hash.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<CustomerResponse, AuthError> {
        validate_credentials_present(email, password)?;

        let existing = self.find_by_email(email).await?;
        if existing.is_some() {
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = self
            .verifier
            .hash(password)
            .map_err(|e| AuthError::Hash(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let customer = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (id, email, password_hash, sessions, created_at, updated_at)
             VALUES (?, ?, ?, '[]', ?, ?) RETURNING *",
        )
        .bind(&id)
        .bind(email)
        .bind(&password_hash)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(customer_id = %customer.id, "Customer signed up");

        Ok(CustomerResponse::from(customer))
    }

    /// Authenticate a customer and open a new session.
    ///
    /// Both the store write and the session-list update complete before
    /// this returns. Concurrent sign-ins for the same customer each get
    /// their own token; multi-device sessions are intentional.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(CustomerResponse, String), AuthError> {
        validate_credentials_present(email, password)?;

        let customer = self.find_by_email(email).await?.ok_or(AuthError::NotFound)?;

        if !self.verifier.verify(&customer.password_hash, password) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = crypto::generate_token();
        let now = chrono::Utc::now().to_rfc3339();

        self.store
            .set(
                &token,
                SessionPayload {
                    customer_id: customer.id.clone(),
                    created_at: now.clone(),
                },
            )
            .await?;

        // Newest token first; order only matters for display
        let mut tokens = customer.session_tokens();
        tokens.insert(0, token.clone());

        if let Err(e) = self.persist_sessions(&customer.id, &tokens, &now).await {
            // The token is live in the store but missing from the
            // customer row; accepted divergence, surfaced for operators
            tracing::warn!(
                customer_id = %customer.id,
                error = %e,
                "Session stored but customer session list update failed"
            );
            return Err(AuthError::Database(e));
        }

        tracing::info!(customer_id = %customer.id, "Customer signed in");

        Ok((CustomerResponse::from(customer), token))
    }

    /// Close a session. Idempotent: an unknown or already-revoked token
    /// still counts as a successful sign-out, and the store delete is
    /// attempted regardless of what the customer row says.
    pub async fn sign_out(&self, customer_id: Option<&str>, token: &str) -> Result<(), AuthError> {
        if let Some(id) = customer_id {
            if let Some(customer) = self.find_by_id(id).await? {
                let mut tokens = customer.session_tokens();
                let before = tokens.len();
                tokens.retain(|t| t != token);
                if tokens.len() != before {
                    let now = chrono::Utc::now().to_rfc3339();
                    self.persist_sessions(&customer.id, &tokens, &now).await?;
                }
            }
        }

        self.store.delete(token).await?;

        Ok(())
    }

    /// Fetch the sanitized view for an authenticated customer id.
    ///
    /// A valid token whose backing customer is gone is an authorization
    /// failure, not a silent anonymous pass.
    pub async fn resolve_identity(&self, customer_id: &str) -> Result<CustomerResponse, AuthError> {
        let customer = self
            .find_by_id(customer_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        Ok(CustomerResponse::from(customer))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.db)
            .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    async fn persist_sessions(
        &self,
        customer_id: &str,
        tokens: &[String],
        now: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE customers SET sessions = ?, updated_at = ? WHERE id = ?")
            .bind(serialize_sessions(tokens))
            .bind(now)
            .bind(customer_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

fn validate_credentials_present(email: &str, password: &str) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::Validation("Email is required".to_string()));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::session::{FailingStore, MemorySessionStore};

    async fn test_manager() -> (SessionManager, Arc<MemorySessionStore>) {
        let db = crate::db::connect("sqlite::memory:", 1).await.unwrap();
        let store = Arc::new(MemorySessionStore::new());
        let verifier = CredentialVerifier::new(&AuthConfig {
            hash_memory_kib: 8,
            hash_iterations: 1,
            hash_parallelism: 1,
        })
        .unwrap();
        (
            SessionManager::new(db, store.clone(), verifier),
            store,
        )
    }

    #[tokio::test]
    async fn test_sign_up_rejects_empty_fields() {
        let (manager, _) = test_manager().await;
        assert!(matches!(
            manager.sign_up("", "123456").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            manager.sign_up("john@email.com", "").await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email() {
        let (manager, _) = test_manager().await;
        manager.sign_up("john@email.com", "123456").await.unwrap();
        assert!(matches!(
            manager.sign_up("john@email.com", "other").await,
            Err(AuthError::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_sign_up_response_is_sanitized() {
        let (manager, _) = test_manager().await;
        let customer = manager.sign_up("john@email.com", "123456").await.unwrap();
        assert_eq!(customer.email, "john@email.com");
        let json = serde_json::to_value(&customer).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("sessions").is_none());
    }

    #[tokio::test]
    async fn test_sign_in_happy_path() {
        let (manager, store) = test_manager().await;
        let created = manager.sign_up("john@email.com", "123456").await.unwrap();

        let (customer, token) = manager.sign_in("john@email.com", "123456").await.unwrap();
        assert_eq!(customer.id, created.id);

        // Token resolves in the store and is recorded on the customer row
        let payload = store.get(&token).await.unwrap().unwrap();
        assert_eq!(payload.customer_id, created.id);
    }

    #[tokio::test]
    async fn test_sign_in_unknown_email() {
        let (manager, _) = test_manager().await;
        assert!(matches!(
            manager.sign_in("nobody@email.com", "123456").await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let (manager, _) = test_manager().await;
        let customer = manager.sign_up("john@email.com", "123456").await.unwrap();
        assert!(matches!(
            manager.sign_in("john@email.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        // No session was opened
        let row = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(&customer.id)
            .fetch_one(&manager.db)
            .await
            .unwrap();
        assert!(row.session_tokens().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_independent() {
        let (manager, store) = test_manager().await;
        manager.sign_up("john@email.com", "123456").await.unwrap();

        let (customer, first) = manager.sign_in("john@email.com", "123456").await.unwrap();
        let (_, second) = manager.sign_in("john@email.com", "123456").await.unwrap();
        assert_ne!(first, second);

        // Both valid simultaneously, newest first on the row
        assert!(store.get(&first).await.unwrap().is_some());
        assert!(store.get(&second).await.unwrap().is_some());
        let row = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(&customer.id)
            .fetch_one(&manager.db)
            .await
            .unwrap();
        assert_eq!(row.session_tokens(), vec![second.clone(), first.clone()]);

        // Revoking one leaves the other untouched
        manager.sign_out(Some(&customer.id), &first).await.unwrap();
        assert!(store.get(&first).await.unwrap().is_none());
        assert!(store.get(&second).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sign_out_unknown_token_succeeds() {
        let (manager, _) = test_manager().await;
        let customer = manager.sign_up("john@email.com", "123456").await.unwrap();

        manager
            .sign_out(Some(&customer.id), "never-issued")
            .await
            .unwrap();
        manager.sign_out(None, "never-issued").await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_out_twice_succeeds() {
        let (manager, store) = test_manager().await;
        let customer = manager.sign_up("john@email.com", "123456").await.unwrap();
        let (_, token) = manager.sign_in("john@email.com", "123456").await.unwrap();

        manager.sign_out(Some(&customer.id), &token).await.unwrap();
        manager.sign_out(Some(&customer.id), &token).await.unwrap();
        assert!(store.get(&token).await.unwrap().is_none());

        let row = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(&customer.id)
            .fetch_one(&manager.db)
            .await
            .unwrap();
        assert!(row.session_tokens().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_identity() {
        let (manager, _) = test_manager().await;
        let created = manager.sign_up("john@email.com", "123456").await.unwrap();

        let resolved = manager.resolve_identity(&created.id).await.unwrap();
        assert_eq!(resolved.id, created.id);

        assert!(matches!(
            manager.resolve_identity("gone").await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_store_outage_surfaces_as_store_error() {
        let db = crate::db::connect("sqlite::memory:", 1).await.unwrap();
        let verifier = CredentialVerifier::new(&AuthConfig {
            hash_memory_kib: 8,
            hash_iterations: 1,
            hash_parallelism: 1,
        })
        .unwrap();
        let manager = SessionManager::new(db, Arc::new(FailingStore), verifier);

        manager.sign_up("john@email.com", "123456").await.unwrap();
        assert!(matches!(
            manager.sign_in("john@email.com", "123456").await,
            Err(AuthError::Store(_))
        ));
        assert!(matches!(
            manager.sign_out(None, "tok").await,
            Err(AuthError::Store(_))
        ));
    }
}
