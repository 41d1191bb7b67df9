use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, SessionRecord};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
///
/// Emails passed in are already normalized by the service.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    /// Stores the user together with its password. Either both are written or
    /// neither is. Fails with `AuthError::Conflict` when the email is taken.
    async fn create_user_with_password(
        &self,
        email: &str,
        name: &str,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;

    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> Result<SessionRecord, AuthError>;
    async fn find_session(&self, id: Uuid) -> Result<Option<SessionRecord>, AuthError>;
    /// Returns false when the session was missing or already revoked.
    async fn revoke_session(&self, id: Uuid) -> Result<bool, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,      // key: email
        creds: Mutex<HashMap<Uuid, Credentials>>,     // key: user_id
        sessions: Mutex<HashMap<Uuid, SessionRecord>>, // key: session id
        fail_credentials: AtomicBool,
    }

    impl MockAuthRepository {
        /// Makes every credential write fail with `AuthError::Repository`.
        pub fn fail_credential_writes(&self, fail: bool) {
            self.fail_credentials.store(fail, Ordering::SeqCst);
        }

        pub fn user_count(&self) -> usize {
            self.users.lock().unwrap().len()
        }

        pub fn session_count(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }

        /// Moves a session's expiry into the past.
        pub fn expire_session(&self, id: Uuid) {
            if let Some(s) = self.sessions.lock().unwrap().get_mut(&id) {
                s.expires_at = Utc::now() - Duration::seconds(1);
            }
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(email).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.id == id).cloned())
        }

        async fn create_user_with_password(
            &self,
            email: &str,
            name: &str,
            password_hash: String,
            password_algorithm: String,
        ) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(email) {
                return Err(AuthError::Conflict);
            }
            if self.fail_credentials.load(Ordering::SeqCst) {
                return Err(AuthError::Repository("credential write failed".into()));
            }
            let user = AuthUser { id: Uuid::new_v4(), email: email.to_string(), name: name.to_string(), created_at: Utc::now() };
            let c = Credentials { user_id: user.id, password_hash, password_algorithm };
            self.creds.lock().unwrap().insert(user.id, c);
            users.insert(email.to_string(), user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn create_session(&self, user_id: Uuid, ttl: Duration) -> Result<SessionRecord, AuthError> {
            let now = Utc::now();
            let s = SessionRecord { id: Uuid::new_v4(), user_id, created_at: now, expires_at: now + ttl, revoked_at: None };
            self.sessions.lock().unwrap().insert(s.id, s.clone());
            Ok(s)
        }

        async fn find_session(&self, id: Uuid) -> Result<Option<SessionRecord>, AuthError> {
            Ok(self.sessions.lock().unwrap().get(&id).cloned())
        }

        async fn revoke_session(&self, id: Uuid) -> Result<bool, AuthError> {
            let mut sessions = self.sessions.lock().unwrap();
            match sessions.get_mut(&id) {
                Some(s) if s.revoked_at.is_none() => {
                    s.revoked_at = Some(Utc::now());
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }
}
