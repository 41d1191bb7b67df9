use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{AuthSession, AuthUser, LoginInput, RegisterInput, SessionContext};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub password_algorithm: String,
}

impl AuthConfig {
    /// argon2 hashing and a 12 hour session lifetime.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into(), session_ttl: Duration::hours(12), password_algorithm: "argon2".into() }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

/// JWT payload. `sid` names the server-side session row.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: Uuid,
    pub sid: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password. No session is opened.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret"));
    /// let input = RegisterInput { name: "Test".into(), email: " User@Example.com ".into(), password: "p".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        let email = models::user::normalize_email(&input.email);
        models::user::validate_email(&email)?;
        models::user::validate_name(&input.name)?;
        if input.password.is_empty() {
            return Err(AuthError::Validation("password required".into()));
        }
        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self
            .repo
            .create_user_with_password(&email, input.name.trim(), hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Verify credentials, open a session and sign a token naming it.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::new("secret"));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { name: "N".into(), email: "u@e.com".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let email = models::user::normalize_email(&input.email);
        let user = self.repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            warn!(user_id = %user.id, "login_rejected");
            return Err(AuthError::Unauthorized);
        }

        let session = self.repo.create_session(user.id, self.cfg.session_ttl).await?;
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id,
            sid: session.id,
            iat: session.created_at.timestamp(),
            exp: session.expires_at.timestamp(),
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;

        info!(user_id = %user.id, session_id = %session.id, "user_logged_in");
        Ok(AuthSession { user, session_id: session.id, token, expires_at: session.expires_at })
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!(error = %e, "token_rejected");
            AuthError::Unauthorized
        })?;
        Ok(data.claims)
    }

    /// Resolve a token into the caller's session context.
    ///
    /// Fails with `Unauthorized` unless the signature verifies, the token is
    /// unexpired, and the session it names is live and owned by `uid`.
    pub async fn authenticate(&self, token: &str) -> Result<SessionContext, AuthError> {
        let claims = self.decode_claims(token)?;
        let session = self.repo
            .find_session(claims.sid)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if session.user_id != claims.uid || !session.is_live(Utc::now()) {
            return Err(AuthError::Unauthorized);
        }
        Ok(SessionContext { user_id: session.user_id, session_id: session.id })
    }

    /// Revoke the session named by `token`.
    ///
    /// Returns whether a live session was revoked; unreadable tokens are
    /// reported as `Unauthorized`.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<bool, AuthError> {
        let claims = self.decode_claims(token)?;
        let revoked = self.repo.revoke_session(claims.sid).await?;
        if revoked {
            info!(user_id = %claims.uid, session_id = %claims.sid, "user_logged_out");
        }
        Ok(revoked)
    }

    pub async fn current_user(&self, ctx: &SessionContext) -> Result<AuthUser, AuthError> {
        self.repo.find_user_by_id(ctx.user_id).await?.ok_or(AuthError::NotFound)
    }
}
