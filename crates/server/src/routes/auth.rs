use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use service::auth::{
    domain::{AuthUser, LoginInput, RegisterInput, SessionContext},
    errors::AuthError,
    repo::seaorm::SeaOrmAuthRepository,
    repository::{mock::MockAuthRepository, AuthRepository},
    service::{AuthConfig, AuthService},
};
use service::task::{
    repo::seaorm::SeaOrmTaskRepository,
    repository::{mock::MockTaskRepository, TaskRepository},
    service::TaskService,
};

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

/// Shared handler state. Services sit behind trait objects so the same
/// router runs against Postgres or the in-memory repositories.
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<dyn AuthRepository>>,
    pub tasks: Arc<TaskService<dyn TaskRepository>>,
    pub cookie_secure: bool,
}

impl ServerState {
    pub fn new(
        auth_repo: Arc<dyn AuthRepository>,
        task_repo: Arc<dyn TaskRepository>,
        auth_cfg: AuthConfig,
        cookie_secure: bool,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(auth_repo, auth_cfg)),
            tasks: Arc::new(TaskService::new(task_repo)),
            cookie_secure,
        }
    }

    pub fn with_db(db: DatabaseConnection, auth_cfg: AuthConfig, cookie_secure: bool) -> Self {
        Self::new(
            Arc::new(SeaOrmAuthRepository::new(db.clone())),
            Arc::new(SeaOrmTaskRepository::new(db)),
            auth_cfg,
            cookie_secure,
        )
    }

    /// Non-persistent state backed by the mock repositories.
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::new(
            Arc::new(MockAuthRepository::default()),
            Arc::new(MockTaskRepository::default()),
            AuthConfig::new(jwt_secret),
            false,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<AuthUser> for UserView {
    fn from(u: AuthUser) -> Self {
        Self { id: u.id, email: u.email, name: u.name, created_at: u.created_at }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginOutput {
    pub user: UserView,
    pub session: SessionView,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered", body = crate::openapi::UserDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 409, description = "Conflict", body = crate::openapi::ErrorDoc)))]
pub async fn register(State(state): State<ServerState>, WithRejection(Json(input), _): WithRejection<Json<RegisterInput>, JsonApiError>) -> Result<Json<UserView>, JsonApiError> {
    let user = state.auth.register(input).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In", body = crate::openapi::LoginDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorDoc)))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, WithRejection(Json(input), _): WithRejection<Json<LoginInput>, JsonApiError>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(state.cookie_secure);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    let out = LoginOutput {
        user: session.user.into(),
        session: SessionView { id: session.session_id, token: session.token, expires_at: session.expires_at },
    };
    Ok((jar, Json(out)))
}

/// Always succeeds; a missing or unreadable token only clears the cookie.
#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(State(state): State<ServerState>, headers: HeaderMap, jar: CookieJar) -> (CookieJar, StatusCode) {
    if let Some(token) = token_from(&headers, &jar) {
        match state.auth.logout(&token).await {
            Ok(revoked) => debug!(revoked, "logout"),
            Err(AuthError::Unauthorized) => debug!("logout with stale token"),
            Err(e) => warn!(error = %e, code = e.code(), "logout failed"),
        }
    }
    let mut removal = Cookie::from(AUTH_COOKIE);
    removal.set_path("/");
    (jar.remove(removal), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user", body = crate::openapi::UserDoc), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorDoc)))]
pub async fn me(State(state): State<ServerState>, Extension(ctx): Extension<SessionContext>) -> Result<Json<UserView>, JsonApiError> {
    let user = state.auth.current_user(&ctx).await.map_err(|e| match e {
        // the session outlived its user
        AuthError::NotFound => JsonApiError::unauthorized("user no longer exists"),
        other => other.into(),
    })?;
    Ok(Json(user.into()))
}

/// `Authorization: Bearer <token>` wins; otherwise the `auth_token` cookie.
fn token_from(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    match bearer {
        Some(t) => Some(t.to_string()),
        None => jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()),
    }
}

/// Resolve the caller's session once and hand it to handlers as a
/// `SessionContext` request extension. Rejects with 401 otherwise.
pub async fn require_session(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = token_from(req.headers(), &jar) else {
        warn!(path = %path, "missing Authorization header and auth_token cookie");
        return Err(JsonApiError::unauthorized("authentication required"));
    };
    let ctx = state.auth.authenticate(&token).await.map_err(|e| {
        warn!(path = %path, error = %e, "session validation failed");
        JsonApiError::from(e)
    })?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
