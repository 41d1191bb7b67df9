use chrono::{Duration, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, SessionRecord};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn to_user(u: models::user::Model) -> AuthUser {
    AuthUser { id: u.id, email: u.email, name: u.name, created_at: u.created_at.with_timezone(&Utc) }
}

fn to_session(s: models::session::Model) -> SessionRecord {
    SessionRecord {
        id: s.id,
        user_id: s.user_id,
        created_at: s.created_at.with_timezone(&Utc),
        expires_at: s.expires_at.with_timezone(&Utc),
        revoked_at: s.revoked_at.map(|t| t.with_timezone(&Utc)),
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::find_by_email(&self.db, email).await?;
        Ok(res.map(to_user))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_user))
    }

    async fn create_user_with_password(
        &self,
        email: &str,
        name: &str,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError> {
        let txn = self.db.begin().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        // dropping txn on an early return rolls both writes back
        let created = models::user::create(&txn, email, name).await?;
        models::user_credentials::upsert_password(&txn, created.id, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(to_user(created))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> Result<SessionRecord, AuthError> {
        let s = models::session::create(&self.db, user_id, ttl).await?;
        Ok(to_session(s))
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<SessionRecord>, AuthError> {
        let s = models::session::find(&self.db, id).await?;
        Ok(s.map(to_session))
    }

    async fn revoke_session(&self, id: Uuid) -> Result<bool, AuthError> {
        Ok(models::session::revoke(&self.db, id).await?)
    }
}
