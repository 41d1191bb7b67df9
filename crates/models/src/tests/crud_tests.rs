use anyhow::Result;
use chrono::Duration;
use sea_orm::EntityTrait;
use uuid::Uuid;

use super::test_db;
use crate::{session, task, task::TaskStatus, user, user_credentials};

fn unique_email() -> String {
    format!("model_{}@example.com", Uuid::new_v4())
}

#[tokio::test]
async fn test_user_crud() -> Result<()> {
    let Some(db) = test_db().await? else { return Ok(()) };

    let email = unique_email();
    let created = user::create(&db, &email.to_uppercase(), " Model User ").await?;
    assert_eq!(created.email, email);
    assert_eq!(created.name, "Model User");

    let found = user::find_by_email(&db, &email).await?.expect("user by email");
    assert_eq!(found.id, created.id);

    // Unique email is enforced by the table
    assert!(user::create(&db, &email, "Other").await.is_err());

    user::hard_delete(&db, created.id).await?;
    assert!(user::Entity::find_by_id(created.id).one(&db).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_credentials_upsert() -> Result<()> {
    let Some(db) = test_db().await? else { return Ok(()) };

    let u = user::create(&db, &unique_email(), "Cred").await?;
    let first = user_credentials::upsert_password(&db, u.id, "hash-1".into(), "argon2").await?;
    let second = user_credentials::upsert_password(&db, u.id, "hash-2".into(), "argon2").await?;
    assert_eq!(first.id, second.id);
    assert_eq!(second.password_hash, "hash-2");
    assert!(user_credentials::upsert_password(&db, u.id, " ".into(), "argon2").await.is_err());

    user::hard_delete(&db, u.id).await?;
    assert!(user_credentials::find_by_user(&db, u.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_session_revoke() -> Result<()> {
    let Some(db) = test_db().await? else { return Ok(()) };

    let u = user::create(&db, &unique_email(), "Sess").await?;
    let s = session::create(&db, u.id, Duration::hours(1)).await?;
    assert!(s.is_live());

    assert!(session::revoke(&db, s.id).await?);
    assert!(!session::revoke(&db, s.id).await?);
    let after = session::find(&db, s.id).await?.expect("session row");
    assert!(!after.is_live());

    user::hard_delete(&db, u.id).await?;
    Ok(())
}

#[tokio::test]
async fn test_task_crud_and_revision() -> Result<()> {
    let Some(db) = test_db().await? else { return Ok(()) };

    let owner = user::create(&db, &unique_email(), "Owner").await?;
    let other = user::create(&db, &unique_email(), "Other").await?;

    let t = task::create(&db, owner.id, None, "Buy milk", TaskStatus::default()).await?;
    assert_eq!(t.status, TaskStatus::Pending);
    assert_eq!(t.revision, 1);
    assert_eq!(t.title, None);

    let second = task::create(&db, owner.id, Some("Second".into()), "", TaskStatus::Approved).await?;
    let listed = task::list_by_owner(&db, owner.id).await?;
    assert_eq!(listed.iter().map(|t| t.id).collect::<Vec<_>>(), vec![t.id, second.id]);
    assert!(task::list_by_owner(&db, other.id).await?.is_empty());

    // Foreign owner cannot see or change it
    assert!(task::find_owned(&db, other.id, t.id).await?.is_none());
    assert_eq!(task::replace_if_revision(&db, other.id, t.id, 1, None, "x", TaskStatus::Approved).await?, 0);
    assert!(!task::delete_owned(&db, other.id, t.id).await?);

    // Stale revision matches nothing
    assert_eq!(task::replace_if_revision(&db, owner.id, t.id, 7, None, "x", TaskStatus::Approved).await?, 0);
    assert_eq!(task::replace_if_revision(&db, owner.id, t.id, 1, Some("Milk".into()), "Buy milk", TaskStatus::Approved).await?, 1);

    let updated = task::find_owned(&db, owner.id, t.id).await?.expect("task");
    assert_eq!(updated.status, TaskStatus::Approved);
    assert_eq!(updated.revision, 2);
    assert_eq!(updated.title.as_deref(), Some("Milk"));
    assert_eq!(updated.created_at, t.created_at);

    assert!(task::delete_owned(&db, owner.id, t.id).await?);
    assert!(task::find_owned(&db, owner.id, t.id).await?.is_none());

    // Deleting the owner cascades to remaining tasks
    user::hard_delete(&db, owner.id).await?;
    assert!(task::Entity::find_by_id(second.id).one(&db).await?.is_none());
    user::hard_delete(&db, other.id).await?;
    Ok(())
}
