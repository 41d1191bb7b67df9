use std::fmt;
use std::str::FromStr;

use sea_orm::{entity::prelude::*, sea_query::{Expr, StringLen}, Set, DatabaseConnection, QueryOrder};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, user};

/// Title shown for tasks without one.
pub const UNTITLED: &str = "Untitled";
pub const TITLE_MAX_LEN: usize = 255;

/// Task lifecycle flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TaskStatus {
    #[default]
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Approved")]
    Approved,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Approved => "Approved",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = errors::ModelError;

    /// Accepts the two status names, ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("pending") {
            Ok(TaskStatus::Pending)
        } else if s.eq_ignore_ascii_case("approved") {
            Ok(TaskStatus::Approved)
        } else {
            Err(errors::ModelError::Validation(format!("invalid status '{s}' (expected Pending or Approved)")))
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub status: TaskStatus,
    pub revision: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Owner }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::OwnerId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Owner.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Blank titles collapse to `None`; others are trimmed and length-checked.
pub fn normalize_title(title: Option<&str>) -> Result<Option<String>, errors::ModelError> {
    match title.map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) if t.chars().count() > TITLE_MAX_LEN => {
            Err(errors::ModelError::Validation(format!("title too long (<={TITLE_MAX_LEN})")))
        }
        Some(t) => Ok(Some(t.to_string())),
    }
}

/// Description must be present; an empty string is accepted.
pub fn validate_description(description: Option<&str>) -> Result<&str, errors::ModelError> {
    description.ok_or_else(|| errors::ModelError::Validation("description is required".into()))
}

pub async fn create(
    db: &DatabaseConnection,
    owner_id: Uuid,
    title: Option<String>,
    description: &str,
    status: TaskStatus,
) -> Result<Model, errors::ModelError> {
    let title = normalize_title(title.as_deref())?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        title: Set(title),
        description: Set(description.to_string()),
        status: Set(status),
        revision: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Tasks of one owner in insertion order.
pub async fn list_by_owner(db: &DatabaseConnection, owner_id: Uuid) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::OwnerId.eq(owner_id))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_owned(db: &DatabaseConnection, owner_id: Uuid, id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id(id)
        .filter(Column::OwnerId.eq(owner_id))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Overwrites the mutable fields only if the stored revision still equals
/// `expected_revision`. Returns the number of rows changed (0 or 1).
pub async fn replace_if_revision(
    db: &DatabaseConnection,
    owner_id: Uuid,
    id: Uuid,
    expected_revision: i32,
    title: Option<String>,
    description: &str,
    status: TaskStatus,
) -> Result<u64, errors::ModelError> {
    let title = normalize_title(title.as_deref())?;
    let res = Entity::update_many()
        .col_expr(Column::Title, Expr::value(title))
        .col_expr(Column::Description, Expr::value(description.to_string()))
        .col_expr(Column::Status, Expr::value(status.as_str()))
        .col_expr(Column::Revision, Expr::value(expected_revision + 1))
        .col_expr(Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(Column::Id.eq(id))
        .filter(Column::OwnerId.eq(owner_id))
        .filter(Column::Revision.eq(expected_revision))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected)
}

/// Returns true if a row was removed.
pub async fn delete_owned(db: &DatabaseConnection, owner_id: Uuid, id: Uuid) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::OwnerId.eq(owner_id))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}
