//! Role entity and the user-role association.

use crate::model::entity::{optional_integer, uuid_column, uuid_value, Entity};
use crate::model::timestamp::{CreatedAt, Timestamp};
use crate::model::user::UserId;
use crate::model::validation::{require_non_empty, EntityValidationError};
use crate::repo::error::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RoleId = Uuid;

/// Named permission group a user can hold (e.g. `Employee`, `TeamLead`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Entity for Role {
    type Key = RoleId;

    const NAME: &'static str = "Role";
    const TABLE: &'static str = "roles";
    const KEY_COLUMNS: &'static [&'static str] = &["id"];
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    fn key(&self) -> RoleId {
        self.id
    }

    fn key_values(key: &RoleId) -> Vec<Value> {
        vec![uuid_value(*key)]
    }

    fn column_values(&self) -> Vec<Value> {
        vec![uuid_value(self.id), Value::Text(self.name.clone())]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: uuid_column(row, Self::TABLE, "id")?,
            name: row.get("name")?,
        })
    }

    fn validate(&self) -> Result<(), EntityValidationError> {
        require_non_empty(Self::NAME, "name", &self.name)
    }
}

/// Membership of one user in one role.
///
/// Keyed by `(user_id, role_id)`; carries only a creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub created_at: Option<Timestamp>,
}

impl UserRole {
    pub fn new(user_id: UserId, role_id: RoleId) -> Self {
        Self {
            user_id,
            role_id,
            created_at: None,
        }
    }
}

impl CreatedAt for UserRole {
    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_created_at(&mut self, at: Timestamp) {
        self.created_at = Some(at);
    }
}

impl Entity for UserRole {
    type Key = (UserId, RoleId);

    const NAME: &'static str = "UserRole";
    const TABLE: &'static str = "user_roles";
    const KEY_COLUMNS: &'static [&'static str] = &["user_id", "role_id"];
    const COLUMNS: &'static [&'static str] = &["user_id", "role_id", "created_at"];

    fn key(&self) -> Self::Key {
        (self.user_id, self.role_id)
    }

    fn key_values(key: &Self::Key) -> Vec<Value> {
        vec![uuid_value(key.0), uuid_value(key.1)]
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.user_id),
            uuid_value(self.role_id),
            optional_integer(self.created_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            user_id: uuid_column(row, Self::TABLE, "user_id")?,
            role_id: uuid_column(row, Self::TABLE, "role_id")?,
            created_at: row.get("created_at")?,
        })
    }

    fn as_created_at_mut(&mut self) -> Option<&mut dyn CreatedAt> {
        Some(self)
    }
}
