//! User entity.
//!
//! # Invariants
//! - `id` is stable and never reused for another user.
//! - `email` is well-formed, normalized (`normalize_email`) and unique, and
//!   `full_name` is non-empty when written.
//! - `roles` is a navigation property: it is only populated by the
//!   `User::roles()` eager load and is never written by the user row.

use crate::context::{DbContext, Include};
use crate::model::entity::{optional_integer, uuid_column, uuid_value, Entity};
use crate::model::role::Role;
use crate::model::timestamp::{CreatedAt, LastModifiedAt, Timestamp};
use crate::model::validation::{require_non_empty, EntityValidationError};
use crate::repo::error::RepoResult;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

const USER_ROLES_SQL: &str = "SELECT r.id, r.name
FROM roles r
INNER JOIN user_roles ur ON ur.role_id = r.id
WHERE ur.user_id = ?1
ORDER BY r.name ASC, r.id ASC;";

/// Application user (an employee requesting or approving vacations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    /// Stamped by the repository on add.
    pub created_at: Option<Timestamp>,
    /// Stamped by the repository on add and update.
    pub last_modified_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
}

impl User {
    /// Creates a user with a generated stable ID and no timestamps.
    pub fn new(email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), email, full_name)
    }

    /// Creates a user with a caller-provided ID (imports, fixtures).
    ///
    /// `email` is stored normalized.
    pub fn with_id(id: UserId, email: impl Into<String>, full_name: impl Into<String>) -> Self {
        let email: String = email.into();
        Self {
            id,
            email: normalize_email(&email),
            full_name: full_name.into(),
            created_at: None,
            last_modified_at: None,
            roles: Vec::new(),
        }
    }

    /// Eager-load selector for the `roles` navigation property.
    pub fn roles() -> Include<User> {
        Include::new("roles", load_user_roles)
    }
}

fn load_user_roles(context: &DbContext<'_>, users: &mut [User]) -> RepoResult<()> {
    for user in users.iter_mut() {
        user.roles = context.load_by_sql::<Role>(USER_ROLES_SQL, vec![uuid_value(user.id)])?;
    }
    Ok(())
}

/// Canonical email form used for storage and lookups: trimmed, Unicode lowercase.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

impl CreatedAt for User {
    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_created_at(&mut self, at: Timestamp) {
        self.created_at = Some(at);
    }
}

impl LastModifiedAt for User {
    fn last_modified_at(&self) -> Option<Timestamp> {
        self.last_modified_at
    }

    fn set_last_modified_at(&mut self, at: Timestamp) {
        self.last_modified_at = Some(at);
    }
}

impl Entity for User {
    type Key = UserId;

    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
    const KEY_COLUMNS: &'static [&'static str] = &["id"];
    const COLUMNS: &'static [&'static str] =
        &["id", "email", "full_name", "created_at", "last_modified_at"];

    fn key(&self) -> UserId {
        self.id
    }

    fn key_values(key: &UserId) -> Vec<Value> {
        vec![uuid_value(*key)]
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            Value::Text(self.email.clone()),
            Value::Text(self.full_name.clone()),
            optional_integer(self.created_at),
            optional_integer(self.last_modified_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: uuid_column(row, Self::TABLE, "id")?,
            email: row.get("email")?,
            full_name: row.get("full_name")?,
            created_at: row.get("created_at")?,
            last_modified_at: row.get("last_modified_at")?,
            roles: Vec::new(),
        })
    }

    fn validate(&self) -> Result<(), EntityValidationError> {
        require_non_empty(Self::NAME, "email", &self.email)?;
        if !is_valid_email(self.email.trim()) {
            return Err(EntityValidationError::InvalidEmail(self.email.clone()));
        }
        if self.email != normalize_email(&self.email) {
            return Err(EntityValidationError::EmailNotNormalized(self.email.clone()));
        }
        require_non_empty(Self::NAME, "full_name", &self.full_name)
    }

    fn as_created_at_mut(&mut self) -> Option<&mut dyn CreatedAt> {
        Some(self)
    }

    fn as_last_modified_at_mut(&mut self) -> Option<&mut dyn LastModifiedAt> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, User};
    use crate::model::entity::Entity;
    use crate::model::validation::EntityValidationError;

    #[test]
    fn new_user_has_no_timestamps_or_roles() {
        let user = User::new("a@x.com", "A");
        assert!(!user.id.is_nil());
        assert_eq!(user.created_at, None);
        assert_eq!(user.last_modified_at, None);
        assert!(user.roles.is_empty());
    }

    #[test]
    fn validate_rejects_malformed_email_and_blank_name() {
        let mut user = User::new("not-an-email", "A");
        assert_eq!(
            user.validate(),
            Err(EntityValidationError::InvalidEmail("not-an-email".to_string()))
        );

        user.email = "a@x.com".to_string();
        user.full_name = "   ".to_string();
        assert_eq!(
            user.validate(),
            Err(EntityValidationError::EmptyField {
                entity: "User",
                field: "full_name"
            })
        );

        user.full_name = "A".to_string();
        assert!(user.validate().is_ok());
    }

    #[test]
    fn capabilities_are_exposed() {
        let mut user = User::new("a@x.com", "A");
        user.as_created_at_mut().unwrap().set_created_at(10);
        user.as_last_modified_at_mut()
            .unwrap()
            .set_last_modified_at(20);
        assert_eq!(user.created_at, Some(10));
        assert_eq!(user.last_modified_at, Some(20));
    }

    #[test]
    fn column_values_match_column_layout() {
        let user = User::new("a@x.com", "A");
        assert_eq!(user.column_values().len(), User::COLUMNS.len());
        assert_eq!(User::key_values(&user.id).len(), User::KEY_COLUMNS.len());
    }

    #[test]
    fn constructor_normalizes_email_including_non_ascii() {
        let user = User::new("  ÉLODIE@Example.COM ", "Élodie");
        assert_eq!(user.email, "élodie@example.com");
        assert_eq!(normalize_email("Élodie@example.com"), user.email);
        assert!(user.validate().is_ok());
    }

    #[test]
    fn validate_rejects_email_assigned_in_mixed_case() {
        let mut user = User::new("ana@example.com", "Ana");
        user.email = "ANA@example.com".to_string();
        assert_eq!(
            user.validate(),
            Err(EntityValidationError::EmailNotNormalized(
                "ANA@example.com".to_string()
            ))
        );
    }
}
