//! Mapping contract between entity types and SQLite tables.
//!
//! # Responsibility
//! - Describe table/column layout so the persistence context can build SQL
//!   generically.
//! - Expose optional timestamp capabilities as explicit probes.
//!
//! # Invariants
//! - `COLUMNS` contains every `KEY_COLUMNS` entry.
//! - `column_values()` yields exactly one value per `COLUMNS` entry, in order.
//! - `key_values()` yields exactly one value per `KEY_COLUMNS` entry, in order.

use crate::model::timestamp::{CreatedAt, LastModifiedAt};
use crate::model::validation::EntityValidationError;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use std::fmt::Debug;
use std::hash::Hash;
use uuid::Uuid;

/// A persistable record managed by a repository.
pub trait Entity: Clone + 'static {
    /// Primary key; composite keys use tuples.
    type Key: Clone + Eq + Hash + Debug + 'static;

    /// Entity name used in errors and log events.
    const NAME: &'static str;
    const TABLE: &'static str;
    const KEY_COLUMNS: &'static [&'static str];
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> Self::Key;

    fn key_values(key: &Self::Key) -> Vec<Value>;

    fn column_values(&self) -> Vec<Value>;

    /// Materializes one entity from a row selected with `COLUMNS`.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Checked before pending inserts/updates are written.
    fn validate(&self) -> Result<(), EntityValidationError> {
        Ok(())
    }

    /// Returns the created-at capability when this entity carries one.
    fn as_created_at_mut(&mut self) -> Option<&mut dyn CreatedAt> {
        None
    }

    /// Returns the last-modified-at capability when this entity carries one.
    fn as_last_modified_at_mut(&mut self) -> Option<&mut dyn LastModifiedAt> {
        None
    }
}

/// Reads a UUID stored as text in `column`.
pub(crate) fn uuid_column(row: &Row<'_>, table: &str, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

pub(crate) fn uuid_value(id: Uuid) -> Value {
    Value::Text(id.to_string())
}

pub(crate) fn optional_integer(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}
