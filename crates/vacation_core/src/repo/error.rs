//! Repository and persistence-context error type.

use crate::db::DbError;
use crate::model::validation::EntityValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error kinds surfaced by repositories and the persistence context.
///
/// Deleting an identifier that no longer resolves is not an error and has no
/// variant here.
#[derive(Debug)]
pub enum RepoError {
    /// A cardinality-strict lookup (`first`, `single`) matched nothing.
    NotFound { entity: &'static str },
    /// A single-cardinality lookup matched more than one entity.
    MultipleResults { entity: &'static str },
    Validation(EntityValidationError),
    Db(DbError),
    InvalidData(String),
    /// The entity set was asked to remove an entity the context does not track.
    NotTracked { entity: &'static str },
    /// A pending update matched no stored row at commit time.
    ConcurrencyConflict { entity: &'static str },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity } => write!(f, "no {entity} matched the query"),
            Self::MultipleResults { entity } => {
                write!(f, "more than one {entity} matched a single-result query")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::NotTracked { entity } => {
                write!(f, "{entity} is not tracked by the persistence context")
            }
            Self::ConcurrencyConflict { entity } => write!(
                f,
                "{entity} update affected no rows; the row was removed or changed concurrently"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::MultipleResults { .. }
            | Self::InvalidData(_)
            | Self::NotTracked { .. }
            | Self::ConcurrencyConflict { .. } => None,
        }
    }
}

impl From<EntityValidationError> for RepoError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
