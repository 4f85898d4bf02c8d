//! Core data-access layer for the vacation management app.
//! This crate is the single source of truth for persistence invariants.

pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use context::{predicate, DbContext, DbSet, EntityState, Include, Predicate, Query};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig};
pub use model::entity::Entity;
pub use model::role::{Role, RoleId, UserRole};
pub use model::timestamp::{Clock, CreatedAt, LastModifiedAt, SystemClock, Timestamp};
pub use model::user::{normalize_email, User, UserId};
pub use model::validation::EntityValidationError;
pub use model::view::{RoleViewModel, UserViewModel};
pub use repo::base_repository::BaseRepository;
pub use repo::entity_repository::EntityRepository;
pub use repo::error::{RepoError, RepoResult};
pub use service::user_service::{UserService, UserServiceError, UserServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
