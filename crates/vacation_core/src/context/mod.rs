//! Persistence context: change tracking, queries and the commit boundary.
//!
//! # Responsibility
//! - Track entity lifecycle states (`EntityState`) per context.
//! - Translate `Entity` mappings into SQLite reads and writes.
//! - Compose eager loads (`Include`) and in-process predicates.
//!
//! # Invariants
//! - Lifecycle state lives only in the context; repositories never copy it.
//! - Storage is written only by `DbContext::save_changes`.

mod db_context;
mod db_set;
mod query;
mod sql;
mod state;
mod tracker;

pub use db_context::DbContext;
pub use db_set::DbSet;
pub use query::{predicate, Include, Predicate, Query};
pub use state::EntityState;
