//! Persistence context over one SQLite connection.
//!
//! # Responsibility
//! - Own the working set of tracked entities and their lifecycle states.
//! - Execute store reads with identity resolution against the working set.
//! - Commit pending inserts/updates/deletes in one transaction.
//!
//! # Invariants
//! - One context belongs to one logical unit of work on one thread; the type
//!   is `!Sync`.
//! - Nothing reaches storage before `save_changes`.
//! - A failed commit leaves both the store and the working set unchanged.

use super::db_set::DbSet;
use super::query::Query;
use super::sql;
use super::state::EntityState;
use super::tracker::{ChangeTracker, LocalLookup};
use crate::model::entity::Entity;
use crate::model::timestamp::{Clock, SystemClock, Timestamp};
use crate::repo::error::RepoResult;
use log::{debug, error, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::cell::RefCell;
use std::time::Instant;

/// Unit-of-work boundary and change tracker for a migrated connection.
pub struct DbContext<'conn> {
    conn: &'conn Connection,
    clock: Box<dyn Clock>,
    tracker: RefCell<ChangeTracker>,
}

impl<'conn> DbContext<'conn> {
    /// Creates a context reading time from the system clock.
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_clock(conn, SystemClock)
    }

    /// Creates a context with a caller-provided clock.
    pub fn with_clock(conn: &'conn Connection, clock: impl Clock + 'static) -> Self {
        Self {
            conn,
            clock: Box::new(clock),
            tracker: RefCell::new(ChangeTracker::default()),
        }
    }

    /// Current UTC time according to this context's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Typed entity-set accessor.
    pub fn set<T: Entity>(&self) -> DbSet<'_, T> {
        DbSet::new(self)
    }

    /// Lazy query over all stored `T`.
    pub fn query<T: Entity>(&self) -> Query<'_, T> {
        Query::new(self)
    }

    /// Tracking state of the entity with `key`; `Detached` when untracked.
    pub fn state_of<T: Entity>(&self, key: &T::Key) -> EntityState {
        self.tracker
            .borrow()
            .table::<T>()
            .map_or(EntityState::Detached, |table| table.state_of(key))
    }

    /// Forces `entity` into `state`, tracking it if needed.
    ///
    /// The caller's value replaces the tracked snapshot. Moving an `Added`
    /// entity to `Deleted` detaches it; moving to `Detached` stops tracking.
    pub fn set_state<T: Entity>(&self, entity: &T, state: EntityState) -> RepoResult<()> {
        let previous = self
            .tracker
            .borrow_mut()
            .table_mut::<T>()?
            .set_state(entity, state);
        debug!(
            "event=state_change module=context entity={} from={} to={}",
            T::NAME,
            previous,
            state
        );
        Ok(())
    }

    /// Number of tracked entities across all types.
    pub fn tracked_count(&self) -> usize {
        self.tracker.borrow().tracked_count()
    }

    /// Whether the next `save_changes` would write anything.
    pub fn has_changes(&self) -> bool {
        self.tracker.borrow().pending_count() > 0
    }

    /// Drops every tracked entity without writing.
    pub fn discard_changes(&self) {
        let mut tracker = self.tracker.borrow_mut();
        let pending = tracker.pending_count();
        tracker.clear();
        info!("event=discard_changes module=context status=ok pending_dropped={pending}");
    }

    /// Commits all pending changes in one transaction.
    ///
    /// Returns the number of stored rows inserted, updated or deleted; a
    /// pending delete whose row is already gone is accepted but not counted.
    /// On failure the transaction is rolled back and tracked states are left
    /// as they were.
    ///
    /// # Errors
    /// - `Validation` when a pending insert/update fails `Entity::validate`.
    /// - `ConcurrencyConflict` when a pending update matches no stored row.
    /// - `Db` for any SQLite failure, including deferred foreign-key checks.
    pub fn save_changes(&self) -> RepoResult<usize> {
        let started_at = Instant::now();
        let mut tracker = self.tracker.borrow_mut();
        if tracker.pending_count() == 0 {
            return Ok(0);
        }

        let outcome = tracker.validate_pending().and_then(|()| {
            let tx = self.conn.unchecked_transaction()?;
            let counts = tracker.write_all(&tx)?;
            tx.commit()?;
            Ok(counts)
        });

        match outcome {
            Ok(counts) => {
                tracker.accept_all();
                info!(
                    "event=save_changes module=context status=ok inserted={} updated={} deleted={} duration_ms={}",
                    counts.inserted,
                    counts.updated,
                    counts.deleted,
                    started_at.elapsed().as_millis()
                );
                Ok(counts.total())
            }
            Err(err) => {
                error!(
                    "event=save_changes module=context status=error pending={:?} duration_ms={} error={}",
                    tracker.pending_by_entity(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Runs `sql` and materializes each row as `T` with identity resolution.
    ///
    /// The statement must select every `T::COLUMNS` entry by name. Rows that
    /// are not tracked yet become tracked as `Unchanged`.
    pub fn load_by_sql<T: Entity>(&self, sql: &str, params: Vec<Value>) -> RepoResult<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut loaded = Vec::new();
        while let Some(row) = rows.next()? {
            loaded.push(T::from_row(row)?);
        }

        let mut tracker = self.tracker.borrow_mut();
        let table = tracker.table_mut::<T>()?;
        Ok(loaded
            .into_iter()
            .map(|entity| table.resolve(entity))
            .collect())
    }

    pub(crate) fn load_all<T: Entity>(&self) -> RepoResult<Vec<T>> {
        self.load_by_sql(&sql::select_all::<T>(), Vec::new())
    }

    /// Consults the working set only.
    pub(crate) fn lookup_local<T: Entity>(&self, key: &T::Key) -> LocalLookup<T> {
        self.tracker
            .borrow()
            .table::<T>()
            .map_or(LocalLookup::Untracked, |table| table.lookup(key))
    }

    /// Loads one row by key from the store.
    pub(crate) fn load_by_key<T: Entity>(&self, key: &T::Key) -> RepoResult<Option<T>> {
        let found = self.load_by_sql::<T>(&sql::select_by_key::<T>(), T::key_values(key))?;
        Ok(found.into_iter().next())
    }

    /// Tracked entities of type `T` that are not pending delete.
    pub(crate) fn live<T: Entity>(&self) -> Vec<T> {
        self.tracker
            .borrow()
            .table::<T>()
            .map_or_else(Vec::new, |table| table.live())
    }
}
