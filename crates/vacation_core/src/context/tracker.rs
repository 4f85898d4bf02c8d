//! Change tracker: the per-context working set of tracked entities.
//!
//! # Invariants
//! - At most one entry per entity key and type.
//! - `Detached` is never stored; detaching drops the entry.
//! - Writes happen in tracking order so commits are deterministic.

use super::sql;
use super::state::EntityState;
use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use log::debug;
use rusqlite::{params_from_iter, Connection};
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Rows written by one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ChangeCounts {
    pub(crate) inserted: usize,
    pub(crate) updated: usize,
    pub(crate) deleted: usize,
}

impl ChangeCounts {
    pub(crate) fn total(self) -> usize {
        self.inserted + self.updated + self.deleted
    }

    fn merge(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.deleted += other.deleted;
    }
}

/// Result of consulting the working set before going to the store.
pub(crate) enum LocalLookup<T> {
    Live(T),
    Deleted,
    Untracked,
}

struct TrackedEntry<T> {
    entity: T,
    state: EntityState,
    seq: u64,
}

/// Tracked entries of a single entity type.
pub(crate) struct EntryTable<T: Entity> {
    entries: HashMap<T::Key, TrackedEntry<T>>,
    next_seq: u64,
}

impl<T: Entity> EntryTable<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn state_of(&self, key: &T::Key) -> EntityState {
        self.entries
            .get(key)
            .map_or(EntityState::Detached, |entry| entry.state)
    }

    pub(crate) fn lookup(&self, key: &T::Key) -> LocalLookup<T> {
        match self.entries.get(key) {
            Some(entry) if entry.state == EntityState::Deleted => LocalLookup::Deleted,
            Some(entry) => LocalLookup::Live(entry.entity.clone()),
            None => LocalLookup::Untracked,
        }
    }

    /// Tracked entities that are not pending delete, in tracking order.
    pub(crate) fn live(&self) -> Vec<T> {
        self.ordered()
            .into_iter()
            .filter(|entry| entry.state != EntityState::Deleted)
            .map(|entry| entry.entity.clone())
            .collect()
    }

    /// Assigns `state` to `entity`, storing the caller's value as the snapshot.
    ///
    /// Returns the previous state.
    pub(crate) fn set_state(&mut self, entity: &T, state: EntityState) -> EntityState {
        let key = entity.key();
        let previous = self.state_of(&key);

        match (previous, state) {
            (EntityState::Detached, EntityState::Detached) => {}
            (_, EntityState::Detached) | (EntityState::Added, EntityState::Deleted) => {
                // An added entity was never stored, so deleting it only forgets it.
                self.entries.remove(&key);
            }
            (EntityState::Detached, _) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.insert(
                    key,
                    TrackedEntry {
                        entity: entity.clone(),
                        state,
                        seq,
                    },
                );
            }
            (_, _) => {
                if let Some(entry) = self.entries.get_mut(&key) {
                    entry.entity = entity.clone();
                    entry.state = state;
                }
            }
        }

        previous
    }

    /// Identity resolution for a freshly loaded row.
    ///
    /// A tracked copy wins over the stored row; untracked rows start being
    /// tracked as `Unchanged`.
    pub(crate) fn resolve(&mut self, loaded: T) -> T {
        let key = loaded.key();
        if let Some(entry) = self.entries.get(&key) {
            return entry.entity.clone();
        }
        self.set_state(&loaded, EntityState::Unchanged);
        loaded
    }

    fn ordered(&self) -> Vec<&TrackedEntry<T>> {
        let mut entries: Vec<&TrackedEntry<T>> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }
}

/// Type-erased view over one `EntryTable<T>` used at commit time.
pub(crate) trait TrackedSet {
    fn entity_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn len(&self) -> usize;
    fn pending(&self) -> usize;
    fn validate_pending(&self) -> RepoResult<()>;
    fn write_upserts(&self, conn: &Connection) -> RepoResult<ChangeCounts>;
    fn write_deletes(&self, conn: &Connection) -> RepoResult<usize>;
    fn accept_changes(&mut self);
    fn clear(&mut self);
}

impl<T: Entity> TrackedSet for EntryTable<T> {
    fn entity_name(&self) -> &'static str {
        T::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state.is_pending())
            .count()
    }

    fn validate_pending(&self) -> RepoResult<()> {
        for entry in self.ordered() {
            if matches!(entry.state, EntityState::Added | EntityState::Modified) {
                entry.entity.validate()?;
            }
        }
        Ok(())
    }

    fn write_upserts(&self, conn: &Connection) -> RepoResult<ChangeCounts> {
        let insert_sql = sql::insert::<T>();
        let update_sql = sql::update::<T>();
        let mut counts = ChangeCounts::default();

        for entry in self.ordered() {
            match entry.state {
                EntityState::Added => {
                    conn.execute(&insert_sql, params_from_iter(entry.entity.column_values()))?;
                    counts.inserted += 1;
                }
                EntityState::Modified => {
                    if let Some(update_sql) = update_sql.as_deref() {
                        let changed = conn
                            .execute(update_sql, params_from_iter(sql::update_values(&entry.entity)))?;
                        if changed == 0 {
                            return Err(RepoError::ConcurrencyConflict { entity: T::NAME });
                        }
                    }
                    counts.updated += 1;
                }
                EntityState::Detached | EntityState::Unchanged | EntityState::Deleted => {}
            }
        }

        Ok(counts)
    }

    fn write_deletes(&self, conn: &Connection) -> RepoResult<usize> {
        let delete_sql = sql::delete::<T>();
        let mut deleted = 0;

        for entry in self.ordered() {
            if entry.state != EntityState::Deleted {
                continue;
            }
            let changed = conn.execute(
                &delete_sql,
                params_from_iter(T::key_values(&entry.entity.key())),
            )?;
            if changed == 0 {
                // Already gone (e.g. removed by a cascading delete in this commit).
                debug!(
                    "event=delete_skipped module=context entity={} reason=row_absent",
                    T::NAME
                );
                continue;
            }
            deleted += 1;
        }

        Ok(deleted)
    }

    fn accept_changes(&mut self) {
        self.entries
            .retain(|_, entry| entry.state != EntityState::Deleted);
        for entry in self.entries.values_mut() {
            entry.state = EntityState::Unchanged;
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// All entry tables of one context, in first-use order.
#[derive(Default)]
pub(crate) struct ChangeTracker {
    sets: Vec<Box<dyn TrackedSet>>,
    index: HashMap<TypeId, usize>,
}

impl ChangeTracker {
    pub(crate) fn table<T: Entity>(&self) -> Option<&EntryTable<T>> {
        let index = *self.index.get(&TypeId::of::<T>())?;
        self.sets.get(index)?.as_any().downcast_ref::<EntryTable<T>>()
    }

    pub(crate) fn table_mut<T: Entity>(&mut self) -> RepoResult<&mut EntryTable<T>> {
        let type_id = TypeId::of::<T>();
        let index = match self.index.get(&type_id) {
            Some(index) => *index,
            None => {
                self.sets.push(Box::new(EntryTable::<T>::new()));
                let index = self.sets.len() - 1;
                self.index.insert(type_id, index);
                index
            }
        };

        self.sets
            .get_mut(index)
            .and_then(|set| set.as_any_mut().downcast_mut::<EntryTable<T>>())
            .ok_or_else(|| {
                RepoError::InvalidData(format!("change tracker slot mismatch for {}", T::NAME))
            })
    }

    pub(crate) fn tracked_count(&self) -> usize {
        self.sets.iter().map(|set| set.len()).sum()
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.sets.iter().map(|set| set.pending()).sum()
    }

    pub(crate) fn validate_pending(&self) -> RepoResult<()> {
        self.sets.iter().try_for_each(|set| set.validate_pending())
    }

    /// Inserts/updates in first-use order, then deletes in reverse order.
    pub(crate) fn write_all(&self, conn: &Connection) -> RepoResult<ChangeCounts> {
        let mut counts = ChangeCounts::default();
        for set in &self.sets {
            counts.merge(set.write_upserts(conn)?);
        }
        for set in self.sets.iter().rev() {
            counts.deleted += set.write_deletes(conn)?;
        }
        Ok(counts)
    }

    pub(crate) fn accept_all(&mut self) {
        for set in &mut self.sets {
            set.accept_changes();
        }
    }

    pub(crate) fn clear(&mut self) {
        for set in &mut self.sets {
            set.clear();
        }
    }

    pub(crate) fn pending_by_entity(&self) -> Vec<(&'static str, usize)> {
        self.sets
            .iter()
            .map(|set| (set.entity_name(), set.pending()))
            .filter(|(_, pending)| *pending > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeTracker, EntryTable, LocalLookup};
    use crate::context::state::EntityState;
    use crate::model::role::Role;
    use crate::model::user::User;

    #[test]
    fn deleting_an_added_entry_detaches_it() {
        let mut table = EntryTable::<Role>::new();
        let role = Role::new("Employee");

        table.set_state(&role, EntityState::Added);
        let previous = table.set_state(&role, EntityState::Deleted);

        assert_eq!(previous, EntityState::Added);
        assert_eq!(table.state_of(&role.id), EntityState::Detached);
    }

    #[test]
    fn set_state_replaces_snapshot() {
        let mut table = EntryTable::<Role>::new();
        let mut role = Role::new("Employee");
        table.set_state(&role, EntityState::Unchanged);

        role.name = "Manager".to_string();
        table.set_state(&role, EntityState::Modified);

        match table.lookup(&role.id) {
            LocalLookup::Live(tracked) => assert_eq!(tracked.name, "Manager"),
            _ => panic!("role should be tracked"),
        }
    }

    #[test]
    fn resolve_prefers_tracked_copy() {
        let mut table = EntryTable::<Role>::new();
        let mut role = Role::new("Employee");
        table.set_state(&role, EntityState::Unchanged);
        let stored = role.clone();
        role.name = "Edited".to_string();
        table.set_state(&role, EntityState::Modified);

        let resolved = table.resolve(stored);
        assert_eq!(resolved.name, "Edited");
    }

    #[test]
    fn tracker_keeps_one_table_per_type() {
        let mut tracker = ChangeTracker::default();
        tracker
            .table_mut::<Role>()
            .unwrap()
            .set_state(&Role::new("A"), EntityState::Added);
        tracker
            .table_mut::<User>()
            .unwrap()
            .set_state(&User::new("a@x.com", "A"), EntityState::Added);
        tracker
            .table_mut::<Role>()
            .unwrap()
            .set_state(&Role::new("B"), EntityState::Unchanged);

        assert_eq!(tracker.tracked_count(), 3);
        assert_eq!(tracker.pending_count(), 2);
        assert_eq!(tracker.pending_by_entity(), vec![("Role", 1), ("User", 1)]);

        tracker.accept_all();
        assert_eq!(tracker.pending_count(), 0);
        assert!(tracker.table::<Role>().is_some());
    }
}
