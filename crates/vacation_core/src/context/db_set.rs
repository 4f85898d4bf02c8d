//! Typed entity-set accessor bound to one `DbContext`.

use super::db_context::DbContext;
use super::query::Query;
use super::state::EntityState;
use super::tracker::LocalLookup;
use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use std::marker::PhantomData;

/// Entry point for tracking and loading entities of one type.
pub struct DbSet<'ctx, T: Entity> {
    context: &'ctx DbContext<'ctx>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for DbSet<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Entity> Copy for DbSet<'_, T> {}

impl<'ctx, T: Entity> DbSet<'ctx, T> {
    pub(crate) fn new(context: &'ctx DbContext<'ctx>) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    /// Registers `entity` as a new entity pending insert.
    pub fn add(&self, entity: &T) -> RepoResult<()> {
        self.context.set_state(entity, EntityState::Added)
    }

    /// Starts tracking `entity` as `Unchanged`.
    ///
    /// Attaching an entity that is already tracked resets it to `Unchanged`
    /// with the caller's value.
    pub fn attach(&self, entity: &T) -> RepoResult<()> {
        self.context.set_state(entity, EntityState::Unchanged)
    }

    /// Marks a tracked entity pending delete.
    ///
    /// # Errors
    /// - `NotTracked` when the context does not track `entity`.
    pub fn remove(&self, entity: &T) -> RepoResult<()> {
        self.ensure_tracked(entity)?;
        self.context.set_state(entity, EntityState::Deleted)
    }

    /// Marks every entity pending delete as one batch.
    ///
    /// The whole batch is checked before any state changes, so a `NotTracked`
    /// error leaves every entity as it was.
    pub fn remove_range<'e, I>(&self, entities: I) -> RepoResult<()>
    where
        I: IntoIterator<Item = &'e T>,
        T: 'e,
    {
        let batch: Vec<&T> = entities.into_iter().collect();
        for entity in &batch {
            self.ensure_tracked(entity)?;
        }
        for entity in batch {
            self.context.set_state(entity, EntityState::Deleted)?;
        }
        Ok(())
    }

    /// Finds an entity by key, consulting the working set before the store.
    ///
    /// A tracked entity pending delete is reported absent.
    pub fn find(&self, key: &T::Key) -> RepoResult<Option<T>> {
        match self.context.lookup_local::<T>(key) {
            LocalLookup::Live(entity) => Ok(Some(entity)),
            LocalLookup::Deleted => Ok(None),
            LocalLookup::Untracked => self.context.load_by_key::<T>(key),
        }
    }

    /// Same as `find`, yielding to the executor before the store round trip.
    pub async fn find_async(&self, key: &T::Key) -> RepoResult<Option<T>> {
        match self.context.lookup_local::<T>(key) {
            LocalLookup::Live(entity) => Ok(Some(entity)),
            LocalLookup::Deleted => Ok(None),
            LocalLookup::Untracked => {
                tokio::task::yield_now().await;
                self.context.load_by_key::<T>(key)
            }
        }
    }

    /// Tracked entities not pending delete, without touching the store.
    pub fn local(&self) -> Vec<T> {
        self.context.live::<T>()
    }

    /// Lazy query over all stored entities of this type.
    pub fn query(&self) -> Query<'ctx, T> {
        Query::new(self.context)
    }

    fn ensure_tracked(&self, entity: &T) -> RepoResult<()> {
        if self.context.state_of::<T>(&entity.key()) == EntityState::Detached {
            return Err(RepoError::NotTracked { entity: T::NAME });
        }
        Ok(())
    }
}
