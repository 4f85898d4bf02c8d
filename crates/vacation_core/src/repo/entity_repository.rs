//! `BaseRepository` implementation bound to one `DbContext`.
//!
//! # Responsibility
//! - Stamp timestamp capabilities on add/update.
//! - Drive entity lifecycle transitions through the context.
//! - Delegate every read to the context's query capability.
//!
//! # Invariants
//! - Callers never set created-at/last-modified-at themselves.
//! - Add never registers an already-tracked entity twice.
//! - Delete by id is idempotent.

use crate::context::{DbContext, DbSet, EntityState, Include, Predicate, Query};
use crate::model::entity::Entity;
use crate::repo::base_repository::BaseRepository;
use crate::repo::error::RepoResult;
use log::debug;

/// Repository for entity type `T` over a shared persistence context.
pub struct EntityRepository<'ctx, T: Entity> {
    context: &'ctx DbContext<'ctx>,
    set: DbSet<'ctx, T>,
}

impl<'ctx, T: Entity> EntityRepository<'ctx, T> {
    pub fn new(context: &'ctx DbContext<'ctx>) -> Self {
        Self {
            context,
            set: context.set::<T>(),
        }
    }

    pub fn context(&self) -> &'ctx DbContext<'ctx> {
        self.context
    }

    /// Tracking state of `entity` in the bound context.
    pub fn state_of(&self, entity: &T) -> EntityState {
        self.context.state_of::<T>(&entity.key())
    }
}

impl<T: Entity> BaseRepository<T> for EntityRepository<'_, T> {
    fn all(&self) -> Query<'_, T> {
        self.set.query()
    }

    fn all_including(&self, includes: &[Include<T>]) -> Query<'_, T> {
        includes
            .iter()
            .fold(self.all(), |query, include| query.include(*include))
    }

    fn filter<'q, I>(&'q self, predicates: I) -> Query<'q, T>
    where
        I: IntoIterator<Item = Predicate<'q, T>>,
    {
        self.all().with_predicates(predicates)
    }

    fn any<P>(&self, predicate: P) -> RepoResult<bool>
    where
        P: Fn(&T) -> bool,
    {
        self.all().filter(predicate).any()
    }

    fn first_or_default(&self) -> RepoResult<Option<T>> {
        self.all().first_or_default()
    }

    fn first_or_default_where<P>(&self, predicate: P) -> RepoResult<Option<T>>
    where
        P: Fn(&T) -> bool,
    {
        self.all().filter(predicate).first_or_default()
    }

    fn first(&self) -> RepoResult<T> {
        self.all().first()
    }

    fn first_where<P>(&self, predicate: P) -> RepoResult<T>
    where
        P: Fn(&T) -> bool,
    {
        self.all().filter(predicate).first()
    }

    fn single_or_default(&self) -> RepoResult<Option<T>> {
        self.all().single_or_default()
    }

    fn single_or_default_where<P>(&self, predicate: P) -> RepoResult<Option<T>>
    where
        P: Fn(&T) -> bool,
    {
        self.all().filter(predicate).single_or_default()
    }

    fn single(&self) -> RepoResult<T> {
        self.all().single()
    }

    fn single_where<P>(&self, predicate: P) -> RepoResult<T>
    where
        P: Fn(&T) -> bool,
    {
        self.all().filter(predicate).single()
    }

    fn find_by_id(&self, id: &T::Key) -> RepoResult<Option<T>> {
        self.set.find(id)
    }

    async fn find_by_id_async(&self, id: &T::Key) -> RepoResult<Option<T>> {
        self.set.find_async(id).await
    }

    fn add(&self, entity: &mut T) -> RepoResult<()> {
        let now = self.context.now();
        if let Some(created) = entity.as_created_at_mut() {
            created.set_created_at(now);
        }
        if let Some(modified) = entity.as_last_modified_at_mut() {
            modified.set_last_modified_at(now);
        }

        if self.state_of(entity) != EntityState::Detached {
            debug!(
                "event=repo_add module=repo entity={} path=tracked",
                T::NAME
            );
            self.context.set_state(entity, EntityState::Added)
        } else {
            debug!("event=repo_add module=repo entity={} path=new", T::NAME);
            self.set.add(entity)
        }
    }

    fn update(&self, entity: &mut T) -> RepoResult<()> {
        if let Some(modified) = entity.as_last_modified_at_mut() {
            // Last-modified never moves backwards, even if the clock does.
            let now = self.context.now();
            let stamp = modified.last_modified_at().map_or(now, |previous| previous.max(now));
            modified.set_last_modified_at(stamp);
        }

        if self.state_of(entity) == EntityState::Detached {
            debug!(
                "event=repo_update module=repo entity={} path=attach",
                T::NAME
            );
            self.set.attach(entity)?;
        }
        self.context.set_state(entity, EntityState::Modified)
    }

    fn remove(&self, entity: &T) -> RepoResult<()> {
        if self.state_of(entity) != EntityState::Deleted {
            return self.context.set_state(entity, EntityState::Deleted);
        }

        // Tracking was reset to deleted elsewhere: re-attach, then remove explicitly.
        debug!(
            "event=repo_remove module=repo entity={} path=reattach",
            T::NAME
        );
        self.set.attach(entity)?;
        self.set.remove(entity)
    }

    fn remove_by_id(&self, id: &T::Key) -> RepoResult<()> {
        match self.find_by_id(id)? {
            Some(entity) => self.remove(&entity),
            None => {
                debug!(
                    "event=repo_remove module=repo entity={} path=already_absent",
                    T::NAME
                );
                Ok(())
            }
        }
    }

    fn remove_range<'e, I>(&self, entities: I) -> RepoResult<()>
    where
        I: IntoIterator<Item = &'e T>,
        T: 'e,
    {
        self.set.remove_range(entities)
    }
}
