//! Generic repository contract over one entity type.
//!
//! # Invariants
//! - Query-returning methods are lazy; nothing is read until the returned
//!   `Query` is executed.
//! - `find_by_id*` never fail for a missing key; they return `None`.
//! - Write methods only change tracking state; `DbContext::save_changes`
//!   commits.

use crate::context::{Include, Predicate, Query};
use crate::model::entity::Entity;
use crate::repo::error::RepoResult;

/// CRUD and query operations over a homogeneous collection of `T`.
#[allow(async_fn_in_trait)]
pub trait BaseRepository<T: Entity> {
    /// Every stored `T`.
    fn all(&self) -> Query<'_, T>;

    /// Every stored `T` with each navigation path in `includes` eagerly loaded.
    fn all_including(&self, includes: &[Include<T>]) -> Query<'_, T>;

    /// Stored `T` matching all `predicates`, applied in order.
    fn filter<'q, I>(&'q self, predicates: I) -> Query<'q, T>
    where
        I: IntoIterator<Item = Predicate<'q, T>>;

    fn any<P>(&self, predicate: P) -> RepoResult<bool>
    where
        P: Fn(&T) -> bool;

    fn first_or_default(&self) -> RepoResult<Option<T>>;

    fn first_or_default_where<P>(&self, predicate: P) -> RepoResult<Option<T>>
    where
        P: Fn(&T) -> bool;

    /// # Errors
    /// - `NotFound` when nothing is stored.
    fn first(&self) -> RepoResult<T>;

    /// # Errors
    /// - `NotFound` when nothing matches.
    fn first_where<P>(&self, predicate: P) -> RepoResult<T>
    where
        P: Fn(&T) -> bool;

    /// # Errors
    /// - `MultipleResults` when more than one entity is stored.
    fn single_or_default(&self) -> RepoResult<Option<T>>;

    /// # Errors
    /// - `MultipleResults` when more than one entity matches.
    fn single_or_default_where<P>(&self, predicate: P) -> RepoResult<Option<T>>
    where
        P: Fn(&T) -> bool;

    /// # Errors
    /// - `NotFound` for zero and `MultipleResults` for several stored entities.
    fn single(&self) -> RepoResult<T>;

    /// # Errors
    /// - `NotFound` for zero and `MultipleResults` for several matches.
    fn single_where<P>(&self, predicate: P) -> RepoResult<T>
    where
        P: Fn(&T) -> bool;

    /// Primary-key lookup; tracked entities are served without a store read.
    fn find_by_id(&self, id: &T::Key) -> RepoResult<Option<T>>;

    /// Suspendable variant of `find_by_id` with the same contract.
    async fn find_by_id_async(&self, id: &T::Key) -> RepoResult<Option<T>>;

    /// Registers a new entity, stamping its timestamp capabilities.
    fn add(&self, entity: &mut T) -> RepoResult<()>;

    /// Marks an entity modified, attaching it first when detached.
    fn update(&self, entity: &mut T) -> RepoResult<()>;

    /// Marks an entity pending delete.
    fn remove(&self, entity: &T) -> RepoResult<()>;

    /// Deletes by key; a key that no longer resolves is already removed.
    fn remove_by_id(&self, id: &T::Key) -> RepoResult<()>;

    /// Marks every entity pending delete as one batch.
    fn remove_range<'e, I>(&self, entities: I) -> RepoResult<()>
    where
        I: IntoIterator<Item = &'e T>,
        T: 'e;
}
