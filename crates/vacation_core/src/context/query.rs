//! Lazy queries and eager-load selectors.
//!
//! A `Query` only records includes and predicates; nothing is read until a
//! terminal method (`to_vec`, `first`, `single`, `any`, `count`, ...) runs.

use super::db_context::DbContext;
use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use std::fmt::{Debug, Formatter};

/// Boxed row predicate; several predicates combine with logical AND.
pub type Predicate<'q, T> = Box<dyn Fn(&T) -> bool + 'q>;

/// Boxes a closure as a `Predicate`.
pub fn predicate<'q, T, F>(f: F) -> Predicate<'q, T>
where
    F: Fn(&T) -> bool + 'q,
{
    Box::new(f)
}

type IncludeLoader<T> = fn(&DbContext<'_>, &mut [T]) -> RepoResult<()>;

/// Eager-load selector naming one navigation path of `T`.
pub struct Include<T> {
    path: &'static str,
    load: IncludeLoader<T>,
}

impl<T> Include<T> {
    pub const fn new(path: &'static str, load: IncludeLoader<T>) -> Self {
        Self { path, load }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Loads this navigation path into already materialized entities.
    pub fn apply(&self, context: &DbContext<'_>, items: &mut [T]) -> RepoResult<()> {
        (self.load)(context, items)
    }
}

impl<T> Clone for Include<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Include<T> {}

impl<T> Debug for Include<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Include").field("path", &self.path).finish()
    }
}

/// Deferred read over all stored `T`.
///
/// Execution reads the store, resolves identities against the context's
/// working set, runs includes, then keeps rows matching every predicate in
/// the order they were added. Pending inserts are not visible.
pub struct Query<'q, T: Entity> {
    context: &'q DbContext<'q>,
    includes: Vec<Include<T>>,
    predicates: Vec<Predicate<'q, T>>,
}

impl<'q, T: Entity> Query<'q, T> {
    pub(crate) fn new(context: &'q DbContext<'q>) -> Self {
        Self {
            context,
            includes: Vec::new(),
            predicates: Vec::new(),
        }
    }

    /// Adds an eager-load selector.
    pub fn include(mut self, include: Include<T>) -> Self {
        self.includes.push(include);
        self
    }

    /// Adds a predicate, ANDed with those already present.
    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> bool + 'q,
    {
        self.predicates.push(Box::new(f));
        self
    }

    pub(crate) fn with_predicates<I>(mut self, predicates: I) -> Self
    where
        I: IntoIterator<Item = Predicate<'q, T>>,
    {
        self.predicates.extend(predicates);
        self
    }

    /// Navigation paths this query will eager-load.
    pub fn include_paths(&self) -> Vec<&'static str> {
        self.includes.iter().map(Include::path).collect()
    }

    /// Executes the query.
    pub fn to_vec(&self) -> RepoResult<Vec<T>> {
        let mut items = self.context.load_all::<T>()?;
        for include in &self.includes {
            include.apply(self.context, &mut items)?;
        }
        items.retain(|item| self.matches(item));
        Ok(items)
    }

    pub fn count(&self) -> RepoResult<usize> {
        Ok(self.to_vec()?.len())
    }

    pub fn any(&self) -> RepoResult<bool> {
        Ok(!self.to_vec()?.is_empty())
    }

    /// First match, or `NotFound` when nothing matches.
    pub fn first(&self) -> RepoResult<T> {
        self.first_or_default()?
            .ok_or(RepoError::NotFound { entity: T::NAME })
    }

    pub fn first_or_default(&self) -> RepoResult<Option<T>> {
        Ok(self.to_vec()?.into_iter().next())
    }

    /// The only match; `NotFound` for none, `MultipleResults` for several.
    pub fn single(&self) -> RepoResult<T> {
        self.single_or_default()?
            .ok_or(RepoError::NotFound { entity: T::NAME })
    }

    /// The only match or `None`; `MultipleResults` for several.
    pub fn single_or_default(&self) -> RepoResult<Option<T>> {
        let mut items = self.to_vec()?.into_iter();
        let first = items.next();
        if items.next().is_some() {
            return Err(RepoError::MultipleResults { entity: T::NAME });
        }
        Ok(first)
    }

    fn matches(&self, item: &T) -> bool {
        self.predicates.iter().all(|predicate| predicate(item))
    }
}
