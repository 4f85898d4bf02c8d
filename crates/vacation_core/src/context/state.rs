//! Entity lifecycle states tracked by the persistence context.

use std::fmt::{Display, Formatter};

/// Tracking state of one entity inside a `DbContext` working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Not registered with the context.
    Detached,
    /// Tracked and identical to the stored row as far as the context knows.
    Unchanged,
    /// Pending insert at the next commit.
    Added,
    /// Pending update at the next commit.
    Modified,
    /// Pending delete at the next commit.
    Deleted,
}

impl EntityState {
    /// Whether the next commit writes something for this entry.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Added | Self::Modified | Self::Deleted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }
}

impl Display for EntityState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
