//! Entity and view-model definitions.
//!
//! # Responsibility
//! - Declare the mapping contract every persistable entity implements.
//! - Declare the optional timestamp capabilities the repository stamps.
//! - Define the user/role entities and the user-facing view models.
//!
//! # Invariants
//! - Every entity is identified by a stable key that never changes after
//!   creation.
//! - Timestamp capabilities are probed through `Entity`, never through
//!   concrete types.

pub mod entity;
pub mod role;
pub mod timestamp;
pub mod user;
pub mod validation;
pub mod view;
