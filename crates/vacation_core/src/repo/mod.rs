//! Repository layer: the generic contract and its context-bound implementation.
//!
//! # Responsibility
//! - Define storage-independent CRUD/query operations over one entity type.
//! - Translate those operations into persistence-context calls.
//!
//! # Invariants
//! - Repositories return semantic errors (`NotFound`, `MultipleResults`) in
//!   addition to storage errors, which pass through unmodified.

pub mod base_repository;
pub mod entity_repository;
pub mod error;
