//! Memo domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one serialized shape for the remote store and the local cache.
//!
//! # Invariants
//! - Every memo is identified by a stable, non-empty `MemoId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod memo;
