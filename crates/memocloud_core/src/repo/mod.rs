//! Repository layer: local cache persistence and memo orchestration.
//!
//! # Responsibility
//! - Define the local cache contract and its SQLite implementation.
//! - Own the in-memory memo collection and keep it consistent with the
//!   remote store and the local cache mirror.
//!
//! # Invariants
//! - The in-memory collection is authoritative during a session.
//! - Every collection mutation is mirrored to the local cache in full.

pub mod cache_repo;
pub mod memo_repo;
