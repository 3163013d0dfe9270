//! Core use-case helpers that sit beside the repository.
//!
//! # Responsibility
//! - Derive read projections (list previews) from stored memo bodies.

pub mod preview;
