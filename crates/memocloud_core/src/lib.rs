//! Core domain logic for MemoCloud.
//! Memo persistence with a WebDAV primary store and a SQLite local cache.

pub mod config;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod remote;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError, LoginCredentials, RemoteConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use editor::{BlockKind, EditorError, MarkupEditor, RichTextEditor};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::memo::{Memo, MemoContent, MemoId, MemoValidationError};
pub use remote::{RemoteEntry, RemoteError, RemoteStore, WebDavStore};
pub use repo::cache_repo::{CacheError, LocalCache, SqliteLocalCache};
pub use repo::memo_repo::{
    DeleteReport, LoadReport, LoadSource, LoginOutcome, MemoError, MemoRepository,
    ReconcileReport, SaveReport,
};
pub use service::preview::derive_memo_preview;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
