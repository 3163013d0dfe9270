//! Local cache contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide a device-local key-value area that survives restarts.
//! - Keep SQL details inside the cache persistence boundary.
//!
//! # Invariants
//! - `set` overwrites the previous value for a key.
//! - `remove` on a missing key is not an error.

use crate::db::DbError;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Serialized array of every memo in the session collection.
pub const CACHE_KEY_MEMOS: &str = "local_memos";
/// `"true"` while a login session is active.
pub const CACHE_KEY_LOGGED_IN: &str = "is_logged_in";
/// Remote username remembered across restarts.
pub const CACHE_KEY_REMOTE_USERNAME: &str = "remote_username";
/// Remote password remembered across restarts.
pub const CACHE_KEY_REMOTE_PASSWORD: &str = "remote_password";

pub type CacheResult<T> = Result<T, CacheError>;

/// Local cache persistence errors.
#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    MissingRequiredTable(&'static str),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "local cache table `{table}` is missing")
            }
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value contract for the local cache.
pub trait LocalCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;
    fn remove(&self, key: &str) -> CacheResult<()>;
}

/// SQLite-backed local cache.
pub struct SqliteLocalCache<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLocalCache<'conn> {
    /// Constructs a cache from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> CacheResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'cache_entries'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(CacheError::MissingRequiredTable("cache_entries"));
        }
        Ok(Self { conn })
    }
}

impl LocalCache for SqliteLocalCache<'_> {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.conn.execute(
            "INSERT INTO cache_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        debug!(
            "event=cache_set module=cache status=ok key={} bytes={}",
            key,
            value.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.conn
            .execute("DELETE FROM cache_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}
