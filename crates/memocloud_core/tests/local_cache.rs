use memocloud_core::db::{open_db, open_db_in_memory};
use memocloud_core::{CacheError, LocalCache, SqliteLocalCache};
use rusqlite::Connection;

#[test]
fn set_get_overwrite_and_remove() {
    let conn = open_db_in_memory().unwrap();
    let cache = SqliteLocalCache::try_new(&conn).unwrap();

    assert!(cache.get("local_memos").unwrap().is_none());

    cache.set("local_memos", "[]").unwrap();
    assert_eq!(cache.get("local_memos").unwrap().as_deref(), Some("[]"));

    cache.set("local_memos", "[{\"id\":\"memo-1\"}]").unwrap();
    assert_eq!(
        cache.get("local_memos").unwrap().as_deref(),
        Some("[{\"id\":\"memo-1\"}]")
    );

    cache.remove("local_memos").unwrap();
    assert!(cache.get("local_memos").unwrap().is_none());
    cache.remove("local_memos").unwrap();
}

#[test]
fn values_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let cache = SqliteLocalCache::try_new(&conn).unwrap();
        cache.set("is_logged_in", "true").unwrap();
    }

    let conn = open_db(&path).unwrap();
    let cache = SqliteLocalCache::try_new(&conn).unwrap();
    assert_eq!(cache.get("is_logged_in").unwrap().as_deref(), Some("true"));
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteLocalCache::try_new(&conn);

    assert!(matches!(
        result,
        Err(CacheError::MissingRequiredTable("cache_entries"))
    ));
}
