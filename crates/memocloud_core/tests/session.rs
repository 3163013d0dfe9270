mod common;

use common::{base_time, repo, stepping_clock, FakeRemoteStore};
use memocloud_core::config::{ENV_REMOTE_PASSWORD, ENV_REMOTE_USERNAME};
use memocloud_core::repo::cache_repo::{
    CACHE_KEY_LOGGED_IN, CACHE_KEY_MEMOS, CACHE_KEY_REMOTE_PASSWORD, CACHE_KEY_REMOTE_USERNAME,
};
use memocloud_core::{
    open_db_in_memory, AppConfig, LocalCache, Memo, MemoError, MemoRepository, SqliteLocalCache,
};

#[test]
fn login_with_default_credentials_succeeds() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = repo(&conn);

    let outcome = repo.login("admin", "password123").unwrap();

    assert!(outcome.remote_reachable);
    assert!(repo.is_logged_in());
    assert_eq!(
        repo.cache().get(CACHE_KEY_LOGGED_IN).unwrap().as_deref(),
        Some("true")
    );
}

#[test]
fn login_with_wrong_password_is_auth_failure() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = repo(&conn);

    let err = repo.login("admin", "wrong").unwrap_err();

    assert!(matches!(err, MemoError::AuthFailure));
    assert!(!repo.is_logged_in());
    assert!(repo.cache().get(CACHE_KEY_LOGGED_IN).unwrap().is_none());
}

#[test]
fn login_succeeds_while_remote_is_unreachable() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = repo(&conn);
    repo.remote().set_offline(true);

    let outcome = repo.login("admin", "password123").unwrap();

    assert!(!outcome.remote_reachable);
    assert!(repo.is_logged_in());
}

#[test]
fn session_is_restored_across_restarts_until_logout() {
    let conn = open_db_in_memory().unwrap();
    let mut first = repo(&conn);
    first.login("admin", "password123").unwrap();
    first.load_all().unwrap();
    first.save(Memo::with_id("memo-1", base_time())).unwrap();

    let mut second = repo(&conn);
    assert!(second.restore_session().unwrap());
    second.remote().set_offline(true);
    second.load_all().unwrap();
    assert_eq!(second.memos().len(), 1);

    second.logout().unwrap();
    assert!(!second.is_logged_in());
    assert!(second.memos().is_empty());
    assert!(second.current().is_none());
    assert!(second.cache().get(CACHE_KEY_MEMOS).unwrap().is_some());

    let mut third = repo(&conn);
    assert!(!third.restore_session().unwrap());
}

#[test]
fn remote_credentials_are_remembered_at_login() {
    let conn = open_db_in_memory().unwrap();
    let configured = AppConfig::from_lookup(|key| match key {
        ENV_REMOTE_USERNAME => Some("alice".to_string()),
        ENV_REMOTE_PASSWORD => Some("s3cret".to_string()),
        _ => None,
    })
    .unwrap();
    let cache = SqliteLocalCache::try_new(&conn).unwrap();
    let mut repo =
        MemoRepository::with_clock(FakeRemoteStore::default(), cache, configured, stepping_clock());
    repo.login("admin", "password123").unwrap();

    assert_eq!(
        repo.cache().get(CACHE_KEY_REMOTE_USERNAME).unwrap().as_deref(),
        Some("alice")
    );

    let restored = AppConfig::from_lookup(|_| None)
        .unwrap()
        .with_cached_remote_credentials(repo.cache())
        .unwrap();
    assert_eq!(restored.remote.username, "alice");
    assert_eq!(restored.remote.password, "s3cret");

    repo.logout().unwrap();
    assert!(repo.cache().get(CACHE_KEY_REMOTE_PASSWORD).unwrap().is_none());
}
