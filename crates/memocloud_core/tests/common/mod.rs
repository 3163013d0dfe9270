#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use memocloud_core::remote::{RemoteEntry, RemoteError, RemoteResult, RemoteStore};
use memocloud_core::{AppConfig, Memo, MemoRepository, SqliteLocalCache};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

pub type TestRepo<'conn> = MemoRepository<FakeRemoteStore, SqliteLocalCache<'conn>>;

/// In-memory remote store that can be switched offline.
#[derive(Default)]
pub struct FakeRemoteStore {
    files: RefCell<BTreeMap<String, Vec<u8>>>,
    dirs: RefCell<BTreeSet<String>>,
    offline: Cell<bool>,
}

impl FakeRemoteStore {
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn put_raw(&self, path: &str, text: &str) {
        let path = normalize(path);
        if let Some((dir, _)) = path.rsplit_once('/') {
            self.dirs.borrow_mut().insert(dir.to_string());
        }
        self.files
            .borrow_mut()
            .insert(path, text.as_bytes().to_vec());
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.borrow().contains_key(&normalize(path))
    }

    pub fn read_memo(&self, path: &str) -> Memo {
        let files = self.files.borrow();
        let bytes = files.get(&normalize(path)).expect("remote file exists");
        serde_json::from_slice(bytes).expect("remote memo parses")
    }

    pub fn raw_text(&self, path: &str) -> String {
        let files = self.files.borrow();
        let bytes = files.get(&normalize(path)).expect("remote file exists");
        String::from_utf8(bytes.clone()).unwrap()
    }

    fn check_online(&self) -> RemoteResult<()> {
        if self.offline.get() {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn dir_exists(&self, dir: &str) -> bool {
        dir.is_empty() || self.dirs.borrow().contains(dir)
    }
}

impl RemoteStore for FakeRemoteStore {
    fn list(&self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        self.check_online()?;
        let dir = normalize(path);
        if !self.dir_exists(&dir) {
            return Err(RemoteError::NotFound(path.to_string()));
        }

        let mut entries = Vec::new();
        for (file, bytes) in self.files.borrow().iter() {
            if parent_of(file) == dir {
                entries.push(RemoteEntry {
                    filename: file_name_of(file).to_string(),
                    path: file.clone(),
                    is_dir: false,
                    size: Some(bytes.len() as u64),
                });
            }
        }
        for sub in self.dirs.borrow().iter() {
            if parent_of(sub) == dir {
                entries.push(RemoteEntry {
                    filename: file_name_of(sub).to_string(),
                    path: sub.clone(),
                    is_dir: true,
                    size: None,
                });
            }
        }
        Ok(entries)
    }

    fn create_directory(&self, path: &str) -> RemoteResult<()> {
        self.check_online()?;
        self.dirs.borrow_mut().insert(normalize(path));
        Ok(())
    }

    fn read_text(&self, path: &str) -> RemoteResult<String> {
        self.check_online()?;
        let files = self.files.borrow();
        let bytes = files
            .get(&normalize(path))
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))?;
        String::from_utf8(bytes.clone()).map_err(|err| RemoteError::Parse(err.to_string()))
    }

    fn write_bytes(&self, path: &str, bytes: &[u8], _content_type: &str) -> RemoteResult<()> {
        self.check_online()?;
        let path = normalize(path);
        if !self.dir_exists(parent_of(&path)) {
            return Err(RemoteError::Unavailable(format!("PUT {path} returned 409 Conflict")));
        }
        self.files.borrow_mut().insert(path, bytes.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> RemoteResult<()> {
        self.check_online()?;
        self.files.borrow_mut().remove(&normalize(path));
        Ok(())
    }

    fn resource_url(&self, path: &str) -> RemoteResult<String> {
        Ok(format!("https://dav.test/{}", normalize(path)))
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn file_name_of(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

/// Clock that advances one second per call, starting at `base_time()`.
pub fn stepping_clock() -> impl Fn() -> DateTime<Utc> + 'static {
    let tick = Cell::new(0_i64);
    move || {
        let now = base_time() + Duration::seconds(tick.get());
        tick.set(tick.get() + 1);
        now
    }
}

pub fn default_config() -> AppConfig {
    AppConfig::from_lookup(|_| None).unwrap()
}

pub fn repo_with(conn: &Connection, remote: FakeRemoteStore) -> TestRepo<'_> {
    let cache = SqliteLocalCache::try_new(conn).unwrap();
    MemoRepository::with_clock(remote, cache, default_config(), stepping_clock())
}

pub fn repo(conn: &Connection) -> TestRepo<'_> {
    repo_with(conn, FakeRemoteStore::default())
}

/// Memo JSON as another client would write it.
pub fn memo_json(id: &str, title: &str, text: &str, updated_at: &str) -> String {
    format!(
        r#"{{
  "id": "{id}",
  "title": "{title}",
  "content": {{
    "blocks": [{{"id": "block-1", "type": "paragraph", "data": {{"text": "{text}"}}}}],
    "time": 1714554000000,
    "version": "2.29.1"
  }},
  "createdAt": "2024-05-01T09:00:00.000Z",
  "updatedAt": "{updated_at}"
}}"#
    )
}
