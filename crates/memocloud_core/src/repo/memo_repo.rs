//! Memo repository: dual-write persistence over the remote store and the
//! local cache.
//!
//! # Responsibility
//! - Own the session's in-memory memo collection and the open memo.
//! - Read from the remote store when reachable, otherwise from the cache.
//! - Write to the remote store best-effort and mirror the whole collection
//!   to the cache on every mutation.
//!
//! # Invariants
//! - Memo ids are unique within the collection.
//! - The collection is sorted by `updated_at DESC, id ASC` after every call.
//! - `load_all` never merges sources; the winning source replaces the
//!   collection. Merging happens only in `reconcile`.
//! - Attachment uploads have no local fallback.

use crate::config::AppConfig;
use crate::model::memo::{
    memo_file_name, sort_memos, utc_now_millis, validate_memo_id, Memo, MemoId,
    MemoValidationError,
};
use crate::remote::{join_path, RemoteError, RemoteStore};
use crate::repo::cache_repo::{
    CacheError, LocalCache, CACHE_KEY_LOGGED_IN, CACHE_KEY_MEMOS, CACHE_KEY_REMOTE_PASSWORD,
    CACHE_KEY_REMOTE_USERNAME,
};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Remote directory holding one JSON file per memo.
pub const MEMOS_DIR: &str = "memos";
/// Remote directory holding uploaded attachments.
pub const UPLOADS_DIR: &str = "uploads";

const LOGGED_IN_FLAG: &str = "true";

/// Source of the current time.
pub type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Memo repository errors.
#[derive(Debug)]
pub enum MemoError {
    /// Credential mismatch on login.
    AuthFailure,
    /// Remote transport or reachability failure.
    RemoteUnavailable(RemoteError),
    /// Malformed stored document.
    Parse(String),
    Cache(CacheError),
    Validation(MemoValidationError),
    NotFound(MemoId),
    /// `save_current` called without an open memo.
    NoOpenMemo,
    InvalidAttachment(String),
}

impl Display for MemoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthFailure => write!(f, "invalid username or password"),
            Self::RemoteUnavailable(err) => write!(f, "{err}"),
            Self::Parse(details) => write!(f, "malformed memo data: {details}"),
            Self::Cache(err) => write!(f, "local cache failure: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "memo not found: {id}"),
            Self::NoOpenMemo => write!(f, "no memo is open for editing"),
            Self::InvalidAttachment(name) => write!(f, "invalid attachment name `{name}`"),
        }
    }
}

impl Error for MemoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RemoteUnavailable(err) => Some(err),
            Self::Cache(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CacheError> for MemoError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

impl From<MemoValidationError> for MemoError {
    fn from(value: MemoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RemoteError> for MemoError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::Parse(details) => Self::Parse(details),
            other => Self::RemoteUnavailable(other),
        }
    }
}

/// Where `load_all` got its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    LocalCache,
}

/// Outcome of `load_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: LoadSource,
    pub loaded: usize,
    /// Remote files skipped because they could not be read or parsed.
    pub skipped: Vec<String>,
    /// Soft warning when the remote store was unreachable.
    pub warning: Option<String>,
}

/// Outcome of `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// The memo as stored, with its refreshed `updated_at`.
    pub memo: Memo,
    pub remote_synced: bool,
    pub warning: Option<String>,
}

/// Outcome of `delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    /// Whether the memo was present in the collection.
    pub removed: bool,
    pub remote_synced: bool,
    /// Whether the deleted memo was the one open for editing.
    pub closed_current: bool,
    pub warning: Option<String>,
}

/// Outcome of `login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginOutcome {
    pub remote_reachable: bool,
}

/// Outcome of `reconcile`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Cached memos written to the remote store.
    pub pushed: Vec<MemoId>,
    /// Cached memos that were newer but could not be written remotely.
    pub push_failed: Vec<MemoId>,
    /// Remote files skipped because they could not be read or parsed.
    pub skipped: Vec<String>,
    pub total: usize,
}

/// Session-scoped memo repository.
pub struct MemoRepository<S: RemoteStore, C: LocalCache> {
    remote: S,
    cache: C,
    config: AppConfig,
    clock: Clock,
    memos: Vec<Memo>,
    current: Option<Memo>,
    logged_in: bool,
}

impl<S: RemoteStore, C: LocalCache> MemoRepository<S, C> {
    /// Creates a repository using the wall clock.
    pub fn new(remote: S, cache: C, config: AppConfig) -> Self {
        Self::with_clock(remote, cache, config, utc_now_millis)
    }

    /// Creates a repository with a caller-provided clock.
    pub fn with_clock(
        remote: S,
        cache: C,
        config: AppConfig,
        clock: impl Fn() -> DateTime<Utc> + 'static,
    ) -> Self {
        Self {
            remote,
            cache,
            config,
            clock: Box::new(clock),
            memos: Vec::new(),
            current: None,
            logged_in: false,
        }
    }

    pub fn remote(&self) -> &S {
        &self.remote
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Session collection in display order.
    pub fn memos(&self) -> &[Memo] {
        &self.memos
    }

    pub fn get(&self, id: &str) -> Option<&Memo> {
        self.memos.iter().find(|memo| memo.id == id)
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Checks credentials against the configured pair and opens a session.
    ///
    /// The remote probe is best-effort; an unreachable store does not block
    /// login.
    pub fn login(&mut self, username: &str, password: &str) -> Result<LoginOutcome, MemoError> {
        if !self.config.login.matches(username, password) {
            warn!("event=login module=repo status=error error_code=auth_failure");
            return Err(MemoError::AuthFailure);
        }

        let remote_reachable = match self.remote.probe() {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "event=remote_probe module=repo status=error error={}",
                    err
                );
                false
            }
        };

        self.cache
            .set(CACHE_KEY_REMOTE_USERNAME, &self.config.remote.username)?;
        self.cache
            .set(CACHE_KEY_REMOTE_PASSWORD, &self.config.remote.password)?;
        self.cache.set(CACHE_KEY_LOGGED_IN, LOGGED_IN_FLAG)?;
        self.logged_in = true;

        info!(
            "event=login module=repo status=ok remote_reachable={}",
            remote_reachable
        );
        Ok(LoginOutcome { remote_reachable })
    }

    /// Resumes a session persisted by an earlier `login`.
    pub fn restore_session(&mut self) -> Result<bool, MemoError> {
        let flag = self.cache.get(CACHE_KEY_LOGGED_IN)?;
        self.logged_in = flag.as_deref() == Some(LOGGED_IN_FLAG);
        Ok(self.logged_in)
    }

    /// Ends the session. The cached memo mirror is kept.
    pub fn logout(&mut self) -> Result<(), MemoError> {
        self.cache.remove(CACHE_KEY_LOGGED_IN)?;
        self.cache.remove(CACHE_KEY_REMOTE_USERNAME)?;
        self.cache.remove(CACHE_KEY_REMOTE_PASSWORD)?;
        self.logged_in = false;
        self.memos.clear();
        self.current = None;
        info!("event=logout module=repo status=ok");
        Ok(())
    }

    /// Replaces the collection from the remote store, or from the cache when
    /// the remote listing fails.
    pub fn load_all(&mut self) -> Result<LoadReport, MemoError> {
        let started_at = Instant::now();
        let (source, memos, skipped, warning) = self
            .fetch_remote()
            .map(|(memos, skipped)| (LoadSource::Remote, memos, skipped, None))
            .or_else(|remote_err| {
                warn!(
                    "event=memo_load module=repo status=fallback source=local_cache error={}",
                    remote_err
                );
                self.fetch_cached().map(|memos| {
                    (
                        LoadSource::LocalCache,
                        memos,
                        Vec::new(),
                        Some(remote_err.to_string()),
                    )
                })
            })?;

        self.memos = dedupe_newest(memos);
        info!(
            "event=memo_load module=repo status=ok source={:?} count={} skipped={} duration_ms={}",
            source,
            self.memos.len(),
            skipped.len(),
            started_at.elapsed().as_millis()
        );

        Ok(LoadReport {
            source,
            loaded: self.memos.len(),
            skipped,
            warning,
        })
    }

    /// Stamps, stores and upserts one memo.
    ///
    /// A failed remote write is reported as a warning; the cache mirror is
    /// always written.
    pub fn save(&mut self, mut memo: Memo) -> Result<SaveReport, MemoError> {
        memo.updated_at = (self.clock)().max(memo.created_at);
        memo.validate()?;

        let path = join_path(MEMOS_DIR, &memo.file_name());
        let warning = match self.remote.write_json(&path, &memo) {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    "event=memo_save module=repo status=error target=remote memo_id={} error={}",
                    memo.id, err
                );
                Some(err.to_string())
            }
        };

        self.upsert(memo.clone());
        self.mirror_to_cache()?;
        if let Some(current) = self.current.as_mut().filter(|open| open.id == memo.id) {
            *current = memo.clone();
        }

        info!(
            "event=memo_save module=repo status=ok memo_id={} remote_synced={}",
            memo.id,
            warning.is_none()
        );
        Ok(SaveReport {
            memo,
            remote_synced: warning.is_none(),
            warning,
        })
    }

    /// Deletes one memo from the remote store, the collection and the cache.
    ///
    /// Ids that are not a single file name are rejected before any remote
    /// call.
    pub fn delete(&mut self, id: &str) -> Result<DeleteReport, MemoError> {
        validate_memo_id(id)?;
        let path = join_path(MEMOS_DIR, &memo_file_name(id));
        let warning = match self.remote.delete(&path) {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    "event=memo_delete module=repo status=error target=remote memo_id={} error={}",
                    id, err
                );
                Some(err.to_string())
            }
        };

        let before = self.memos.len();
        self.memos.retain(|memo| memo.id != id);
        let removed = self.memos.len() != before;
        self.mirror_to_cache()?;

        let closed_current = self.current.as_ref().is_some_and(|open| open.id == id);
        if closed_current {
            self.current = None;
        }

        info!(
            "event=memo_delete module=repo status=ok memo_id={} removed={} remote_synced={}",
            id,
            removed,
            warning.is_none()
        );
        Ok(DeleteReport {
            removed,
            remote_synced: warning.is_none(),
            closed_current,
            warning,
        })
    }

    /// Uploads an attachment and returns its URL.
    ///
    /// Stored as `uploads/<epoch-ms>-<file name>`. Fails without fallback
    /// when the remote store rejects the write.
    pub fn upload_attachment(&mut self, bytes: &[u8], filename: &str) -> Result<String, MemoError> {
        let name = attachment_name(filename)?;
        let stored_name = format!("{}-{}", (self.clock)().timestamp_millis(), name);
        let path = join_path(UPLOADS_DIR, &stored_name);

        self.remote.ensure_directory(UPLOADS_DIR);
        if let Err(err) = self.remote.write_binary(&path, bytes) {
            warn!(
                "event=attachment_upload module=repo status=error bytes={} error={}",
                bytes.len(),
                err
            );
            return Err(MemoError::RemoteUnavailable(err));
        }
        let url = self
            .remote
            .resource_url(&path)
            .map_err(MemoError::RemoteUnavailable)?;

        info!(
            "event=attachment_upload module=repo status=ok bytes={} path={}",
            bytes.len(),
            path
        );
        Ok(url)
    }

    /// Starts editing a new, empty memo. It joins the collection on save.
    pub fn create_memo(&mut self) -> &Memo {
        let memo = Memo::new((self.clock)());
        self.current.insert(memo)
    }

    /// Opens an existing memo for editing.
    pub fn open(&mut self, id: &str) -> Result<&Memo, MemoError> {
        let memo = self
            .get(id)
            .cloned()
            .ok_or_else(|| MemoError::NotFound(id.to_string()))?;
        Ok(&*self.current.insert(memo))
    }

    /// Returns to the list without saving.
    pub fn close(&mut self) {
        self.current = None;
    }

    /// Memo currently open for editing.
    pub fn current(&self) -> Option<&Memo> {
        self.current.as_ref()
    }

    /// Saves the open memo with a new title and single-block body.
    pub fn save_current(
        &mut self,
        title: impl Into<String>,
        markup: impl Into<String>,
    ) -> Result<SaveReport, MemoError> {
        let mut memo = self.current.clone().ok_or(MemoError::NoOpenMemo)?;
        memo.set_body(title, markup, (self.clock)());
        self.save(memo)
    }

    /// Last-write-wins merge of the cache mirror into the remote store.
    ///
    /// Cached memos missing remotely, or strictly newer than their remote
    /// copy, are pushed. Requires a successful remote listing; on failure
    /// nothing changes.
    pub fn reconcile(&mut self) -> Result<ReconcileReport, MemoError> {
        let (remote_memos, skipped) = self.fetch_remote()?;
        let cached = self.fetch_cached()?;

        let mut merged: BTreeMap<MemoId, Memo> = BTreeMap::new();
        for memo in remote_memos {
            keep_newest(&mut merged, memo);
        }

        let mut report = ReconcileReport {
            skipped,
            ..ReconcileReport::default()
        };
        for memo in cached {
            if let Err(err) = memo.validate() {
                warn!(
                    "event=memo_reconcile module=repo status=error memo_id={} error={}",
                    memo.id, err
                );
                continue;
            }
            let newer_locally = merged
                .get(&memo.id)
                .map_or(true, |remote| memo.updated_at > remote.updated_at);
            if !newer_locally {
                continue;
            }

            let path = join_path(MEMOS_DIR, &memo.file_name());
            match self.remote.write_json(&path, &memo) {
                Ok(()) => report.pushed.push(memo.id.clone()),
                Err(err) => {
                    warn!(
                        "event=memo_reconcile module=repo status=error memo_id={} error={}",
                        memo.id, err
                    );
                    report.push_failed.push(memo.id.clone());
                }
            }
            merged.insert(memo.id.clone(), memo);
        }

        let mut memos: Vec<Memo> = merged.into_values().collect();
        sort_memos(&mut memos);
        self.memos = memos;
        self.mirror_to_cache()?;
        report.total = self.memos.len();

        info!(
            "event=memo_reconcile module=repo status=ok pushed={} push_failed={} total={}",
            report.pushed.len(),
            report.push_failed.len(),
            report.total
        );
        Ok(report)
    }

    fn fetch_remote(&self) -> Result<(Vec<Memo>, Vec<String>), MemoError> {
        self.remote.ensure_directory(MEMOS_DIR);
        let entries = self
            .remote
            .list(MEMOS_DIR)
            .map_err(MemoError::RemoteUnavailable)?;

        let mut memos = Vec::new();
        let mut skipped = Vec::new();
        for entry in entries
            .iter()
            .filter(|entry| !entry.is_dir && entry.filename.ends_with(".json"))
        {
            let parsed = self
                .remote
                .read_json::<Memo>(&entry.path)
                .map_err(MemoError::from)
                .and_then(|memo| {
                    memo.validate()?;
                    Ok(memo)
                });
            match parsed {
                Ok(memo) => memos.push(memo),
                Err(err) => {
                    warn!(
                        "event=memo_load module=repo status=skip file={} error={}",
                        entry.filename, err
                    );
                    skipped.push(entry.filename.clone());
                }
            }
        }
        Ok((memos, skipped))
    }

    fn fetch_cached(&self) -> Result<Vec<Memo>, MemoError> {
        match self.cache.get(CACHE_KEY_MEMOS)? {
            None => Ok(Vec::new()),
            Some(text) => serde_json::from_str(&text)
                .map_err(|err| MemoError::Parse(format!("local cache: {err}"))),
        }
    }

    fn upsert(&mut self, memo: Memo) {
        match self.memos.iter_mut().find(|existing| existing.id == memo.id) {
            Some(existing) => *existing = memo,
            None => self.memos.push(memo),
        }
        sort_memos(&mut self.memos);
    }

    fn mirror_to_cache(&self) -> Result<(), MemoError> {
        let text = serde_json::to_string(&self.memos)
            .map_err(|err| MemoError::Parse(format!("serialize collection: {err}")))?;
        self.cache.set(CACHE_KEY_MEMOS, &text)?;
        Ok(())
    }
}

fn keep_newest(memos: &mut BTreeMap<MemoId, Memo>, memo: Memo) {
    let replace = memos
        .get(&memo.id)
        .map_or(true, |existing| memo.updated_at > existing.updated_at);
    if replace {
        memos.insert(memo.id.clone(), memo);
    }
}

/// Collapses duplicate ids to their newest copy and sorts.
fn dedupe_newest(memos: Vec<Memo>) -> Vec<Memo> {
    let mut by_id = BTreeMap::new();
    for memo in memos {
        keep_newest(&mut by_id, memo);
    }
    let mut unique: Vec<Memo> = by_id.into_values().collect();
    sort_memos(&mut unique);
    unique
}

/// Reduces a client-supplied file name to its last path component.
fn attachment_name(filename: &str) -> Result<String, MemoError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(MemoError::InvalidAttachment(filename.to_string()));
    }
    Ok(name.to_string())
}
