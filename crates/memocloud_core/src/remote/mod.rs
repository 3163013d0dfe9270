//! Remote file store contracts.
//!
//! # Responsibility
//! - Define the path-addressed store used as the primary memo backend.
//! - Provide JSON/binary helpers shared by every store implementation.
//!
//! # Invariants
//! - Paths are relative to the store root; `/` separators only.
//! - Transport failures surface as `RemoteError::Unavailable`; there are no
//!   retries at this layer.
//! - `delete` treats a missing file as success.

pub mod multistatus;
pub mod webdav;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use webdav::WebDavStore;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport failure or unexpected server status.
    Unavailable(String),
    /// The addressed file or directory does not exist.
    NotFound(String),
    /// Stored content is not a valid document.
    Parse(String),
    /// The path cannot be mapped onto the store.
    InvalidPath(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "remote store unavailable: {details}"),
            Self::NotFound(path) => write!(f, "remote path not found: {path}"),
            Self::Parse(details) => write!(f, "malformed remote document: {details}"),
            Self::InvalidPath(path) => write!(f, "invalid remote path: `{path}`"),
        }
    }
}

impl Error for RemoteError {}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Decoded last path segment.
    pub filename: String,
    /// Store-relative path (`<dir>/<filename>`).
    pub path: String,
    pub is_dir: bool,
    pub size: Option<u64>,
}

/// Path-addressed remote file store.
pub trait RemoteStore {
    /// Lists the direct children of a directory.
    fn list(&self, path: &str) -> RemoteResult<Vec<RemoteEntry>>;
    /// Creates one directory. An already existing directory is success.
    fn create_directory(&self, path: &str) -> RemoteResult<()>;
    /// Reads a file as UTF-8 text.
    fn read_text(&self, path: &str) -> RemoteResult<String>;
    /// Writes a file, overwriting unconditionally.
    fn write_bytes(&self, path: &str, bytes: &[u8], content_type: &str) -> RemoteResult<()>;
    /// Removes a file. A missing file is success.
    fn delete(&self, path: &str) -> RemoteResult<()>;
    /// Absolute URL under which a stored file can be fetched.
    fn resource_url(&self, path: &str) -> RemoteResult<String>;

    /// Reachability check against the store root.
    fn probe(&self) -> RemoteResult<()> {
        self.list("/").map(|_| ())
    }

    /// Makes sure a directory exists; failures are logged, never returned.
    fn ensure_directory(&self, path: &str) {
        if self.list(path).is_ok() {
            return;
        }
        match self.create_directory(path) {
            Ok(()) => info!("event=remote_mkdir module=remote status=ok path={path}"),
            Err(err) => warn!(
                "event=remote_mkdir module=remote status=error path={} error={}",
                path, err
            ),
        }
    }

    /// Reads and parses a JSON document.
    fn read_json<T: DeserializeOwned>(&self, path: &str) -> RemoteResult<T>
    where
        Self: Sized,
    {
        let text = self.read_text(path)?;
        serde_json::from_str(&text).map_err(|err| RemoteError::Parse(format!("{path}: {err}")))
    }

    /// Serializes a document with two-space indentation and writes it.
    fn write_json<T: Serialize>(&self, path: &str, document: &T) -> RemoteResult<()>
    where
        Self: Sized,
    {
        let text = serde_json::to_string_pretty(document)
            .map_err(|err| RemoteError::Parse(format!("{path}: {err}")))?;
        self.write_bytes(path, text.as_bytes(), "application/json")
    }

    /// Uploads opaque file content.
    fn write_binary(&self, path: &str, bytes: &[u8]) -> RemoteResult<()> {
        self.write_bytes(path, bytes, "application/octet-stream")
    }
}

/// Joins a directory and a file name into a store-relative path.
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
