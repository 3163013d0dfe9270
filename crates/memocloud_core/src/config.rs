//! Application configuration.
//!
//! # Responsibility
//! - Resolve remote store and login settings from the environment.
//! - Carry configuration explicitly into the memo repository.
//!
//! # Invariants
//! - The remote base URL is absolute `http(s)` and ends with `/`.
//! - Empty environment values behave as unset.
//! - Passwords never appear in `Debug` output.

use crate::repo::cache_repo::{
    CacheResult, LocalCache, CACHE_KEY_REMOTE_PASSWORD, CACHE_KEY_REMOTE_USERNAME,
};
use reqwest::Url;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub const ENV_REMOTE_URL: &str = "MEMOCLOUD_WEBDAV_URL";
pub const ENV_REMOTE_USERNAME: &str = "MEMOCLOUD_WEBDAV_USERNAME";
pub const ENV_REMOTE_PASSWORD: &str = "MEMOCLOUD_WEBDAV_PASSWORD";
pub const ENV_LOGIN_USERNAME: &str = "MEMOCLOUD_LOGIN_USERNAME";
pub const ENV_LOGIN_PASSWORD: &str = "MEMOCLOUD_LOGIN_PASSWORD";

pub const DEFAULT_REMOTE_URL: &str = "https://wajima.infini-cloud.net/dav/";
pub const DEFAULT_LOGIN_USERNAME: &str = "admin";
pub const DEFAULT_LOGIN_PASSWORD: &str = "password123";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidRemoteUrl { value: String, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRemoteUrl { value, reason } => {
                write!(f, "invalid remote url `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Remote store location and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL, always ending with `/`.
    pub url: String,
    pub username: String,
    pub password: String,
}

impl RemoteConfig {
    /// Builds a remote config with a normalized base URL.
    pub fn new(
        url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            url: normalize_remote_url(url)?,
            username: username.into(),
            password: password.into(),
        })
    }
}

impl Debug for RemoteConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The single credential pair gating `login`.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns whether the given pair matches exactly.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl Default for LoginCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_USERNAME, DEFAULT_LOGIN_PASSWORD)
    }
}

impl Debug for LoginCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session-scoped application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub login: LoginCredentials,
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through a key lookup function.
    ///
    /// Missing or blank values fall back to built-in defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let remote = RemoteConfig::new(
            value(ENV_REMOTE_URL).as_deref().unwrap_or(DEFAULT_REMOTE_URL),
            value(ENV_REMOTE_USERNAME).unwrap_or_default(),
            value(ENV_REMOTE_PASSWORD).unwrap_or_default(),
        )?;
        let login = LoginCredentials::new(
            value(ENV_LOGIN_USERNAME).unwrap_or_else(|| DEFAULT_LOGIN_USERNAME.to_string()),
            value(ENV_LOGIN_PASSWORD).unwrap_or_else(|| DEFAULT_LOGIN_PASSWORD.to_string()),
        );

        Ok(Self { remote, login })
    }

    /// Fills unset remote credentials from values remembered at last login.
    pub fn with_cached_remote_credentials(mut self, cache: &impl LocalCache) -> CacheResult<Self> {
        if self.remote.username.is_empty() {
            if let Some(username) = cache.get(CACHE_KEY_REMOTE_USERNAME)? {
                self.remote.username = username;
            }
        }
        if self.remote.password.is_empty() {
            if let Some(password) = cache.get(CACHE_KEY_REMOTE_PASSWORD)? {
                self.remote.password = password;
            }
        }
        Ok(self)
    }
}

/// Validates a remote base URL and guarantees a trailing `/`.
pub fn normalize_remote_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ConfigError::InvalidRemoteUrl {
        value: trimmed.to_string(),
        reason,
    };

    let url = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot be used as a base".to_string()));
    }

    let mut normalized = url.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}
