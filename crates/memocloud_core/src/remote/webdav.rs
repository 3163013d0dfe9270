//! WebDAV implementation of the remote store.
//!
//! # Responsibility
//! - Map store operations onto WebDAV verbs (`PROPFIND`, `MKCOL`, `GET`,
//!   `PUT`, `DELETE`) over a blocking HTTP client.
//! - Translate HTTP statuses into `RemoteError` variants.
//!
//! # Invariants
//! - Requests are issued one at a time; no retries.
//! - Path segments are percent-encoded; `.`/`..` segments are rejected.
//! - Credentials are sent with basic auth only when a username is set.

use crate::config::RemoteConfig;
use crate::remote::multistatus::{parse_multistatus, percent_decode, PROPFIND_BODY};
use crate::remote::{join_path, RemoteEntry, RemoteError, RemoteResult, RemoteStore};
use log::{debug, warn};
use once_cell::sync::Lazy;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use std::time::Instant;

static PROPFIND: Lazy<Method> =
    Lazy::new(|| Method::from_bytes(b"PROPFIND").expect("valid PROPFIND method"));
static MKCOL: Lazy<Method> =
    Lazy::new(|| Method::from_bytes(b"MKCOL").expect("valid MKCOL method"));

/// WebDAV-backed remote store.
pub struct WebDavStore {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl WebDavStore {
    /// Creates a store rooted at `config.url`.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|err| RemoteError::InvalidPath(format!("{}: {err}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidPath(config.url.clone()));
        }
        let client = Client::builder()
            .build()
            .map_err(|err| RemoteError::Unavailable(format!("http client setup failed: {err}")))?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL every path is resolved against.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url_for(&self, path: &str, collection: bool) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RemoteError::InvalidPath(path.to_string()))?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|segment| !segment.is_empty()) {
                if segment == "." || segment == ".." {
                    return Err(RemoteError::InvalidPath(path.to_string()));
                }
                segments.push(segment);
            }
            if collection {
                segments.push("");
            }
        }
        Ok(url)
    }

    fn send(
        &self,
        method: Method,
        url: Url,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> RemoteResult<Response> {
        let started_at = Instant::now();
        let method_name = method.to_string();
        let mut request = self.client.request(method, url.clone());
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        match build(request).send() {
            Ok(response) => {
                debug!(
                    "event=remote_request module=remote status=ok method={} path={} http_status={} duration_ms={}",
                    method_name,
                    url.path(),
                    response.status().as_u16(),
                    started_at.elapsed().as_millis()
                );
                Ok(response)
            }
            Err(err) => {
                warn!(
                    "event=remote_request module=remote status=error method={} path={} duration_ms={} error={}",
                    method_name,
                    url.path(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(RemoteError::Unavailable(format!(
                    "{method_name} {}: {err}",
                    url.path()
                )))
            }
        }
    }
}

impl RemoteStore for WebDavStore {
    fn list(&self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let url = self.url_for(path, true)?;
        let own_path = normalize_dir_path(url.path());
        let response = self.send(PROPFIND.clone(), url, |request| {
            request
                .header("Depth", "1")
                .header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/xml; charset=utf-8"),
                )
                .body(PROPFIND_BODY)
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(unexpected_status("PROPFIND", path, status));
        }
        let body = response
            .text()
            .map_err(|err| RemoteError::Unavailable(format!("PROPFIND {path}: {err}")))?;

        Ok(parse_multistatus(&body)
            .into_iter()
            .filter(|entry| entry.path != own_path)
            .map(|entry| {
                let filename = entry.file_name().to_string();
                RemoteEntry {
                    path: join_path(path, &filename),
                    filename,
                    is_dir: entry.is_collection,
                    size: entry.content_length,
                }
            })
            .collect())
    }

    fn create_directory(&self, path: &str) -> RemoteResult<()> {
        let url = self.url_for(path, true)?;
        let response = self.send(MKCOL.clone(), url, |request| request)?;
        let status = response.status();
        if status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED {
            return Ok(());
        }
        Err(unexpected_status("MKCOL", path, status))
    }

    fn read_text(&self, path: &str) -> RemoteResult<String> {
        let url = self.url_for(path, false)?;
        let response = self.send(Method::GET, url, |request| request)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(unexpected_status("GET", path, status));
        }
        response
            .text()
            .map_err(|err| RemoteError::Unavailable(format!("GET {path}: {err}")))
    }

    fn write_bytes(&self, path: &str, bytes: &[u8], content_type: &str) -> RemoteResult<()> {
        let url = self.url_for(path, false)?;
        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        let body = bytes.to_vec();
        let response = self.send(Method::PUT, url, |request| {
            request.header(CONTENT_TYPE, content_type).body(body)
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(unexpected_status("PUT", path, status))
    }

    fn delete(&self, path: &str) -> RemoteResult<()> {
        let url = self.url_for(path, false)?;
        let response = self.send(Method::DELETE, url, |request| request)?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(unexpected_status("DELETE", path, status))
    }

    fn resource_url(&self, path: &str) -> RemoteResult<String> {
        Ok(self.url_for(path, false)?.to_string())
    }
}

fn unexpected_status(verb: &str, path: &str, status: StatusCode) -> RemoteError {
    RemoteError::Unavailable(format!("{verb} {path} returned {status}"))
}

fn normalize_dir_path(raw: &str) -> String {
    let decoded = percent_decode(raw);
    let trimmed = decoded.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
