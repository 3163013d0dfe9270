//! PROPFIND multistatus parsing.
//!
//! Servers disagree on namespace prefixes (`d:`, `D:`, `lp1:`, none) and on
//! whether `href` is an absolute URL or an absolute path, so matching is
//! prefix-agnostic and hrefs are reduced to decoded paths.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Url;

static RESPONSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9_-]+:)?response\b[^>]*>(.*?)</(?:[a-z0-9_-]+:)?response\s*>")
        .expect("valid response regex")
});
static HREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9_-]+:)?href\b[^>]*>(.*?)</(?:[a-z0-9_-]+:)?href\s*>")
        .expect("valid href regex")
});
static COLLECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:[a-z0-9_-]+:)?collection\b[^>]*>").expect("valid collection regex")
});
static CONTENT_LENGTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9_-]+:)?getcontentlength\b[^>]*>\s*(\d+)\s*<")
        .expect("valid content length regex")
});

/// Request body asking for the properties the listing needs.
pub const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:resourcetype/>
    <d:getcontentlength/>
    <d:getlastmodified/>
  </d:prop>
</d:propfind>"#;

/// One `<response>` element of a multistatus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultistatusEntry {
    /// Decoded absolute path, without a trailing `/`.
    pub path: String,
    pub is_collection: bool,
    pub content_length: Option<u64>,
}

impl MultistatusEntry {
    /// Decoded last path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }
}

/// Parses every `<response>` element that carries an `href`.
pub fn parse_multistatus(body: &str) -> Vec<MultistatusEntry> {
    RESPONSE_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let response = caps.get(1)?.as_str();
            let href = HREF_RE.captures(response)?.get(1)?.as_str();
            let content_length = CONTENT_LENGTH_RE
                .captures(response)
                .and_then(|length| length.get(1))
                .and_then(|length| length.as_str().parse().ok());
            Some(MultistatusEntry {
                path: href_to_path(href),
                is_collection: COLLECTION_RE.is_match(response),
                content_length,
            })
        })
        .collect()
}

/// Reduces an href (absolute URL or path) to a decoded path without a
/// trailing `/`.
pub fn href_to_path(href: &str) -> String {
    let unescaped = unescape_xml(href.trim());
    let raw_path = match Url::parse(&unescaped) {
        Ok(url) => url.path().to_string(),
        Err(_) => unescaped,
    };
    let decoded = percent_decode(&raw_path);
    let trimmed = decoded.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Decodes `%XX` escapes; malformed escapes are kept verbatim.
pub fn percent_decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
