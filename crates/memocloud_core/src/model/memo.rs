//! Memo domain model.
//!
//! # Responsibility
//! - Define the canonical memo document shared by the remote store, the
//!   local cache mirror and the in-memory collection.
//! - Keep the serialized JSON shape stable (`camelCase`, block document body).
//!
//! # Invariants
//! - `id` is non-empty and never reused for another memo.
//! - `updated_at` is never earlier than `created_at`.
//! - Collections are ordered by `updated_at DESC, id ASC`.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Version tag written into every memo body.
pub const CONTENT_FORMAT_VERSION: &str = "2.29.1";
/// Block type used for the single rich-text block.
pub const PARAGRAPH_BLOCK_TYPE: &str = "paragraph";

/// Stable memo identifier, `memo-<epoch-ms>-<suffix>` for generated ids.
pub type MemoId = String;

/// Returns the current UTC time truncated to millisecond precision.
///
/// Stored timestamps use millisecond precision so they survive a trip
/// through other clients' ISO-8601 serializers unchanged.
pub fn utc_now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Canonical memo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub id: MemoId,
    pub title: String,
    pub content: MemoContent,
    /// Immutable after creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every save.
    pub updated_at: DateTime<Utc>,
}

/// Block document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoContent {
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    /// Epoch milliseconds of the last body rebuild.
    #[serde(default)]
    pub time: i64,
    #[serde(default = "default_format_version")]
    pub version: String,
}

/// One content block. This implementation only writes paragraph blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub id: String,
    /// Serialized as `type` to match the stored document schema.
    #[serde(rename = "type", default = "default_block_type")]
    pub kind: String,
    pub data: BlockData,
}

/// Payload of a content block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    /// Rendered rich-text markup.
    #[serde(default)]
    pub text: String,
}

/// Memo validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoValidationError {
    EmptyId,
    /// Ids become remote file names, so path syntax is rejected.
    InvalidId(String),
    UpdatedBeforeCreated {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl Display for MemoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "memo id cannot be empty"),
            Self::InvalidId(id) => write!(f, "memo id `{id}` contains path syntax"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "memo updatedAt {} is earlier than createdAt {}",
                updated_at.to_rfc3339(),
                created_at.to_rfc3339()
            ),
        }
    }
}

impl Error for MemoValidationError {}

impl MemoContent {
    /// Empty body with no blocks.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            blocks: Vec::new(),
            time: now.timestamp_millis(),
            version: default_format_version(),
        }
    }

    /// Body holding exactly one paragraph block with the given markup.
    pub fn from_markup(markup: impl Into<String>, now: DateTime<Utc>) -> Self {
        let millis = now.timestamp_millis();
        Self {
            blocks: vec![ContentBlock {
                id: format!("block-{millis}"),
                kind: default_block_type(),
                data: BlockData {
                    text: markup.into(),
                },
            }],
            time: millis,
            version: default_format_version(),
        }
    }

    /// Markup of the first block, or an empty string for empty bodies.
    pub fn markup(&self) -> &str {
        self.blocks
            .first()
            .map(|block| block.data.text.as_str())
            .unwrap_or("")
    }
}

impl Memo {
    /// Creates an empty memo with a generated timestamp-derived id.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_id(generate_memo_id(now), now)
    }

    /// Creates an empty memo with a caller-provided id.
    ///
    /// Used by import paths and tests where the identity already exists.
    pub fn with_id(id: impl Into<MemoId>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            content: MemoContent::empty(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces title and body in place. Timestamps are left to `save`.
    pub fn set_body(
        &mut self,
        title: impl Into<String>,
        markup: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.title = title.into();
        self.content = MemoContent::from_markup(markup, now);
    }

    /// Markup of the memo body.
    pub fn markup(&self) -> &str {
        self.content.markup()
    }

    /// Validates domain invariants before persistence.
    pub fn validate(&self) -> Result<(), MemoValidationError> {
        validate_memo_id(&self.id)?;
        if self.updated_at < self.created_at {
            return Err(MemoValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Remote file name for this memo (`<id>.json`).
    pub fn file_name(&self) -> String {
        memo_file_name(&self.id)
    }
}

/// Checks that an id is non-empty and usable as a single file name.
pub fn validate_memo_id(id: &str) -> Result<(), MemoValidationError> {
    if id.trim().is_empty() {
        return Err(MemoValidationError::EmptyId);
    }
    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(MemoValidationError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Remote file name for a memo id.
pub fn memo_file_name(id: &str) -> String {
    format!("{id}.json")
}

/// Generates a collision-resistant, timestamp-derived memo id.
pub fn generate_memo_id(now: DateTime<Utc>) -> MemoId {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("memo-{}-{}", now.timestamp_millis(), &suffix[..8])
}

/// Display ordering: newest `updated_at` first, ties by `id` ascending.
pub fn display_order(a: &Memo, b: &Memo) -> Ordering {
    b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id))
}

/// Sorts memos in display order.
pub fn sort_memos(memos: &mut [Memo]) {
    memos.sort_by(display_order);
}

fn default_format_version() -> String {
    CONTENT_FORMAT_VERSION.to_string()
}

fn default_block_type() -> String {
    PARAGRAPH_BLOCK_TYPE.to_string()
}

#[cfg(test)]
mod tests {
    use super::{generate_memo_id, sort_memos, validate_memo_id, Memo, MemoValidationError};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let first = generate_memo_id(now);
        let second = generate_memo_id(now);
        assert!(first.starts_with(&format!("memo-{}-", now.timestamp_millis())));
        assert_ne!(first, second);
    }

    #[test]
    fn minimal_document_parses_with_defaults() {
        let json = r#"{
            "id": "memo-1",
            "title": "A",
            "content": {"blocks": [{"data": {"text": "hi"}}]},
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-02T00:00:00.000Z"
        }"#;
        let memo: Memo = serde_json::from_str(json).unwrap();
        assert_eq!(memo.markup(), "hi");
        assert_eq!(memo.content.blocks[0].kind, "paragraph");
        assert_eq!(memo.content.version, "2.29.1");
        assert!(memo.validate().is_ok());
    }

    #[test]
    fn serialized_shape_uses_camel_case_and_block_type() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut memo = Memo::with_id("memo-1", now);
        memo.set_body("Title", "<b>x</b>", now);
        let value = serde_json::to_value(&memo).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert_eq!(value["content"]["blocks"][0]["type"], "paragraph");
        assert_eq!(value["content"]["blocks"][0]["data"]["text"], "<b>x</b>");
        assert_eq!(value["content"]["time"], now.timestamp_millis());
    }

    #[test]
    fn json_roundtrip_preserves_every_field() {
        let now = super::utc_now_millis();
        let mut memo = Memo::new(now);
        memo.set_body("Round trip", "<p>body</p>", now);
        let text = serde_json::to_string_pretty(&memo).unwrap();
        let parsed: Memo = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, memo);
    }

    #[test]
    fn validate_rejects_empty_id_and_time_inversion() {
        let now = Utc::now();
        let empty = Memo::with_id("  ", now);
        assert_eq!(empty.validate(), Err(MemoValidationError::EmptyId));

        let nested = Memo::with_id("../memo", now);
        assert!(matches!(
            nested.validate(),
            Err(MemoValidationError::InvalidId(_))
        ));

        let mut inverted = Memo::with_id("memo-2", now);
        inverted.updated_at = now - Duration::seconds(1);
        assert!(matches!(
            inverted.validate(),
            Err(MemoValidationError::UpdatedBeforeCreated { .. })
        ));
    }

    #[test]
    fn memo_id_check_rejects_separators_and_dot_names() {
        assert!(validate_memo_id("memo-1").is_ok());
        for id in ["a/b", "a\\b", ".", ".."] {
            assert_eq!(
                validate_memo_id(id),
                Err(MemoValidationError::InvalidId(id.to_string()))
            );
        }
        assert_eq!(validate_memo_id(""), Err(MemoValidationError::EmptyId));
    }

    #[test]
    fn sort_orders_newest_first_then_by_id() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut older = Memo::with_id("memo-a", base);
        older.updated_at = base + Duration::seconds(1);
        let mut newer = Memo::with_id("memo-b", base);
        newer.updated_at = base + Duration::seconds(5);
        let mut tie = Memo::with_id("memo-0", base);
        tie.updated_at = base + Duration::seconds(1);

        let mut memos = vec![older, newer, tie];
        sort_memos(&mut memos);
        let ids: Vec<&str> = memos.iter().map(|memo| memo.id.as_str()).collect();
        assert_eq!(ids, vec!["memo-b", "memo-0", "memo-a"]);
    }
}
