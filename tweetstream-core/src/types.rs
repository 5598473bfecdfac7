//! Decoded stream records.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tweetstream_types::StreamError;

/// One record as cut from the response body, delimiter stripped.
///
/// A zero-length line is a keep-alive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawLine(Bytes);

impl RawLine {
    /// Wrap raw bytes (without the trailing delimiter).
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// The record bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the record in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for zero-length records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the record carries no content (empty or ASCII whitespace only).
    #[must_use]
    pub fn is_keep_alive(&self) -> bool {
        self.0.trim_ascii().is_empty()
    }
}

/// A tweet payload. Fields beyond `id` and `text` are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    /// Tweet identifier.
    pub id: String,
    /// Tweet text.
    pub text: String,
    /// Any other fields present on the payload object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tweet {
    /// Build a tweet with no extra fields.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            extra: Map::new(),
        }
    }
}

/// A filter rule that caused a tweet to be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingRule {
    /// Rule identifier.
    pub id: String,
    /// Rule tag; rules created without one carry an empty tag.
    #[serde(default)]
    pub tag: String,
}

impl MatchingRule {
    /// Build a matching rule.
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
        }
    }
}

/// A data record: one or more tweets plus the annotations delivered with them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataMessage {
    /// Tweets carried by the record; never empty for decoded records.
    pub tweets: Vec<Tweet>,
    /// Rules that matched, empty when the feed sends none.
    pub matching_rules: Vec<MatchingRule>,
    /// Expansion objects (`includes`), if requested and present.
    pub includes: Option<Value>,
    /// Partial errors delivered alongside the payload.
    pub errors: Vec<Value>,
}

impl DataMessage {
    /// Build a data message from tweets and rules.
    #[must_use]
    pub fn new(tweets: Vec<Tweet>, matching_rules: Vec<MatchingRule>) -> Self {
        Self {
            tweets,
            matching_rules,
            includes: None,
            errors: Vec::new(),
        }
    }
}

/// Kind of an out-of-band system notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum NoticeKind {
    /// `error` notices, typically followed by a disconnect.
    Error,
    /// `warn` (or `warning`) notices.
    Warning,
    /// `info` notices.
    Info,
    /// `disconnect` notices.
    Disconnect,
}

impl NoticeKind {
    /// Notice kinds in the order the classifier checks them.
    pub const PRIORITY: [Self; 4] = [Self::Error, Self::Warning, Self::Info, Self::Disconnect];

    /// Field names that identify this kind on the wire.
    #[must_use]
    pub const fn wire_names(self) -> &'static [&'static str] {
        match self {
            Self::Error => &["error"],
            Self::Warning => &["warn", "warning"],
            Self::Info => &["info"],
            Self::Disconnect => &["disconnect"],
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_names()[0])
    }
}

/// Body of a system notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeBody {
    /// Human-readable message.
    pub message: String,
    /// When the notice was sent, with the offset it was sent in.
    pub sent: DateTime<FixedOffset>,
}

/// A system notice keyed by kind. Always holds exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<NoticeKind, NoticeBody>")]
pub struct SystemNotice(BTreeMap<NoticeKind, NoticeBody>);

impl TryFrom<BTreeMap<NoticeKind, NoticeBody>> for SystemNotice {
    type Error = StreamError;

    fn try_from(map: BTreeMap<NoticeKind, NoticeBody>) -> Result<Self, Self::Error> {
        if map.len() == 1 {
            Ok(Self(map))
        } else {
            Err(StreamError::InvalidArg(format!(
                "system notice needs exactly one entry, got {}",
                map.len()
            )))
        }
    }
}

impl SystemNotice {
    /// Build a notice with a single entry.
    #[must_use]
    pub fn new(kind: NoticeKind, body: NoticeBody) -> Self {
        Self(BTreeMap::from([(kind, body)]))
    }

    /// Kind of the populated entry.
    ///
    /// # Panics
    /// Never: construction and deserialization both enforce a single entry.
    #[must_use]
    pub fn kind(&self) -> NoticeKind {
        *self
            .0
            .keys()
            .next()
            .expect("system notice holds exactly one entry")
    }

    /// Body of the populated entry.
    ///
    /// # Panics
    /// Never: construction and deserialization both enforce a single entry.
    #[must_use]
    pub fn body(&self) -> &NoticeBody {
        self.0
            .values()
            .next()
            .expect("system notice holds exactly one entry")
    }

    /// Body for `kind`, if that is the populated kind.
    #[must_use]
    pub fn get(&self, kind: NoticeKind) -> Option<&NoticeBody> {
        self.0.get(&kind)
    }

    /// The underlying kind-to-body map.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<NoticeKind, NoticeBody> {
        &self.0
    }

    /// Consume the notice and return the underlying map.
    #[must_use]
    pub fn into_map(self) -> BTreeMap<NoticeKind, NoticeBody> {
        self.0
    }
}

/// Outcome of classifying one non-empty record.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// A data envelope.
    Data(DataMessage),
    /// A notice envelope.
    Notice(SystemNotice),
}
