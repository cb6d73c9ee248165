//! Flat member records as delivered by the external store.
//!
//! Records arrive as JSON with camelCase keys; the transport encodes
//! "no parent" and "no photo" as empty strings, which deserialize to
//! `None` here so the rest of the system never sees sentinel values.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable identity of a member within one family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Create an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One flat member record.
///
/// `generation` is an informational cohort label maintained by users; it is
/// not derived from tree depth and may disagree with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: MemberId,
    pub name: String,
    /// `None` marks the root. An empty string on the wire means the same.
    #[serde(default, deserialize_with = "empty_id_as_none")]
    pub parent_id: Option<MemberId>,
    pub generation: i32,
    /// `None` or empty/whitespace means no photo: render initials directly.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub photo_url: Option<String>,
}

impl MemberRecord {
    /// Convenience constructor used throughout tests and demos.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: Option<&str>,
        generation: i32,
    ) -> Self {
        Self {
            id: MemberId::new(id),
            name: name.into(),
            parent_id: parent_id.map(MemberId::from),
            generation,
            photo_url: None,
        }
    }

    /// Set the photo URL, normalizing blank strings to `None`.
    #[must_use]
    pub fn with_photo(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.photo_url = if url.trim().is_empty() {
            None
        } else {
            Some(url)
        };
        self
    }

    /// Whether this record claims to be the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

fn empty_id_as_none<'de, D>(deserializer: D) -> Result<Option<MemberId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(MemberId))
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
