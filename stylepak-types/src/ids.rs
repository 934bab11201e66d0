//! Identifier types used throughout stylepak.
//!
//! Package authors write ids in whatever case they like, and every lookup
//! across packages is case-insensitive.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Identifier for a package or package object.
///
/// Keeps the author's spelling for display, but compares, orders and hashes
/// by the case-folded form, so `"clean"` and `"CLEAN"` are the same id.
#[derive(Clone)]
pub struct ObjectId {
    raw: String,
    folded: String,
}

impl ObjectId {
    /// Creates an id from any string. Empty ids are accepted here; use
    /// [`ObjectId::parse`] for author-supplied values.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let folded = raw.to_lowercase();
        Self { raw, folded }
    }

    /// Parses an author-supplied id, rejecting blank values.
    pub fn parse(s: &str) -> Result<Self, crate::Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::EmptyId);
        }
        Ok(Self::new(trimmed))
    }

    /// Returns the id as originally written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the case-folded form used for comparisons.
    #[must_use]
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Special ids are written `<LIKE_THIS>` and name pseudo-objects.
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.raw.len() >= 2 && self.raw.starts_with('<') && self.raw.ends_with('>')
    }

    /// Case-insensitive comparison against a plain string.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.folded == other.to_lowercase()
    }
}

impl PartialEq for ObjectId {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for ObjectId {}

impl Hash for ObjectId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl PartialOrd for ObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({:?})", self.raw)
    }
}

impl FromStr for ObjectId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
