//! Hierarchical document paths.
//!
//! A path alternates collection names and document keys. It is always held
//! in canonical form: a leading `/`, segments joined by `/`, no trailing `/`.
//! The root path is `/`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical `/`-joined path.
///
/// Ordering and equality are those of the joined string, which is the
/// iteration order of every store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    joined: String,
}

impl Path {
    /// The root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            joined: "/".to_string(),
        }
    }

    /// Parses a path, accepting an optional leading and trailing `/`.
    ///
    /// `""` and `"/"` parse to the root path. Empty interior segments
    /// (`a//b`) are rejected.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('/').unwrap_or(s);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(Error::InvalidPath(s.to_string()));
        }
        Ok(Self {
            joined: format!("/{trimmed}"),
        })
    }

    /// Builds a path from individual segments.
    ///
    /// Segments must be non-empty and must not contain `/`.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = String::new();
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() || segment.contains('/') {
                return Err(Error::InvalidSegment(segment.to_string()));
            }
            joined.push('/');
            joined.push_str(segment);
        }
        if joined.is_empty() {
            return Ok(Self::root());
        }
        Ok(Self { joined })
    }

    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.joined
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.joined == "/"
    }

    /// Iterates over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.joined[1..].split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments (zero for root).
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// Returns true for the root path (no segments).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Even, non-zero segment count.
    #[must_use]
    pub fn is_document(&self) -> bool {
        let n = self.len();
        n > 0 && n % 2 == 0
    }

    /// Odd segment count.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.len() % 2 == 1
    }

    /// First segment, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.segments().next()
    }

    /// Last segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.joined.rsplit('/').next()
    }

    /// The path without its last segment. `None` for root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.joined.rfind('/') {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(Self {
                joined: self.joined[..idx].to_string(),
            }),
        }
    }

    /// Appends one segment.
    pub fn child(&self, segment: &str) -> Result<Self> {
        if segment.is_empty() || segment.contains('/') {
            return Err(Error::InvalidSegment(segment.to_string()));
        }
        let joined = if self.is_root() {
            format!("/{segment}")
        } else {
            format!("{}/{segment}", self.joined)
        };
        Ok(Self { joined })
    }

    /// Prefix shared by every path strictly below this one (`/a/` for `/a`,
    /// `/` for root).
    #[must_use]
    pub fn key_prefix(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("{}/", self.joined)
        }
    }

    /// Returns true if `self` is `other` or lies below it.
    #[must_use]
    pub fn starts_with(&self, other: &Path) -> bool {
        other.is_root() || self == other || self.joined.starts_with(&other.key_prefix())
    }

    /// The part of this path below `parent`, without a leading `/`.
    #[must_use]
    pub fn relative_to(&self, parent: &Path) -> Option<&str> {
        if parent.is_root() {
            return Some(&self.joined[1..]);
        }
        self.joined.strip_prefix(&parent.key_prefix())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.joined
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.joined
    }
}
