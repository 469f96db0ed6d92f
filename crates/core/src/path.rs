//! Record paths
//!
//! A `RecordPath` addresses a location inside a record's value tree: a
//! sequence of map keys and list indices. Paths are how operations name their
//! target and how sub-stores narrow a root store onto one property.
//!
//! Paths print and parse in dotted-bracket form: `content[2].title`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One step of a record path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Map key
    Key(String),
    /// List index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

/// Errors when parsing a path from its string form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    /// Empty segment, e.g. `a..b`
    #[error("empty path segment")]
    EmptySegment,
    /// Unterminated or non-numeric index, e.g. `a[1` or `a[x]`
    #[error("invalid index segment: {0}")]
    InvalidIndex(String),
}

/// A path into a record's value tree
///
/// The empty path is the root: it addresses the whole value. Most paths are
/// short (a property name, maybe an index), so segments live inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPath {
    segments: SmallVec<[PathSegment; 4]>,
}

impl RecordPath {
    /// The root path (no segments)
    pub fn root() -> Self {
        RecordPath {
            segments: SmallVec::new(),
        }
    }

    /// Build a path from pre-parsed segments
    pub fn from_segments(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        RecordPath {
            segments: segments.into_iter().collect(),
        }
    }

    /// The segments of this path
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if this path has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a map key (builder style)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append a list index (builder style)
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Append a map key in place
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Append a list index in place
    pub fn push_index(&mut self, idx: usize) {
        self.segments.push(PathSegment::Index(idx));
    }

    /// Join another path onto the end of this one
    pub fn join(&self, other: &RecordPath) -> RecordPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        RecordPath { segments }
    }

    /// The parent path, or None for the root
    pub fn parent(&self) -> Option<RecordPath> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(RecordPath { segments })
    }

    /// The last segment, or None for the root
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// True if this path is a prefix of `other` (inclusive)
    ///
    /// The root path is an ancestor of every path, including itself.
    pub fn is_ancestor_of(&self, other: &RecordPath) -> bool {
        if self.len() > other.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }
}

impl FromStr for RecordPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut path = RecordPath::root();
        if s.is_empty() {
            return Ok(path);
        }
        for part in s.split('.') {
            // Each dotted part is a key optionally followed by [i][j]... ;
            // a leading `[i]` (no key) is also allowed.
            let mut rest = part;
            if let Some(bracket) = rest.find('[') {
                let key = &rest[..bracket];
                if !key.is_empty() {
                    path.push_key(key);
                }
                rest = &rest[bracket..];
                while let Some(stripped) = rest.strip_prefix('[') {
                    let close = stripped
                        .find(']')
                        .ok_or_else(|| PathParseError::InvalidIndex(part.to_string()))?;
                    let idx: usize = stripped[..close]
                        .parse()
                        .map_err(|_| PathParseError::InvalidIndex(part.to_string()))?;
                    path.push_index(idx);
                    rest = &stripped[close + 1..];
                }
                if !rest.is_empty() {
                    return Err(PathParseError::InvalidIndex(part.to_string()));
                }
            } else if rest.is_empty() {
                return Err(PathParseError::EmptySegment);
            } else {
                path.push_key(rest);
            }
        }
        Ok(path)
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", key)?;
                }
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
            first = false;
        }
        Ok(())
    }
}
