//! Dotted member paths.
//!
//! A path names a location in both the original and the patch graph. Segments
//! are member names (or dictionary keys); collection elements are never
//! addressed by index, they are resolved by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dot-separated sequence of member names.
///
/// # Examples
///
/// ```
/// use tirea_merge::Path;
///
/// let path = Path::root().key("Address").key("Street");
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.to_string(), "Address.Street");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<String>);

impl Path {
    /// Create an empty path (root).
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create an empty path (alias for `new`).
    #[inline]
    pub fn root() -> Self {
        Self::new()
    }

    /// Parse a dot-separated string. Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Create a path from a vector of segments.
    #[inline]
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Append a segment and return self (builder pattern).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(k.into());
        self
    }

    /// Push a segment onto the path (mutating).
    #[inline]
    pub fn push(&mut self, k: impl Into<String>) {
        self.0.push(k.into());
    }

    /// Pop the last segment from the path.
    #[inline]
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// Get the segments of this path.
    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Check if this path is empty (root).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of segments in this path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the first segment.
    #[inline]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Get the last segment.
    #[inline]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Join this path with another path.
    #[inline]
    pub fn join(&self, other: &Path) -> Path {
        let mut result = self.clone();
        result.0.extend(other.0.iter().cloned());
        result
    }

    /// Append a segment and return a new path (non-mutating builder).
    #[inline]
    pub fn child(&self, k: impl Into<String>) -> Path {
        let mut result = self.clone();
        result.0.push(k.into());
        result
    }

    /// Get the parent path (path without the last segment).
    #[inline]
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            let mut p = self.clone();
            p.pop();
            Some(p)
        }
    }

    /// Segment-wise, ASCII case-insensitive equality.
    pub fn eq_ignore_case(&self, other: &Path) -> bool {
        self.len() == other.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Check if `prefix` matches the leading segments of this path, ignoring case.
    ///
    /// ```
    /// use tirea_merge::Path;
    ///
    /// let full = Path::parse("Orders.Lines.Sku");
    /// assert!(full.starts_with_ignore_case(&Path::parse("orders")));
    /// assert!(!full.starts_with_ignore_case(&Path::parse("Ord")));
    /// ```
    pub fn starts_with_ignore_case(&self, prefix: &Path) -> bool {
        prefix.len() <= self.len()
            && self
                .0
                .iter()
                .zip(prefix.0.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Check if `suffix` matches the trailing segments of this path, ignoring case.
    pub fn ends_with_ignore_case(&self, suffix: &Path) -> bool {
        suffix.len() <= self.len()
            && self
                .0
                .iter()
                .rev()
                .zip(suffix.0.iter().rev())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Iterate over the segments.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Path::parse(&s)
    }
}

impl FromIterator<String> for Path {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl IntoIterator for Path {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = str;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Construct a `Path` from a sequence of member names.
///
/// # Examples
///
/// ```
/// use tirea_merge::path;
///
/// let p = path!("Customer", "Address", "Street");
/// assert_eq!(p.to_string(), "Customer.Address.Street");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($seg);
        )+
        p
    }};
}
