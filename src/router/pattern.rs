//! Route pattern segmentation.
//!
//! Both registered patterns and incoming request paths are split with the
//! same rules so that trie depth lines up one segment per level:
//!
//! - segments are separated by `/`
//! - empty segments are dropped (`/a//b` is the same as `/a/b`)
//! - a segment starting with `*` is the last one emitted; anything after a
//!   wildcard is ignored

use smallvec::SmallVec;

/// Segment storage for the hot path. Most routes are shallower than 8 levels.
pub type Segments<'a> = SmallVec<[&'a str; 8]>;

/// Classification of a single pattern segment, derived from its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Fixed text, matched exactly.
    Literal,
    /// `:name`, matches exactly one path segment.
    Param,
    /// `*name`, matches the remainder of the path.
    Wildcard,
}

impl SegmentKind {
    #[inline]
    #[must_use]
    pub fn of(segment: &str) -> Self {
        match segment.as_bytes().first() {
            Some(b':') => SegmentKind::Param,
            Some(b'*') => SegmentKind::Wildcard,
            _ => SegmentKind::Literal,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_dynamic(self) -> bool {
        !matches!(self, SegmentKind::Literal)
    }
}

/// Split a pattern or request path into its ordered segments.
///
/// ```
/// use chainrouter::router::parse_pattern;
///
/// assert_eq!(parse_pattern("/hello/:name").as_slice(), ["hello", ":name"]);
/// assert_eq!(parse_pattern("/static/*filepath/ignored").as_slice(), ["static", "*filepath"]);
/// ```
#[must_use]
pub fn parse_pattern(pattern: &str) -> Segments<'_> {
    let mut parts = Segments::new();
    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        parts.push(segment);
        if segment.starts_with('*') {
            break;
        }
    }
    parts
}
