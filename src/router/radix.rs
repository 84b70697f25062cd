//! Segment trie used for per-method route matching
//!
//! One [`RouteTrie`] exists per HTTP method. Each level of the tree is one
//! path segment, so lookups cost O(k) in the number of segments and do not
//! depend on how many routes are registered.
//!
//! ## Node layout
//!
//! - Literal children are matched by exact text
//! - At most one dynamic child (`:param` or `*wildcard`) exists per node.
//!   Once it is created it claims the whole position: later registrations
//!   with *any* segment at that depth descend into it, first registration wins
//! - A node is terminal when a full pattern ends there; it then owns the
//!   [`RouteEntry`] for that pattern
//!
//! ## Precedence
//!
//! Search tries the literal child first and falls back to the dynamic child,
//! backtracking if the literal branch dead-ends. A static path therefore
//! always beats a parametrized one that could also match it.
//!
//! ## Conflicts
//!
//! When the final segment of a new pattern would put a dynamic terminal next
//! to an existing terminal sibling, no precedence is defined between the two
//! and insertion fails with [`RouteError::Conflict`]. Dynamic/dynamic sharing
//! of a non-terminal position is allowed and resolved by the slot rule above.

use std::sync::Arc;

use percent_encoding::percent_decode_str;

use super::core::Params;
use super::error::RouteError;
use super::pattern::{parse_pattern, SegmentKind};

/// Param binding derived from a registered pattern
#[derive(Debug, Clone)]
struct ParamSlot {
    /// Segment index within the pattern
    position: usize,
    /// Name without the leading `:` or `*`
    name: Arc<str>,
    wildcard: bool,
}

/// A registered pattern and the value stored for it
#[derive(Debug)]
pub struct RouteEntry<T> {
    pattern: Arc<str>,
    slots: Vec<ParamSlot>,
    value: T,
}

impl<T> RouteEntry<T> {
    fn new(pattern: &str, value: T) -> Self {
        let slots = parse_pattern(pattern)
            .iter()
            .enumerate()
            .filter_map(|(position, segment)| match SegmentKind::of(segment) {
                SegmentKind::Literal => None,
                kind => Some(ParamSlot {
                    position,
                    name: Arc::from(&segment[1..]),
                    wildcard: kind == SegmentKind::Wildcard,
                }),
            })
            .collect();
        Self {
            pattern: Arc::from(pattern),
            slots,
            value,
        }
    }

    /// The pattern exactly as it was registered
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Shared handle to the pattern string
    #[inline]
    #[must_use]
    pub fn pattern_arc(&self) -> Arc<str> {
        Arc::clone(&self.pattern)
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Bind this entry's params against the segments of a matched request path
    ///
    /// Segments were split on the raw path, so an encoded `%2F` stays inside
    /// its segment and only shows up as `/` in the decoded value.
    fn extract(&self, parts: &[&str]) -> Params {
        let mut params = Params::new();
        for slot in &self.slots {
            if slot.wildcard {
                let rest = parts.get(slot.position..).unwrap_or_default();
                params.insert(Arc::clone(&slot.name), decode(&rest.join("/")));
                break;
            }
            if let Some(value) = parts.get(slot.position) {
                params.insert(Arc::clone(&slot.name), decode(value));
            }
        }
        params
    }
}

/// Percent-decode a param value; invalid UTF-8 is replaced, not rejected
fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Where a segment lands among a node's children
enum ChildSlot {
    Literal(usize),
    Dynamic,
    Vacant,
}

#[derive(Debug)]
struct TrieNode<T> {
    /// Segment text; empty for the root
    segment: Box<str>,
    kind: SegmentKind,
    /// Literal children, unique by segment text
    children: Vec<TrieNode<T>>,
    /// The single param/wildcard slot at the next depth
    dynamic_child: Option<Box<TrieNode<T>>>,
    /// Set iff a registered pattern ends at this node
    route: Option<RouteEntry<T>>,
    /// Set once any direct child became terminal
    has_terminal_child: bool,
}

impl<T> TrieNode<T> {
    fn new(segment: &str) -> Self {
        Self {
            segment: Box::from(segment),
            kind: SegmentKind::of(segment),
            children: Vec::new(),
            dynamic_child: None,
            route: None,
            has_terminal_child: false,
        }
    }

    fn root() -> Self {
        Self::new("")
    }

    /// First matching child for insertion: exact literal, else the dynamic slot
    fn slot_for(&self, segment: &str) -> ChildSlot {
        if let Some(idx) = self.children.iter().position(|c| &*c.segment == segment) {
            ChildSlot::Literal(idx)
        } else if self.dynamic_child.is_some() {
            ChildSlot::Dynamic
        } else {
            ChildSlot::Vacant
        }
    }

    /// First terminal child in registration order, used to report conflicts
    fn first_terminal_child(&self) -> Option<&RouteEntry<T>> {
        self.children
            .iter()
            .chain(self.dynamic_child.as_deref())
            .find_map(|c| c.route.as_ref())
    }

    fn insert(
        &mut self,
        parts: &[&str],
        height: usize,
        entry: RouteEntry<T>,
    ) -> Result<Option<RouteEntry<T>>, RouteError> {
        let Some(&segment) = parts.get(height) else {
            return Ok(self.route.replace(entry));
        };
        let is_last = parts.len() == height + 1;
        let slot = self.slot_for(segment);
        let child_is_dynamic = match slot {
            ChildSlot::Literal(_) => false,
            ChildSlot::Dynamic => true,
            ChildSlot::Vacant => SegmentKind::of(segment).is_dynamic(),
        };

        if is_last && self.has_terminal_child && child_is_dynamic {
            let existing = self
                .first_terminal_child()
                .map(|r| r.pattern().to_string())
                .unwrap_or_default();
            return Err(RouteError::Conflict {
                new: entry.pattern().to_string(),
                existing,
            });
        }
        if is_last {
            self.has_terminal_child = true;
        }

        let child = match slot {
            ChildSlot::Literal(idx) => &mut self.children[idx],
            ChildSlot::Dynamic | ChildSlot::Vacant if child_is_dynamic => self
                .dynamic_child
                .get_or_insert_with(|| Box::new(TrieNode::new(segment)))
                .as_mut(),
            _ => {
                self.children.push(TrieNode::new(segment));
                let last = self.children.len() - 1;
                &mut self.children[last]
            }
        };
        child.insert(parts, height + 1, entry)
    }

    fn search(&self, parts: &[&str], height: usize) -> Option<&RouteEntry<T>> {
        if parts.len() == height || self.kind == SegmentKind::Wildcard {
            return self.route.as_ref();
        }

        let segment = parts[height];
        if let Some(child) = self.children.iter().find(|c| &*c.segment == segment) {
            if let Some(found) = child.search(parts, height + 1) {
                return Some(found);
            }
        }
        self.dynamic_child
            .as_deref()
            .and_then(|child| child.search(parts, height + 1))
    }
}

/// Route trie for a single HTTP method
///
/// Built during registration and read-only afterwards; concurrent readers
/// need no locking as long as no insertion runs alongside them.
#[derive(Debug)]
pub struct RouteTrie<T> {
    root: TrieNode<T>,
    len: usize,
}

impl<T> Default for RouteTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTrie<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: TrieNode::root(),
            len: 0,
        }
    }

    /// Insert `value` under `pattern`
    ///
    /// Returns the value previously stored for an identical pattern, if any.
    ///
    /// # Errors
    ///
    /// [`RouteError::Conflict`] when the pattern would leave a literal and a
    /// dynamic terminal at the same position. The trie is left unchanged.
    pub fn insert(&mut self, pattern: &str, value: T) -> Result<Option<T>, RouteError> {
        let parts = parse_pattern(pattern);
        let entry = RouteEntry::new(pattern, value);
        let replaced = self.root.insert(&parts, 0, entry)?;
        if replaced.is_none() {
            self.len += 1;
        }
        Ok(replaced.map(|r| r.value))
    }

    /// Find the route matching `path` and bind its params
    #[must_use]
    pub fn search(&self, path: &str) -> Option<(&RouteEntry<T>, Params)> {
        let parts = parse_pattern(path);
        let entry = self.root.search(&parts, 0)?;
        let params = entry.extract(&parts);
        Some((entry, params))
    }

    /// Number of distinct registered patterns
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
