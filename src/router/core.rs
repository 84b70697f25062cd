//! Router core module - route table and lookup results.
//!
//! [`RouteTable`] owns one [`RouteTrie`] per HTTP method and is the only
//! type the dispatcher talks to. It validates registrations before they reach
//! a trie, so every trie only ever sees patterns beginning with `/`.

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::error::RouteError;
use super::radix::RouteTrie;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` since they come from the registered route and
/// are shared by every request matching it; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Path parameters bound by a route match
///
/// Keys are unique: binding a name twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(ParamVec);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self(ParamVec::new())
    }

    /// Bind `name` to `value`, replacing an earlier binding of the same name
    pub fn insert(&mut self, name: Arc<str>, value: String) {
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Iterate `(name, value)` pairs in pattern order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Copy into a `HashMap`
    /// Note: This allocates - use `get()` in hot paths instead
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    /// Pattern exactly as registered, e.g. `/hello/:name`
    pub pattern: Arc<str>,
    /// Value registered for the pattern
    pub value: &'a T,
    /// Parameters bound from the request path
    pub params: Params,
}

/// Per-method route tries
///
/// Populated during setup, then read concurrently without locking. Callers
/// must not register routes while requests are being resolved.
#[derive(Debug)]
pub struct RouteTable<T> {
    tries: HashMap<Method, RouteTrie<T>>,
    /// Registration order, for listings
    order: Vec<(Method, Arc<str>)>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Validate a method string as given by a caller
    ///
    /// # Errors
    ///
    /// [`RouteError::EmptyMethod`] or [`RouteError::InvalidMethod`].
    pub fn parse_method(method: &str) -> Result<Method, RouteError> {
        if method.is_empty() {
            return Err(RouteError::EmptyMethod);
        }
        Method::from_bytes(method.as_bytes()).map_err(|_| RouteError::InvalidMethod {
            method: method.to_string(),
        })
    }

    /// Validate a pattern before it is inserted into any trie
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidPattern`] when `pattern` does not begin with `/`.
    pub fn check_pattern(pattern: &str) -> Result<(), RouteError> {
        if pattern.starts_with('/') {
            Ok(())
        } else {
            Err(RouteError::InvalidPattern {
                pattern: pattern.to_string(),
            })
        }
    }

    /// Register `value` for `method` and `pattern`
    ///
    /// Returns the value replaced by an identical earlier registration.
    ///
    /// # Errors
    ///
    /// Any validation error from [`Self::parse_method`] and
    /// [`Self::check_pattern`], or [`RouteError::Conflict`] from the trie.
    pub fn register(&mut self, method: &str, pattern: &str, value: T) -> Result<Option<T>, RouteError> {
        let method = Self::parse_method(method)?;
        self.insert(method, pattern, value)
    }

    /// Register with an already parsed method
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`], minus method validation.
    pub fn insert(&mut self, method: Method, pattern: &str, value: T) -> Result<Option<T>, RouteError> {
        Self::check_pattern(pattern)?;
        let replaced = self
            .tries
            .entry(method.clone())
            .or_default()
            .insert(pattern, value)?;
        if replaced.is_none() {
            self.order.push((method, Arc::from(pattern)));
        }
        Ok(replaced)
    }

    /// Resolve a request to its registered route
    ///
    /// An unknown method is a miss like any other.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let Some(trie) = self.tries.get(method) else {
            debug!(method = %method, path = %path, "No routes registered for method");
            return None;
        };
        match trie.search(path) {
            Some((entry, params)) => Some(RouteMatch {
                pattern: entry.pattern_arc(),
                value: entry.value(),
                params,
            }),
            None => {
                debug!(method = %method, path = %path, "No route matched");
                None
            }
        }
    }

    /// Registered `(method, pattern)` pairs in registration order
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.order.iter().map(|(m, p)| (m, p.as_ref()))
    }

    /// Total registered routes across all methods
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
