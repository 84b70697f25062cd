//! Prefix-scoped middleware registration.
//!
//! A scope ("route group") pairs a path prefix with an ordered middleware
//! list. Scopes live in an append-only arena owned by the engine and are
//! addressed by [`ScopeId`]; a child only remembers its parent's id.
//!
//! At dispatch time *every* scope whose prefix is a string prefix of the
//! request path contributes its middleware, in scope creation order. This is
//! plain prefix matching, not tree ancestry: a scope `/api` also applies to
//! `/apiary`.

use std::fmt;
use std::sync::Arc;

use crate::middleware::Handler;

/// Index of a scope within its engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) usize);

impl ScopeId {
    /// The root scope, prefix `""`, present in every engine
    pub const ROOT: ScopeId = ScopeId(0);
}

pub struct Scope {
    prefix: String,
    middleware: Vec<Handler>,
    parent: Option<ScopeId>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware.len())
            .field("parent", &self.parent)
            .finish()
    }
}

impl Scope {
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    #[must_use]
    pub fn middleware_len(&self) -> usize {
        self.middleware.len()
    }
}

/// Append-only scope arena
#[derive(Debug)]
pub(crate) struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    pub(crate) fn new() -> Self {
        Self {
            scopes: vec![Scope {
                prefix: String::new(),
                middleware: Vec::new(),
                parent: None,
            }],
        }
    }

    pub(crate) fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0)
    }

    /// Create a child of `parent`; its prefix is the parent's plus `suffix`
    ///
    /// An unknown parent is treated as the root.
    pub(crate) fn group(&mut self, parent: ScopeId, suffix: &str) -> ScopeId {
        let (parent, base) = match self.get(parent) {
            Some(scope) => (parent, scope.prefix.as_str()),
            None => (ScopeId::ROOT, ""),
        };
        let prefix = format!("{base}{suffix}");
        self.scopes.push(Scope {
            prefix,
            middleware: Vec::new(),
            parent: Some(parent),
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// First scope with exactly this prefix, created under the root if missing
    pub(crate) fn find_or_create(&mut self, prefix: &str) -> ScopeId {
        match self.scopes.iter().position(|s| s.prefix == prefix) {
            Some(idx) => ScopeId(idx),
            None => self.group(ScopeId::ROOT, prefix),
        }
    }

    pub(crate) fn prefix_of(&self, id: ScopeId) -> &str {
        self.get(id).map_or("", |s| s.prefix.as_str())
    }

    pub(crate) fn push_middleware(&mut self, id: ScopeId, handlers: impl IntoIterator<Item = Handler>) {
        if let Some(scope) = self.scopes.get_mut(id.0) {
            scope.middleware.extend(handlers);
        }
    }

    /// Append the middleware of every scope matching `path` to `chain`
    pub(crate) fn collect_middleware(&self, path: &str, chain: &mut Vec<Handler>) {
        for scope in &self.scopes {
            if path.starts_with(scope.prefix.as_str()) {
                chain.extend(scope.middleware.iter().map(Arc::clone));
            }
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }
}
