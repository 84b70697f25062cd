use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use tracing::{debug, error, info, warn};

use super::context::Context;
use super::pool::{ContextPool, PoolMetrics, DEFAULT_POOL_CAPACITY};
use super::scope::{Scope, ScopeId, Scopes};
use crate::middleware::{handler, logger, recovery, Handler};
use crate::router::{Params, RouteError, RouteTable};

/// Every standard method, used by [`ScopeRef::any`]
pub const ANY_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::DELETE,
    Method::CONNECT,
    Method::TRACE,
];

fn default_not_found() -> Handler {
    handler(|c: &mut Context| {
        let message = format!("404 NOT FOUND: {}", c.path());
        c.string(StatusCode::NOT_FOUND, message);
    })
}

/// Route and middleware registration
///
/// The engine is the mutable build phase. Once every route is registered,
/// [`Engine::build`] freezes it into a [`Dispatcher`] that can be shared
/// across threads.
///
/// ```rust
/// use chainrouter::dispatcher::Engine;
/// use chainrouter::middleware::handler;
/// use http::{Request, StatusCode};
///
/// let mut engine = Engine::new();
/// engine
///     .root()
///     .get("/hello/:name", [handler(|c| {
///         let name = c.param("name").to_string();
///         c.string(StatusCode::OK, format!("hello {name}"));
///     })])
///     .unwrap();
///
/// let dispatcher = engine.build();
/// let request = Request::get("/hello/knight").body(bytes::Bytes::new()).unwrap();
/// let response = dispatcher.serve(request);
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.body().as_ref(), b"hello knight");
/// ```
pub struct Engine {
    routes: RouteTable<Vec<Handler>>,
    scopes: Scopes,
    not_found: Vec<Handler>,
    pool_capacity: usize,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("routes", &self.routes.len())
            .field("scopes", &self.scopes)
            .field("pool_capacity", &self.pool_capacity)
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Empty engine with a root scope and the default not-found handler
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: RouteTable::new(),
            scopes: Scopes::new(),
            not_found: vec![default_not_found()],
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }

    /// [`Engine::new`] with request logging and panic recovery on the root scope
    #[must_use]
    pub fn default_stack() -> Self {
        let mut engine = Self::new();
        engine.use_middleware(ScopeId::ROOT, [logger(), recovery()]);
        engine
    }

    /// Number of idle contexts the dispatcher keeps for reuse
    #[must_use]
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn root(&mut self) -> ScopeRef<'_> {
        self.scope(ScopeId::ROOT)
    }

    pub fn scope(&mut self, id: ScopeId) -> ScopeRef<'_> {
        ScopeRef { engine: self, id }
    }

    /// Create a child scope whose prefix is `parent`'s prefix plus `suffix`
    pub fn group(&mut self, parent: ScopeId, suffix: &str) -> ScopeId {
        let id = self.scopes.group(parent, suffix);
        debug!(prefix = %self.scopes.prefix_of(id), "Scope created");
        id
    }

    /// Append middleware to a scope
    pub fn use_middleware(&mut self, scope: ScopeId, handlers: impl IntoIterator<Item = Handler>) {
        self.scopes.push_middleware(scope, handlers);
    }

    /// Append middleware to the scope with exactly `prefix`, creating it if needed
    pub fn use_at(&mut self, prefix: &str, handlers: impl IntoIterator<Item = Handler>) -> ScopeId {
        let id = self.scopes.find_or_create(prefix);
        self.scopes.push_middleware(id, handlers);
        id
    }

    /// Replace the chain run for requests that match no route
    pub fn no_route(&mut self, handlers: impl IntoIterator<Item = Handler>) {
        self.not_found = handlers.into_iter().collect();
        if self.not_found.is_empty() {
            self.not_found.push(default_not_found());
        }
    }

    /// Register a handler chain for `method` and absolute `pattern`
    ///
    /// # Errors
    ///
    /// Any [`RouteError`]; the route table is unchanged on error.
    pub fn register(
        &mut self,
        method: &str,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<(), RouteError> {
        let method = RouteTable::<Vec<Handler>>::parse_method(method)?;
        self.add_route(method, pattern, handlers.into_iter().collect())
    }

    /// Register `relative` under the prefix of `scope`
    ///
    /// # Errors
    ///
    /// Any [`RouteError`]; the route table is unchanged on error.
    pub fn route(
        &mut self,
        scope: ScopeId,
        method: Method,
        relative: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<(), RouteError> {
        let pattern = format!("{}{}", self.scopes.prefix_of(scope), relative);
        self.add_route(method, &pattern, handlers.into_iter().collect())
    }

    fn add_route(&mut self, method: Method, pattern: &str, chain: Vec<Handler>) -> Result<(), RouteError> {
        RouteTable::<Vec<Handler>>::check_pattern(pattern)?;
        if chain.is_empty() {
            return Err(RouteError::MissingHandler {
                pattern: pattern.to_string(),
            });
        }
        match self.routes.insert(method.clone(), pattern, chain) {
            Ok(None) => {
                info!("Route {method:>7} - {pattern}");
                Ok(())
            }
            Ok(Some(_)) => {
                warn!(method = %method, pattern = %pattern, "Route registered twice, handlers replaced");
                Ok(())
            }
            Err(e) => {
                error!(method = %method, pattern = %pattern, error = %e, "Route registration failed");
                Err(e)
            }
        }
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.routes()
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Freeze the engine into a dispatcher
    #[must_use]
    pub fn build(self) -> Dispatcher {
        info!(
            routes = self.routes.len(),
            scopes = self.scopes.iter().count(),
            pool_capacity = self.pool_capacity,
            "Routing table frozen"
        );
        Dispatcher {
            routes: self.routes,
            scopes: self.scopes,
            not_found: self.not_found,
            pool: ContextPool::new(self.pool_capacity),
        }
    }
}

/// Fluent registration against one scope
pub struct ScopeRef<'a> {
    engine: &'a mut Engine,
    id: ScopeId,
}

macro_rules! method_shortcuts {
    ($($name:ident => $method:expr),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($method), "` route relative to this scope")]
            ///
            /// # Errors
            ///
            /// Any [`RouteError`].
            pub fn $name(
                &mut self,
                relative: &str,
                handlers: impl IntoIterator<Item = Handler>,
            ) -> Result<&mut Self, RouteError> {
                self.handle($method, relative, handlers)
            }
        )*
    };
}

impl<'a> ScopeRef<'a> {
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        self.engine.scopes.prefix_of(self.id)
    }

    pub fn use_middleware(&mut self, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.engine.use_middleware(self.id, handlers);
        self
    }

    /// Child scope nested under this one
    pub fn group(&mut self, suffix: &str) -> ScopeRef<'_> {
        let id = self.engine.group(self.id, suffix);
        ScopeRef {
            engine: &mut *self.engine,
            id,
        }
    }

    /// Register a route with an explicit method
    ///
    /// # Errors
    ///
    /// Any [`RouteError`].
    pub fn handle(
        &mut self,
        method: Method,
        relative: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<&mut Self, RouteError> {
        self.engine.route(self.id, method, relative, handlers)?;
        Ok(self)
    }

    method_shortcuts! {
        get => Method::GET,
        post => Method::POST,
        put => Method::PUT,
        patch => Method::PATCH,
        delete => Method::DELETE,
        head => Method::HEAD,
        options => Method::OPTIONS,
    }

    /// Register the same chain for every standard method
    ///
    /// # Errors
    ///
    /// The first [`RouteError`] hit; methods before it stay registered.
    pub fn any(
        &mut self,
        relative: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<&mut Self, RouteError> {
        let chain: Vec<Handler> = handlers.into_iter().collect();
        for method in ANY_METHODS {
            self.engine
                .route(self.id, method, relative, chain.iter().map(Arc::clone))?;
        }
        Ok(self)
    }
}

/// Frozen routing snapshot
///
/// `Send + Sync`; wrap it in an `Arc` to serve from many threads.
pub struct Dispatcher {
    routes: RouteTable<Vec<Handler>>,
    scopes: Scopes,
    not_found: Vec<Handler>,
    pool: ContextPool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("scopes", &self.scopes)
            .field("pool", &self.pool.metrics())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Run the chain for `request` and return the buffered response
    ///
    /// A panic escaping the chain (no recovery middleware installed)
    /// propagates to the caller; the context involved is dropped rather
    /// than returned to the pool.
    pub fn serve(&self, request: Request<Bytes>) -> Response<Bytes> {
        let mut ctx = self.pool.acquire(request);
        self.prepare(&mut ctx);
        ctx.next();
        let response = ctx.take_response();
        self.pool.release(ctx);
        response
    }

    /// Resolve the route and install the chain into `ctx`
    fn prepare(&self, ctx: &mut Context) {
        let method = ctx.method().clone();
        let path = ctx.path().to_string();
        match self.routes.resolve(&method, &path) {
            Some(m) => {
                debug!(method = %method, path = %path, pattern = %m.pattern, "Route matched");
                let chain = ctx.chain_mut();
                self.scopes.collect_middleware(&path, chain);
                chain.extend(m.value.iter().map(Arc::clone));
                ctx.install(m.params, Some(m.pattern));
            }
            None => {
                ctx.chain_mut()
                    .extend(self.not_found.iter().map(Arc::clone));
                ctx.install(Params::new(), None);
            }
        }
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.routes()
    }

    #[must_use]
    pub fn pool_metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }
}
