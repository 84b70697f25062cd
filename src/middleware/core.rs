use std::sync::Arc;

use crate::dispatcher::Context;

/// One link of a handler chain
///
/// Handlers receive the request context and return nothing. A handler that
/// wants to stop the chain calls [`Context::abort`]; one that wants to run
/// code after the rest of the chain calls [`Context::next`] first.
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Stateful middleware
///
/// Implement this for middleware that carries configuration, then turn it
/// into a chain link with [`Middleware::into_handler`].
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, c: &mut Context);

    fn into_handler(self) -> Handler
    where
        Self: Sized,
    {
        Arc::new(move |c: &mut Context| self.handle(c))
    }
}
