//! Request router with scoped middleware.
//!
//! A [`Router`] is one scope of route registration: a handle to the shared
//! dispatch table plus its own ordered middleware list. [`Router::group`]
//! derives a child scope that shares the table and starts from a snapshot of
//! the parent's middleware, so routes registered in the group get extra
//! layers without the parent noticing.
//!
//! Middleware is applied when a route is *registered*, not when a request
//! arrives. Each route's chain is fixed at that moment; later calls to
//! [`Router::with`] only affect routes registered after them.

use std::future::{Future, ready};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use http::StatusCode;
use http::header::ALLOW;
use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, Handler, handler_fn};
use crate::middleware::{BoxedMiddleware, Middleware};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::table::{Lookup, Table};

/// The application router.
///
/// Build it once at startup, then pass it to [`Server::serve`](crate::Server::serve)
/// or mount it wherever a [`Handler`] is expected. Registration methods
/// return `&mut Self` so calls chain naturally:
///
/// ```rust
/// use chain::{Request, Router, middleware};
///
/// # async fn list_users(_: Request) -> &'static str { "" }
/// # async fn delete_user(_: Request) -> &'static str { "" }
/// # let require_admin = middleware::from_fn(|req: Request, next: middleware::Next| next.run(req));
/// let mut app = Router::new();
/// app.with(middleware::trace())
///     .handle_func("GET /users", list_users)
///     .group(|admin| {
///         admin.with(require_admin)
///             .handle_func("DELETE /users/{id}", delete_user);
///     });
/// ```
///
/// # Patterns
///
/// `"METHOD /path"` matches one method (`GET` also answers `HEAD`);
/// a bare `"/path"` matches any method. Paths use `{name}` parameters and
/// a trailing `{*rest}` catch-all.
///
/// # Concurrency
///
/// Registration is meant to finish before serving starts. The table sits
/// behind a read-write lock, so late registration is sound, but a request
/// racing it may or may not see the new route.
pub struct Router {
    table: Arc<RwLock<Table>>,
    middleware: Vec<BoxedMiddleware>,
}

impl Router {
    /// A router with an empty dispatch table and no middleware.
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table::default())),
            middleware: Vec::new(),
        }
    }

    /// Appends `mw` to this router's middleware list.
    ///
    /// Middleware runs in the order it was added: the first call wraps
    /// outermost. Routes already registered, and every other router
    /// (parent, child or sibling), are unaffected.
    pub fn with(&mut self, mw: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(mw));
        self
    }

    /// Runs `f` against a child router that shares this router's dispatch
    /// table and starts with a copy of its current middleware.
    ///
    /// Whatever `f` adds with [`with`](Router::with) stays inside the group.
    /// Groups nest; each level snapshots its immediate parent.
    pub fn group(&mut self, f: impl FnOnce(&mut Router)) -> &mut Self {
        let mut child = Router {
            table: Arc::clone(&self.table),
            middleware: self.middleware.clone(),
        };
        debug!(inherited = child.middleware.len(), "group opened");
        f(&mut child);
        self
    }

    /// Registers `handler` under `pattern`, wrapped in this router's current
    /// middleware.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is malformed or already registered on the shared
    /// table, from this router or any other. Use [`try_handle`](Router::try_handle)
    /// to get the error instead.
    pub fn handle(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        if let Err(e) = self.try_handle(pattern, handler) {
            panic!("{e}");
        }
        self
    }

    /// Like [`handle`](Router::handle), for a plain async function.
    pub fn handle_func<F, Fut, R>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.handle(pattern, handler_fn(f))
    }

    /// Registers `handler` under `pattern`, returning an error on a malformed
    /// or duplicate pattern. The first registration of a pattern is never
    /// replaced.
    pub fn try_handle(&mut self, pattern: &str, handler: impl Handler) -> Result<(), Error> {
        let wrapped = self.wrap(Arc::new(handler));
        self.write_table().insert(pattern, wrapped)?;
        debug!(pattern, layers = self.middleware.len(), "route registered");
        Ok(())
    }

    /// Folds the middleware list over `handler`, last to first, so the
    /// first-added middleware ends up outermost.
    fn wrap(&self, handler: BoxedHandler) -> BoxedHandler {
        self.middleware.iter()
            .rev()
            .fold(handler, |inner, mw| mw.wrap(inner))
    }

    // The table is never left half-updated, so a poisoned lock is still usable.
    fn read_table(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, Table> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Dispatch: one table lookup, then the pre-built chain. `404` when nothing
/// matches, `405` with an `allow` header when only other methods match.
impl Handler for Router {
    fn call(&self, mut req: Request) -> BoxFuture {
        let found = self.read_table().lookup(&req.method, &req.path);
        match found {
            Lookup::Found(handler, params) => {
                req.params = params;
                handler.call(req)
            }
            Lookup::MethodNotAllowed(allowed) => {
                let allow = allowed.iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let res = Response::builder()
                    .status(StatusCode::METHOD_NOT_ALLOWED)
                    .header(ALLOW.as_str(), &allow)
                    .no_body();
                Box::pin(ready(res))
            }
            Lookup::NotFound => Box::pin(ready(Response::status(StatusCode::NOT_FOUND))),
        }
    }
}
