//! Middleware layer.
//!
//! A middleware is a transformation from one handler to another: it receives
//! the rest of the chain and returns a handler that may run code before and
//! after it, or not call it at all. Cross-cutting concerns such as tracing,
//! authentication or panic recovery are written this way and composed by the
//! [`Router`](crate::Router); the router itself adds no behaviour of its own.
//!
//! Two ways to write one:
//!
//! ```rust
//! use std::sync::Arc;
//! use chain::{BoxedHandler, Handler, Request, Router, handler_fn};
//! use chain::middleware::{self, Next};
//!
//! let mut router = Router::new();
//!
//! // A plain `Fn(BoxedHandler) -> BoxedHandler`.
//! router.with(|next: BoxedHandler| -> BoxedHandler {
//!     Arc::new(handler_fn(move |req| next.call(req)))
//! });
//!
//! // An async function with an explicit `next` stage.
//! router.with(middleware::from_fn(|req: Request, next: Next| async move {
//!     next.run(req).await
//! }));
//! ```

mod trace;

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::request::Request;
use crate::response::IntoResponse;

pub use trace::{Trace, trace};

/// Wraps a handler in another handler.
///
/// `wrap` runs once per route, at registration time. Whatever it returns is
/// what the dispatch table stores.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self(next)
    }
}

/// A type-erased middleware, cheap to clone into a group's snapshot.
pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the chain, handed to a [`from_fn`] middleware.
///
/// Dropping it without calling [`run`](Next::run) short-circuits: no inner
/// middleware and no handler will execute for this request.
pub struct Next(BoxedHandler);

impl Next {
    pub fn run(self, req: Request) -> BoxFuture {
        self.0.call(req)
    }
}

/// Builds a middleware from an async function taking the request and the
/// [`Next`] stage.
///
/// ```rust
/// use chain::{IntoResponse, Request, StatusCode};
/// use chain::middleware::{self, Next};
///
/// let require_token = middleware::from_fn(|req: Request, next: Next| async move {
///     if req.header("authorization").is_none() {
///         return StatusCode::UNAUTHORIZED.into_response();
///     }
///     next.run(req).await
/// });
/// ```
pub fn from_fn<F, Fut, R>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    FromFn { f: Arc::new(f) }
}

/// Middleware returned by [`from_fn`].
pub struct FromFn<F> {
    f: Arc<F>,
}

impl<F, Fut, R> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(FromFnHandler { f: Arc::clone(&self.f), next })
    }
}

struct FromFnHandler<F> {
    f: Arc<F>,
    next: BoxedHandler,
}

impl<F, Fut, R> Handler for FromFnHandler<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.f)(req, Next(Arc::clone(&self.next)));
        Box::pin(async move { fut.await.into_response() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::response::Response;
    use http::{Method, StatusCode};

    fn teapot() -> BoxedHandler {
        Arc::new(handler_fn(|_req| async { StatusCode::IM_A_TEAPOT }))
    }

    #[tokio::test]
    async fn from_fn_post_processes_the_response() {
        let mw = from_fn(|req: Request, next: Next| async move {
            let mut res = next.run(req).await;
            res.headers_mut().insert("x-layer", http::HeaderValue::from_static("1"));
            res
        });
        let res = mw.wrap(teapot()).call(Request::new(Method::GET, "/")).await;
        assert_eq!(res.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(res.header("x-layer"), Some("1"));
    }

    #[tokio::test]
    async fn dropping_next_skips_the_handler() {
        let mw = from_fn(|_req: Request, _next: Next| async { Response::status(StatusCode::FORBIDDEN) });
        let res = mw.wrap(teapot()).call(Request::new(Method::GET, "/")).await;
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn closures_are_middleware() {
        let mw = |_next: BoxedHandler| -> BoxedHandler {
            Arc::new(handler_fn(|_req| async { StatusCode::GONE }))
        };
        let res = mw.wrap(teapot()).call(Request::new(Method::GET, "/")).await;
        assert_eq!(res.status_code(), StatusCode::GONE);
    }
}
