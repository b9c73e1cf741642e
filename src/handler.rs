//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The dispatch table holds handlers of *different* types in one radix tree
//! per method, and middleware wraps them in further types of its own. Rust
//! collections can only hold one concrete type, so every handler is hidden
//! behind a trait object (`dyn Handler`) and stored as a [`BoxedHandler`].
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ router.handle_func("GET /", hello)
//! HandlerFn(hello)                                 ← adapter
//!        ↓ middleware.wrap(…) for each layer       ← at registration
//! Arc<dyn Handler>                                 ← stored in the table
//!        ↓
//! handler.call(req)  at request time               ← one vtable dispatch per layer
//! ```
//!
//! The only runtime cost per request is **one Arc clone** (atomic inc) +
//! **one virtual call per layer**.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Pin<Box<…>>` is required because the async runtime must be able to poll
/// the future in-place. `Send + 'static` let tokio move the future across
/// threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

// ── Public Handler trait ───────────────────────────────────────────────────────

/// Something that turns a [`Request`] into a [`Response`].
///
/// The router never looks inside a handler. Route handlers, middleware
/// layers and the [`Router`](crate::Router) itself all implement this trait,
/// which is what lets a router be mounted under another router.
///
/// Plain `async fn`s are adapted with [`handler_fn`] (or registered directly
/// through [`Router::handle_func`](crate::Router::handle_func)).
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, req: Request) -> BoxFuture {
        (**self).call(req)
    }
}

// ── Function adapter ───────────────────────────────────────────────────────────

/// Adapter that lets an async function be used as a [`Handler`].
///
/// Any `Fn(Request) -> impl Future<Output = impl IntoResponse>` qualifies:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
#[derive(Clone, Copy)]
pub struct HandlerFn<F>(F);

/// Wraps `f` in a [`HandlerFn`].
pub fn handler_fn<F, Fut, R>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    HandlerFn(f)
}

impl<F, Fut, R> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        // The concrete `Fut` is mapped to `Response` and boxed so the return
        // type matches the trait signature.
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
