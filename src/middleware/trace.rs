//! Per-request tracing span with method, path, status and latency.

use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, info, info_span};

use super::Middleware;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::request::Request;

/// Returns the [`Trace`] middleware.
///
/// Register it first so its span encloses every other layer:
///
/// ```rust
/// use chain::{Router, middleware};
///
/// let mut app = Router::new();
/// app.with(middleware::trace());
/// ```
pub fn trace() -> Trace {
    Trace
}

/// Opens an `info` span per request and logs the outcome when the inner
/// chain completes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(TraceHandler { next })
    }
}

struct TraceHandler {
    next: BoxedHandler,
}

impl Handler for TraceHandler {
    fn call(&self, req: Request) -> BoxFuture {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        let start = Instant::now();
        let fut = span.in_scope(|| self.next.call(req));
        Box::pin(
            async move {
                let res = fut.await;
                info!(
                    status = res.status_code().as_u16(),
                    latency_us = start.elapsed().as_micros() as u64,
                    "request completed"
                );
                res
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn passes_response_through_unchanged() {
        let inner: BoxedHandler = Arc::new(handler_fn(|_req| async { "traced" }));
        let res = trace().wrap(inner).call(Request::new(Method::GET, "/t")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"traced");
    }
}
