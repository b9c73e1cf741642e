//! # chain
//!
//! An HTTP request router with composable middleware.
//!
//! ## The model
//!
//! A [`Router`] holds a dispatch table and an ordered list of middleware.
//! Registering a route folds that list over the handler once, up front, and
//! stores the finished chain. Serving a request is a table lookup and a call;
//! no middleware bookkeeping happens per request.
//!
//! [`Router::group`] opens a child scope that shares the table but owns a
//! copy of the middleware list, so a subset of routes can get extra layers
//! (authentication, say) without touching the rest.
//!
//! What chain leaves to others:
//!
//! - **Concrete middleware**: logging, auth and recovery are ordinary
//!   [`Middleware`] values; only [`middleware::trace`] ships built in
//! - **Pattern matching**: delegated to the [`matchit`] radix tree
//! - **TLS, limits, slow clients**: the reverse proxy in front of you
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use chain::{Request, Response, Router, Server, StatusCode, middleware};
//! use chain::middleware::Next;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = Router::new();
//!     app.with(middleware::trace())
//!         .handle_func("GET /users/{id}", get_user)
//!         .group(|admin| {
//!             admin.with(middleware::from_fn(require_token))
//!                 .handle_func("DELETE /users/{id}", delete_user);
//!         });
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn require_token(req: Request, next: Next) -> Response {
//!     match req.header("authorization") {
//!         Some(_) => next.run(req).await,
//!         None => Response::status(StatusCode::UNAUTHORIZED),
//!     }
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn delete_user(_req: Request) -> StatusCode {
//!     StatusCode::NO_CONTENT
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod table;

pub mod middleware;

pub use error::{Error, RouteError};
pub use handler::{BoxFuture, BoxedHandler, Handler, HandlerFn, handler_fn};
pub use http::{Method, StatusCode};
pub use middleware::Middleware;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
