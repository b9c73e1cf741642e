//! Minimal chain example — global tracing, an authenticated group and a
//! nested group with its own extra layer.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X DELETE http://localhost:3000/users/42                       # 401
//!   curl -X DELETE -H 'authorization: Bearer t' http://localhost:3000/users/42
//!   curl -H 'authorization: Bearer t' http://localhost:3000/admin/audit
//!   curl -X PUT http://localhost:3000/users/42                          # 405

use chain::middleware::{self, Next};
use chain::{Request, Response, Router, Server, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut app = Router::new();
    app.with(middleware::trace())
        .handle_func("GET /users/{id}", get_user)
        .handle_func("POST /users", create_user)
        .group(|authed| {
            authed.with(middleware::from_fn(require_token))
                .handle_func("DELETE /users/{id}", delete_user)
                .group(|admin| {
                    admin.with(middleware::from_fn(no_store))
                        .handle_func("GET /admin/audit", audit);
                });
        });

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// Stops the chain before the handler when no credentials are sent.
async fn require_token(req: Request, next: Next) -> Response {
    if req.header("authorization").is_none() {
        return Response::status(StatusCode::UNAUTHORIZED);
    }
    next.run(req).await
}

// Runs after the handler, on the way out.
async fn no_store(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    res.headers_mut().insert("cache-control", "no-store".parse().unwrap());
    res
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// POST /users
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#)
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

// GET /admin/audit
async fn audit(_req: Request) -> &'static str {
    "audit log"
}
