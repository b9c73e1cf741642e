//! Middleware ordering, scoping and table sharing, driven through the
//! router's `Handler` impl.

use std::sync::{Arc, Mutex};

use chain::middleware::{self, Next};
use chain::{BoxedHandler, Handler, Method, Middleware, Request, Response, Router, StatusCode, handler_fn};

type Log = Arc<Mutex<Vec<String>>>;

/// Records entry and exit around the inner chain.
fn recorder(log: &Log, name: &'static str) -> impl Middleware + use<> {
    let log = Arc::clone(log);
    middleware::from_fn(move |req: Request, next: Next| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(format!("{name}>"));
            let res = next.run(req).await;
            log.lock().unwrap().push(format!("<{name}"));
            res
        }
    })
}

/// Answers without calling the inner chain.
fn blocker(log: &Log, name: &'static str) -> impl Middleware + use<> {
    let log = Arc::clone(log);
    middleware::from_fn(move |_req: Request, _next: Next| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(format!("{name}!"));
            Response::status(StatusCode::FORBIDDEN)
        }
    })
}

fn endpoint(log: &Log) -> impl Handler + use<> {
    let log = Arc::clone(log);
    handler_fn(move |_req| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push("h".to_owned());
            "done"
        }
    })
}

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.lock().unwrap())
}

async fn get(app: &Router, path: &str) -> Response {
    app.call(Request::new(Method::GET, path)).await
}

#[tokio::test]
async fn middleware_runs_in_registration_order() {
    let log = new_log();
    let mut app = Router::new();
    app.with(recorder(&log, "m0"))
        .with(recorder(&log, "m1"))
        .with(recorder(&log, "m2"))
        .handle("GET /", endpoint(&log));

    let res = get(&app, "/").await;
    assert_eq!(res.body(), b"done");
    assert_eq!(take(&log), ["m0>", "m1>", "m2>", "h", "<m2", "<m1", "<m0"]);
}

#[tokio::test]
async fn groups_are_isolated_from_later_parent_middleware() {
    let log = new_log();
    let mut app = Router::new();
    app.with(recorder(&log, "a"));
    app.handle("GET /before", endpoint(&log));
    app.group(|child| {
        child.handle("GET /child", endpoint(&log));
    });
    app.with(recorder(&log, "b"));
    app.handle("GET /after", endpoint(&log));

    get(&app, "/before").await;
    assert_eq!(take(&log), ["a>", "h", "<a"]);

    get(&app, "/child").await;
    assert_eq!(take(&log), ["a>", "h", "<a"]);

    get(&app, "/after").await;
    assert_eq!(take(&log), ["a>", "b>", "h", "<b", "<a"]);
}

#[tokio::test]
async fn group_middleware_does_not_leak_upward_or_sideways() {
    let log = new_log();
    let mut app = Router::new();
    app.group(|left| {
        left.with(recorder(&log, "l")).handle("GET /left", endpoint(&log));
    });
    app.group(|right| {
        right.handle("GET /right", endpoint(&log));
    });
    app.handle("GET /root", endpoint(&log));

    get(&app, "/right").await;
    assert_eq!(take(&log), ["h"]);

    get(&app, "/root").await;
    assert_eq!(take(&log), ["h"]);

    get(&app, "/left").await;
    assert_eq!(take(&log), ["l>", "h", "<l"]);
}

#[tokio::test]
async fn routes_from_any_scope_share_one_table() {
    let log = new_log();
    let mut app = Router::new();
    app.group(|a| {
        a.group(|deep| {
            deep.handle("GET /deep", endpoint(&log));
        });
    });

    assert_eq!(get(&app, "/deep").await.status_code(), StatusCode::OK);

    // A sibling opened later writes to the same table, so it collides.
    let mut collided = false;
    app.group(|sibling| {
        collided = sibling.try_handle("GET /deep", endpoint(&log)).is_err();
    });
    assert!(collided);
}

#[tokio::test]
async fn short_circuit_at_every_position() {
    for blocked_at in 0..3 {
        let log = new_log();
        let mut app = Router::new();
        for i in 0..3 {
            if i == blocked_at {
                app.with(blocker(&log, ["m0", "m1", "m2"][i]));
            } else {
                app.with(recorder(&log, ["m0", "m1", "m2"][i]));
            }
        }
        app.handle("GET /", endpoint(&log));

        let res = get(&app, "/").await;
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

        let entries = take(&log);
        assert!(!entries.contains(&"h".to_owned()), "handler ran with blocker at {blocked_at}");
        let inner = format!("m{}>", blocked_at + 1);
        assert!(!entries.contains(&inner), "inner middleware ran with blocker at {blocked_at}");
        assert!(entries.contains(&format!("m{blocked_at}!")));
    }
}

#[tokio::test]
async fn nested_groups_accumulate_depth_first() {
    let log = new_log();
    let mut app = Router::new();
    app.with(recorder(&log, "a"));
    app.group(|c1| {
        c1.with(recorder(&log, "b"));
        c1.group(|c2| {
            c2.with(recorder(&log, "d"));
            c2.handle("GET /nested", endpoint(&log));
        });
        c1.with(recorder(&log, "late"));
        c1.handle("GET /c1", endpoint(&log));
    });
    app.handle("GET /top", endpoint(&log));

    get(&app, "/nested").await;
    assert_eq!(take(&log), ["a>", "b>", "d>", "h", "<d", "<b", "<a"]);

    get(&app, "/c1").await;
    assert_eq!(take(&log), ["a>", "b>", "late>", "h", "<late", "<b", "<a"]);

    get(&app, "/top").await;
    assert_eq!(take(&log), ["a>", "h", "<a"]);
}

#[test]
#[should_panic(expected = "invalid route `GET /dup`")]
fn duplicate_pattern_panics() {
    let mut app = Router::new();
    app.handle_func("GET /dup", |_req| async { "first" });
    app.handle_func("GET /dup", |_req| async { "second" });
}

#[tokio::test]
async fn duplicate_from_a_group_keeps_the_first_route() {
    let mut app = Router::new();
    app.handle_func("GET /dup", |_req| async { "first" });

    let mut outcome = None;
    app.group(|child| {
        outcome = Some(child.try_handle("GET /dup", handler_fn(|_req| async { "second" })));
    });

    assert!(matches!(outcome, Some(Err(chain::Error::Route { .. }))));
    assert_eq!(get(&app, "/dup").await.body(), b"first");
}

#[tokio::test]
async fn router_mounts_under_another_router() {
    let mut api = Router::new();
    api.handle_func("GET /api/users/{id}", |req: Request| async move {
        format!("user {}", req.param("id").unwrap_or_default())
    });

    let log = new_log();
    let mut app = Router::new();
    app.with(recorder(&log, "outer")).handle("/api/{*rest}", api);

    let res = get(&app, "/api/users/7").await;
    assert_eq!(res.body(), b"user 7");
    assert_eq!(take(&log), ["outer>", "<outer"]);
}

#[tokio::test]
async fn closure_middleware_wraps_like_from_fn() {
    let mut app = Router::new();
    app.with(|next: BoxedHandler| -> BoxedHandler {
        Arc::new(handler_fn(move |req: Request| {
            let next = Arc::clone(&next);
            async move {
                let mut res = next.call(req).await;
                res.headers_mut().insert("x-wrapped", "yes".parse().unwrap());
                res
            }
        }))
    });
    app.handle_func("GET /", |_req| async { "ok" });

    assert_eq!(get(&app, "/").await.header("x-wrapped"), Some("yes"));
}
