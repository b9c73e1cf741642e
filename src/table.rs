//! Radix-tree dispatch table.
//!
//! One tree per HTTP method, plus one for patterns registered without a
//! method. O(path-length) lookup. No middleware here: the table stores
//! handlers that are already fully wrapped and hands them back on a match.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::error::{Error, RouteError};
use crate::handler::BoxedHandler;

/// Outcome of a lookup.
pub(crate) enum Lookup {
    Found(BoxedHandler, HashMap<String, String>),
    /// The path exists, but only under these methods.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

#[derive(Default)]
pub(crate) struct Table {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    any: MatchitRouter<BoxedHandler>,
}

impl Table {
    /// Registers `handler` under `pattern`.
    ///
    /// Fails without touching the table if the pattern is malformed or
    /// collides with an existing route.
    pub(crate) fn insert(&mut self, pattern: &str, handler: BoxedHandler) -> Result<(), Error> {
        let route_error = |reason| Error::Route { pattern: pattern.to_owned(), reason };

        let (method, path) = split_pattern(pattern).map_err(route_error)?;
        let tree = match method {
            Some(m) => self.routes.entry(m).or_default(),
            None => &mut self.any,
        };
        tree.insert(path, handler)
            .map_err(|e| route_error(RouteError::Insert(e)))
    }

    /// Precedence: the request method's tree, `GET` for a `HEAD` request,
    /// then the method-less tree.
    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let matched = self.at(method, path)
            .or_else(|| if *method == Method::HEAD { self.at(&Method::GET, path) } else { None })
            .or_else(|| self.any.at(path).ok());

        if let Some(m) = matched {
            let handler = Arc::clone(m.value);
            let params = m.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Lookup::Found(handler, params);
        }

        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect();
        if allowed.is_empty() {
            return Lookup::NotFound;
        }
        if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
            allowed.push(Method::HEAD);
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Lookup::MethodNotAllowed(allowed)
    }

    fn at<'t, 'p>(&'t self, method: &Method, path: &'p str)
        -> Option<matchit::Match<'t, 'p, &'t BoxedHandler>>
    {
        self.routes.get(method)?.at(path).ok()
    }
}

/// Splits `"GET /users/{id}"` into its method and path. A pattern with no
/// method prefix matches every method.
fn split_pattern(pattern: &str) -> Result<(Option<Method>, &str), RouteError> {
    match pattern.split_once(' ') {
        Some((method, path)) => {
            let method = Method::from_bytes(method.as_bytes())
                .map_err(|_| RouteError::InvalidMethod(method.to_owned()))?;
            Ok((Some(method), path.trim_start()))
        }
        None => Ok((None, pattern)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    fn noop() -> BoxedHandler {
        Arc::new(handler_fn(|_req| async { "" }))
    }

    #[test]
    fn splits_method_prefix() {
        assert_eq!(split_pattern("GET /a").unwrap(), (Some(Method::GET), "/a"));
        assert_eq!(split_pattern("/a").unwrap(), (None, "/a"));
        assert!(matches!(split_pattern("G(T /a"), Err(RouteError::InvalidMethod(_))));
    }

    #[test]
    fn method_tree_wins_over_any() {
        let mut table = Table::default();
        table.insert("/users/{id}", noop()).unwrap();
        table.insert("POST /users/{id}", noop()).unwrap();

        assert!(matches!(table.lookup(&Method::DELETE, "/users/1"), Lookup::Found(..)));
        match table.lookup(&Method::POST, "/users/7") {
            Lookup::Found(_, params) => assert_eq!(params["id"], "7"),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn head_falls_back_to_get() {
        let mut table = Table::default();
        table.insert("GET /page", noop()).unwrap();
        assert!(matches!(table.lookup(&Method::HEAD, "/page"), Lookup::Found(..)));
    }

    #[test]
    fn reports_allowed_methods() {
        let mut table = Table::default();
        table.insert("GET /items", noop()).unwrap();
        table.insert("POST /items", noop()).unwrap();

        match table.lookup(&Method::DELETE, "/items") {
            Lookup::MethodNotAllowed(allowed) => {
                assert_eq!(allowed, vec![Method::GET, Method::HEAD, Method::POST]);
            }
            _ => panic!("expected 405"),
        }
        assert!(matches!(table.lookup(&Method::GET, "/nope"), Lookup::NotFound));
    }

    #[test]
    fn duplicate_keeps_first_registration() {
        let mut table = Table::default();
        table.insert("GET /dup", noop()).unwrap();
        let err = table.insert("GET /dup", noop()).unwrap_err();
        assert!(matches!(err, Error::Route { reason: RouteError::Insert(_), .. }));
        assert!(matches!(table.lookup(&Method::GET, "/dup"), Lookup::Found(..)));
    }
}
