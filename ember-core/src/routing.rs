//! Trie-based HTTP router.
//!
//! Routes are compiled into one [`matchit::Router`] per HTTP method so that a
//! request which matches no method-specific trie but *would* match under a
//! different method can be reported as `405 Method Not Allowed` (with an
//! `Allow` header) instead of `404 Not Found`. Path segments may carry a type
//! tag (`{id:int}`, `{id:uuid}`, ...) which is compiled down to a plain
//! `matchit` capture plus a [`RouteConstraints`] check folded into the match
//! itself: a segment whose value fails its declared type coerces to "no
//! match" rather than a hard error, so e.g. `/users/{id:int}` simply does not
//! match `/users/abc` and the lookup falls through to `MethodNotAllowed` or
//! `NotFound` like any other non-matching path.

use crate::route_constraint::{FloatConstraint, IntConstraint, RouteConstraints, UuidConstraint};
use crate::{Error, HttpMethod, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::sync::Arc;

/// A route handler function type.
pub type HandlerFn = Arc<
    dyn Fn(
            HttpRequest,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<HttpResponse, Error>> + Send>,
        > + Send
        + Sync,
>;

/// A single registered route.
#[derive(Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    pub handler: HandlerFn,
}

struct RouteEntry {
    method: HttpMethod,
    pattern: String,
    handler: HandlerFn,
    constraints: RouteConstraints,
}

/// Router-wide behavior that isn't implied by the registered routes themselves.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// When `true`, a `HEAD` request with no registered `HEAD` route falls
    /// back to the matching `GET` route's handler (body discarded by the
    /// transport), and an `OPTIONS` request with no registered `OPTIONS`
    /// route is synthesized from the path's `Allow` set. Off by default:
    /// synthesis hides a route author's explicit method choices, so it is
    /// opt-in.
    pub synthesize_head_options: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            synthesize_head_options: false,
        }
    }
}

/// Outcome of matching a method + path against the registered routes.
pub enum RouteLookup {
    Found {
        index: usize,
        params: HashMap<String, String>,
    },
    MethodNotAllowed {
        allowed: Vec<HttpMethod>,
    },
    NotFound,
}

/// Trie-based router for managing routes and dispatching requests.
pub struct Router {
    method_tries: HashMap<HttpMethod, matchit::Router<usize>>,
    entries: Vec<RouteEntry>,
    config: RouterConfig,
}

impl Router {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            method_tries: HashMap::new(),
            entries: Vec::new(),
            config,
        }
    }

    /// Register a route, compiling its pattern into the method's trie.
    ///
    /// Fails with [`Error::InvalidPattern`] if a `{name:type}` tag names an
    /// unknown type, or [`Error::ConflictingRoute`] if the pattern conflicts
    /// with an already-registered pattern for the same method (e.g. two
    /// different parameter names at the same trie position).
    pub fn register(
        &mut self,
        method: HttpMethod,
        pattern: impl Into<String>,
        handler: HandlerFn,
    ) -> Result<(), Error> {
        let pattern = pattern.into();
        let (matchit_pattern, constraints) = compile_pattern(&pattern)?;

        let index = self.entries.len();
        let trie = self.method_tries.entry(method).or_insert_with(matchit::Router::new);
        trie.insert(&matchit_pattern, index).map_err(|e| {
            Error::ConflictingRoute {
                method: method.as_str().to_string(),
                path: pattern.clone(),
                with: e.to_string(),
            }
        })?;

        self.entries.push(RouteEntry {
            method,
            pattern,
            handler,
            constraints,
        });
        Ok(())
    }

    /// Add a route to the router (legacy call shape kept for call sites that
    /// build a [`Route`] value directly rather than calling `register`).
    pub fn add_route(&mut self, route: Route) -> Result<(), Error> {
        self.register(route.method, route.path, route.handler)
    }

    /// Look up a method + path, without running the handler.
    pub fn lookup(&self, method: HttpMethod, path: &str) -> RouteLookup {
        if let Some(trie) = self.method_tries.get(&method) {
            if let Some((index, params)) = self.match_in_trie(trie, path) {
                return RouteLookup::Found { index, params };
            }
        }

        let mut allowed: Vec<HttpMethod> = self
            .method_tries
            .iter()
            .filter(|(m, _)| **m != method)
            .filter(|(_, trie)| self.match_in_trie(trie, path).is_some())
            .map(|(m, _)| *m)
            .collect();

        if allowed.is_empty() {
            RouteLookup::NotFound
        } else {
            allowed.sort_by_key(|m| m.as_str());
            RouteLookup::MethodNotAllowed { allowed }
        }
    }

    /// Match `path` against one method's trie and apply that route's type
    /// constraints. A structural trie hit whose parameter fails its
    /// constraint (e.g. `{id:int}` against `abc`) is treated the same as no
    /// trie hit at all, per the "coercion failure = no match" matching rule.
    fn match_in_trie(
        &self,
        trie: &matchit::Router<usize>,
        path: &str,
    ) -> Option<(usize, HashMap<String, String>)> {
        let matched = trie.at(path).ok()?;
        let params: HashMap<String, String> = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let entry = &self.entries[*matched.value];
        if entry.constraints.matches(&params) {
            Some((*matched.value, params))
        } else {
            None
        }
    }

    /// Find a route that matches the request and invoke its handler.
    pub async fn route(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let (path, query_string) = request
            .path
            .split_once('?')
            .map(|(p, q)| (p.to_string(), Some(q.to_string())))
            .unwrap_or_else(|| (request.path.clone(), None));

        if let Some(query) = query_string {
            request.query_params = parse_query_string(&query);
        }

        let method = HttpMethod::from_str(&request.method)
            .ok_or_else(|| Error::BadRequest(format!("unsupported method: {}", request.method)))?;

        match self.lookup(method, &path) {
            RouteLookup::Found { index, params } => {
                let entry = &self.entries[index];
                request.path_params = params;
                (entry.handler)(request).await
            }
            RouteLookup::MethodNotAllowed { allowed } => {
                let allow_header = allowed
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(HttpResponse::new(405)
                    .with_header("allow".to_string(), allow_header)
                    .with_body(format!("{} not allowed on {}", method, path).into_bytes()))
            }
            RouteLookup::NotFound => {
                Err(Error::RouteNotFound(format!("{} {}", request.method, path)))
            }
        }
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered `(method, pattern)` pairs, for diagnostics and tests.
    pub fn routes(&self) -> impl Iterator<Item = (HttpMethod, &str)> {
        self.entries.iter().map(|e| (e.method, e.pattern.as_str()))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a `{name}` / `{name:type}` pattern into a `matchit`-compatible
/// pattern plus the type constraints extracted from it.
fn compile_pattern(pattern: &str) -> Result<(String, RouteConstraints), Error> {
    let segments: Vec<&str> = pattern.split('/').collect();
    let last_index = segments.len().saturating_sub(1);
    let mut compiled = Vec::with_capacity(segments.len());
    let mut constraints = RouteConstraints::new();

    for (i, segment) in segments.iter().enumerate() {
        if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            let (name, type_tag) = match inner.split_once(':') {
                Some((name, tag)) => (name, tag),
                None => (inner, "str"),
            };

            if name.is_empty() {
                return Err(Error::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: "path parameter name cannot be empty".to_string(),
                });
            }

            match type_tag {
                "str" => compiled.push(format!("{{{}}}", name)),
                "int" => {
                    compiled.push(format!("{{{}}}", name));
                    constraints.add_mut(name, Box::new(IntConstraint));
                }
                "float" => {
                    compiled.push(format!("{{{}}}", name));
                    constraints.add_mut(name, Box::new(FloatConstraint));
                }
                "uuid" => {
                    compiled.push(format!("{{{}}}", name));
                    constraints.add_mut(name, Box::new(UuidConstraint));
                }
                "path" => {
                    if i != last_index {
                        return Err(Error::InvalidPattern {
                            pattern: pattern.to_string(),
                            reason: format!(
                                "':path' segment '{{{}}}' must be the last path segment",
                                inner
                            ),
                        });
                    }
                    compiled.push(format!("{{*{}}}", name));
                }
                other => {
                    return Err(Error::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: format!(
                            "unknown path parameter type '{}' (expected str, int, float, uuid, or path)",
                            other
                        ),
                    });
                }
            }
        } else {
            compiled.push((*segment).to_string());
        }
    }

    Ok((compiled.join("/"), constraints))
}

/// Parse a query string into a map of parameters.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            let key = split.next()?;
            let value = split.next().unwrap_or("");
            Some((
                urlencoding::decode(key).map(|c| c.into_owned()).unwrap_or_else(|_| key.to_string()),
                urlencoding::decode(value).map(|c| c.into_owned()).unwrap_or_else(|_| value.to_string()),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_handler() -> HandlerFn {
        Arc::new(|_req| Box::pin(async move { Ok(HttpResponse::ok()) }))
    }

    fn make_router() -> Router {
        Router::new()
    }

    #[tokio::test]
    async fn routes_static_path() {
        let mut router = make_router();
        router
            .register(HttpMethod::GET, "/users", ok_handler())
            .unwrap();

        let req = HttpRequest::new("GET".to_string(), "/users".to_string());
        let resp = router.route(req).await.unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn routes_named_param() {
        let mut router = make_router();
        router
            .register(
                HttpMethod::GET,
                "/users/{id}",
                Arc::new(|req| {
                    Box::pin(async move {
                        assert_eq!(req.path_params.get("id"), Some(&"42".to_string()));
                        Ok(HttpResponse::ok())
                    })
                }),
            )
            .unwrap();

        let req = HttpRequest::new("GET".to_string(), "/users/42".to_string());
        let resp = router.route(req).await.unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn non_integer_for_typed_int_segment_is_not_found() {
        let mut router = make_router();
        router
            .register(HttpMethod::GET, "/users/{id:int}", ok_handler())
            .unwrap();

        let req = HttpRequest::new("GET".to_string(), "/users/abc".to_string());
        let err = router.route(req).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn accepts_integer_for_typed_int_segment() {
        let mut router = make_router();
        router
            .register(HttpMethod::GET, "/users/{id:int}", ok_handler())
            .unwrap();

        let req = HttpRequest::new("GET".to_string(), "/users/123".to_string());
        let resp = router.route(req).await.unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn method_not_allowed_includes_allow_header() {
        let mut router = make_router();
        router
            .register(HttpMethod::GET, "/users/{id}", ok_handler())
            .unwrap();
        router
            .register(HttpMethod::POST, "/users/{id}", ok_handler())
            .unwrap();

        let req = HttpRequest::new("DELETE".to_string(), "/users/1".to_string());
        let resp = router.route(req).await.unwrap();
        assert_eq!(resp.status, 405);
        assert_eq!(resp.headers.get("allow").map(String::as_str), Some("GET, POST"));
    }

    #[tokio::test]
    async fn not_found_for_unregistered_path() {
        let mut router = make_router();
        router
            .register(HttpMethod::GET, "/users", ok_handler())
            .unwrap();

        let req = HttpRequest::new("GET".to_string(), "/widgets".to_string());
        let err = router.route(req).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn path_segment_must_be_last() {
        let mut router = make_router();
        let err = router
            .register(HttpMethod::GET, "/files/{rest:path}/meta", ok_handler())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let mut router = make_router();
        let err = router
            .register(HttpMethod::GET, "/users/{id:bigint}", ok_handler())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn conflicting_routes_are_rejected() {
        let mut router = make_router();
        router
            .register(HttpMethod::GET, "/users/{id}", ok_handler())
            .unwrap();
        let err = router
            .register(HttpMethod::GET, "/users/{user_id}", ok_handler())
            .unwrap_err();
        assert!(matches!(err, Error::ConflictingRoute { .. }));
    }

    #[tokio::test]
    async fn catch_all_path_segment_matches_remainder() {
        let mut router = make_router();
        router
            .register(
                HttpMethod::GET,
                "/static/{rest:path}",
                Arc::new(|req| {
                    Box::pin(async move {
                        assert_eq!(
                            req.path_params.get("rest"),
                            Some(&"css/app.css".to_string())
                        );
                        Ok(HttpResponse::ok())
                    })
                }),
            )
            .unwrap();

        let req = HttpRequest::new("GET".to_string(), "/static/css/app.css".to_string());
        let resp = router.route(req).await.unwrap();
        assert_eq!(resp.status, 200);
    }

    #[test]
    fn parses_query_string_with_percent_encoding() {
        let params = parse_query_string("name=john%20doe&email=test%40example.com");
        assert_eq!(params.get("name"), Some(&"john doe".to_string()));
        assert_eq!(params.get("email"), Some(&"test@example.com".to_string()));
    }

    #[test]
    fn parses_empty_query_string() {
        assert!(parse_query_string("").is_empty());
    }
}
