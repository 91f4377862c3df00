// Middleware pipeline: phased, priority-ordered, short-circuiting.
//
// Unlike a tower-style onion chain, a middleware here declares which phase
// it participates in (pre-route, before the handler runs; post-route, after
// it returns) and a priority. Pre-route middleware runs in ascending
// priority order; post-route runs in descending order, so the middleware
// that ran first on the way in unwinds last on the way out. Same-priority
// middleware keeps registration order (the sort below is stable).

use crate::{Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, trace};

/// Which half of the pipeline a middleware runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreRoute,
    PostRoute,
}

/// The result of running one pre-route middleware.
pub enum MiddlewareResult {
    /// Pass the (possibly modified) request to the next stage.
    Continue(HttpRequest),
    /// Abort the pipeline immediately and return this response. No further
    /// pre-route middleware or the handler itself runs; post-route
    /// middleware still unwinds over the short-circuited response.
    ShortCircuit(HttpResponse),
}

/// A single participant in the middleware pipeline.
///
/// Implement `pre_route` to inspect or rewrite a request before the handler
/// runs, and/or `post_route` to reshape the response (or a propagating
/// error) on the way back out. Both default to no-ops so a middleware can
/// implement only the phase it cares about.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Priority used to order this middleware against others in the same
    /// phase. Pre-route runs ascending, post-route runs descending.
    fn priority(&self) -> i32 {
        0
    }

    /// Error-translators run before any other post-route middleware sees a
    /// propagating error, regardless of declared priority, so they can
    /// reshape it into a response that later middleware (e.g. CORS headers,
    /// security headers) still gets to touch.
    fn is_error_translator(&self) -> bool {
        false
    }

    async fn pre_route(&self, req: HttpRequest) -> Result<MiddlewareResult, Error> {
        Ok(MiddlewareResult::Continue(req))
    }

    async fn post_route(
        &self,
        req: &HttpRequest,
        result: Result<HttpResponse, Error>,
    ) -> Result<HttpResponse, Error> {
        result
    }
}

/// A middleware plus the phase it was registered for and its position in
/// registration order (used to break priority ties deterministically).
#[derive(Clone)]
struct Registration {
    middleware: Arc<dyn Middleware>,
    phase: Phase,
    order: usize,
}

/// Ordered collection of middleware, split into a pre-route and a
/// post-route pipeline and re-sorted whenever a new middleware is added.
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    registrations: Vec<Registration>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a middleware for the given phase. Middleware that wants to
    /// participate in both phases should be registered twice (once per
    /// phase) via two `Arc` clones, since phase is a property of the
    /// registration, not of the trait object.
    pub fn register(&mut self, middleware: Arc<dyn Middleware>, phase: Phase) {
        let order = self.registrations.len();
        trace!(phase = ?phase, order, "registering middleware");
        self.registrations.push(Registration {
            middleware,
            phase,
            order,
        });
    }

    pub fn register_pre_route(&mut self, middleware: Arc<dyn Middleware>) {
        self.register(middleware, Phase::PreRoute);
    }

    pub fn register_post_route(&mut self, middleware: Arc<dyn Middleware>) {
        self.register(middleware, Phase::PostRoute);
    }

    /// Merge `other`'s registrations after this pipeline's own, used to
    /// compose global -> group -> per-route layering: call on the global
    /// pipeline with the group's, then again with the route's.
    pub fn extend(&mut self, other: &MiddlewarePipeline) {
        for reg in &other.registrations {
            self.register(reg.middleware.clone(), reg.phase);
        }
    }

    fn pre_route_ordered(&self) -> Vec<&Registration> {
        let mut regs: Vec<&Registration> = self
            .registrations
            .iter()
            .filter(|r| r.phase == Phase::PreRoute)
            .collect();
        regs.sort_by(|a, b| {
            a.middleware
                .priority()
                .cmp(&b.middleware.priority())
                .then_with(|| a.order.cmp(&b.order))
        });
        regs
    }

    fn post_route_ordered(&self) -> Vec<&Registration> {
        let mut regs: Vec<&Registration> = self
            .registrations
            .iter()
            .filter(|r| r.phase == Phase::PostRoute)
            .collect();
        regs.sort_by(|a, b| {
            // Error translators always run first regardless of priority.
            let translator_cmp = b
                .middleware
                .is_error_translator()
                .cmp(&a.middleware.is_error_translator());
            if translator_cmp != Ordering::Equal {
                return translator_cmp;
            }
            b.middleware
                .priority()
                .cmp(&a.middleware.priority())
                .then_with(|| a.order.cmp(&b.order))
        });
        regs
    }

    /// Run the full pipeline around a handler invocation.
    pub async fn run<H, Fut>(&self, mut req: HttpRequest, handler: H) -> Result<HttpResponse, Error>
    where
        H: FnOnce(HttpRequest) -> Fut,
        Fut: std::future::Future<Output = Result<HttpResponse, Error>>,
    {
        let pre = self.pre_route_ordered();
        debug!(count = pre.len(), "running pre-route middleware");

        // Middleware whose `pre_route` actually ran, in the order they ran.
        // On a short-circuit at position k, only these (0..=k) get a chance
        // to unwind in post-route; anything after k never saw the request.
        let mut entered: Vec<*const ()> = Vec::with_capacity(pre.len());
        let mut short_circuited: Option<HttpResponse> = None;
        for reg in &pre {
            entered.push(Arc::as_ptr(&reg.middleware) as *const ());
            match reg.middleware.pre_route(req).await? {
                MiddlewareResult::Continue(next_req) => req = next_req,
                MiddlewareResult::ShortCircuit(response) => {
                    short_circuited = Some(response);
                    break;
                }
            }
        }
        let did_short_circuit = short_circuited.is_some();

        let deadline = req.extensions.get::<crate::timeout::Deadline>().copied();
        let result = match short_circuited {
            Some(response) => Ok(response),
            None => match deadline {
                Some(deadline) => {
                    match tokio::time::timeout(deadline.remaining(), handler(req.clone())).await {
                        Ok(result) => result,
                        Err(_) => Err(Error::GatewayTimeout(
                            "handler exceeded its deadline".to_string(),
                        )),
                    }
                }
                None => handler(req.clone()).await,
            },
        };

        let post = self.post_route_ordered();
        debug!(count = post.len(), "running post-route middleware");
        let mut result = result;
        for reg in &post {
            if did_short_circuit {
                let ptr = Arc::as_ptr(&reg.middleware) as *const ();
                if !entered.contains(&ptr) {
                    // This middleware's pre-route never ran (it sat beyond
                    // the short-circuiting stage), so it does not unwind.
                    continue;
                }
            }
            result = reg.middleware.post_route(&req, result).await;
            // Once an error has been translated into a response, later
            // post-route middleware keeps unwinding over the response as
            // normal (it is no longer a propagating error).
            result = match result {
                Ok(r) => Ok(r),
                Err(e) => Err(e),
            };
        }
        result
    }
}

// ========== Built-in middleware ==========

/// CORS (Cross-Origin Resource Sharing) middleware. Short-circuits
/// preflight `OPTIONS` requests and stamps CORS headers on the way out.
pub struct CorsMiddleware {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
    pub allow_credentials: bool,
    pub max_age: u32,
}

impl CorsMiddleware {
    pub fn new() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, PUT, DELETE, OPTIONS, PATCH".to_string(),
            allow_headers: "Content-Type, Authorization, Accept".to_string(),
            allow_credentials: false,
            max_age: 86400,
        }
    }

    pub fn allow_origin(mut self, origin: &str) -> Self {
        self.allow_origin = origin.to_string();
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for CorsMiddleware {
    fn priority(&self) -> i32 {
        -100
    }

    async fn pre_route(&self, req: HttpRequest) -> Result<MiddlewareResult, Error> {
        if req.method == "OPTIONS" {
            let mut response = HttpResponse::new(204);
            response
                .headers
                .insert("Access-Control-Allow-Origin".to_string(), self.allow_origin.clone());
            response
                .headers
                .insert("Access-Control-Allow-Methods".to_string(), self.allow_methods.clone());
            response
                .headers
                .insert("Access-Control-Allow-Headers".to_string(), self.allow_headers.clone());
            response
                .headers
                .insert("Access-Control-Max-Age".to_string(), self.max_age.to_string());
            if self.allow_credentials {
                response
                    .headers
                    .insert("Access-Control-Allow-Credentials".to_string(), "true".to_string());
            }
            return Ok(MiddlewareResult::ShortCircuit(response));
        }
        Ok(MiddlewareResult::Continue(req))
    }

    async fn post_route(
        &self,
        _req: &HttpRequest,
        result: Result<HttpResponse, Error>,
    ) -> Result<HttpResponse, Error> {
        let mut response = result?;
        response
            .headers
            .insert("Access-Control-Allow-Origin".to_string(), self.allow_origin.clone());
        if self.allow_credentials {
            response
                .headers
                .insert("Access-Control-Allow-Credentials".to_string(), "true".to_string());
        }
        Ok(response)
    }
}

/// Stamps a request ID onto the request and echoes it back on the response.
pub struct RequestIdMiddleware;

#[async_trait]
impl Middleware for RequestIdMiddleware {
    fn priority(&self) -> i32 {
        -90
    }

    async fn pre_route(&self, mut req: HttpRequest) -> Result<MiddlewareResult, Error> {
        let request_id = req
            .headers
            .get("x-request-id")
            .cloned()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        req.headers.insert("x-request-id".to_string(), request_id);
        Ok(MiddlewareResult::Continue(req))
    }

    async fn post_route(
        &self,
        req: &HttpRequest,
        result: Result<HttpResponse, Error>,
    ) -> Result<HttpResponse, Error> {
        let mut response = result?;
        if let Some(id) = req.headers.get("x-request-id") {
            response.headers.insert("x-request-id".to_string(), id.clone());
        }
        Ok(response)
    }
}

/// Rejects requests whose body exceeds a configured byte limit.
pub struct BodySizeLimitMiddleware {
    pub max_bytes: usize,
}

impl BodySizeLimitMiddleware {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl Middleware for BodySizeLimitMiddleware {
    fn priority(&self) -> i32 {
        -80
    }

    async fn pre_route(&self, req: HttpRequest) -> Result<MiddlewareResult, Error> {
        if req.body.len() > self.max_bytes {
            return Err(Error::PayloadTooLarge(format!(
                "body of {} bytes exceeds limit of {} bytes",
                req.body.len(),
                self.max_bytes
            )));
        }
        Ok(MiddlewareResult::Continue(req))
    }
}

/// Stamps a conservative set of security headers on every response.
pub struct SecurityHeadersMiddleware {
    pub hsts: bool,
}

impl SecurityHeadersMiddleware {
    pub fn new() -> Self {
        Self { hsts: false }
    }
}

impl Default for SecurityHeadersMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for SecurityHeadersMiddleware {
    fn priority(&self) -> i32 {
        -10
    }

    async fn post_route(
        &self,
        _req: &HttpRequest,
        result: Result<HttpResponse, Error>,
    ) -> Result<HttpResponse, Error> {
        let mut response = result?;
        response
            .headers
            .insert("X-Content-Type-Options".to_string(), "nosniff".to_string());
        response
            .headers
            .insert("X-Frame-Options".to_string(), "DENY".to_string());
        if self.hsts {
            response.headers.insert(
                "Strict-Transport-Security".to_string(),
                "max-age=63072000; includeSubDomains".to_string(),
            );
        }
        Ok(response)
    }
}

/// Emits a structured log record at request start and end.
pub struct LoggingMiddleware {
    pub log_body: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self { log_body: false }
    }

    pub fn with_body(mut self) -> Self {
        self.log_body = true;
        self
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn priority(&self) -> i32 {
        i32::MIN
    }

    async fn pre_route(&self, req: HttpRequest) -> Result<MiddlewareResult, Error> {
        if self.log_body && !req.body.is_empty() {
            debug!(method = %req.method, path = %req.path, body_bytes = req.body.len(), "request start");
        } else {
            debug!(method = %req.method, path = %req.path, "request start");
        }
        Ok(MiddlewareResult::Continue(req))
    }

    async fn post_route(
        &self,
        req: &HttpRequest,
        result: Result<HttpResponse, Error>,
    ) -> Result<HttpResponse, Error> {
        match &result {
            Ok(response) => {
                debug!(method = %req.method, path = %req.path, status = response.status, "request end")
            }
            Err(e) => debug!(method = %req.method, path = %req.path, error = %e, "request end"),
        }
        result
    }
}

/// Translates propagating errors into a uniform JSON error body, grounded
/// in the teacher's `ErrorTransformer`/`ExceptionFilter` concept but
/// collapsed into a single pipeline slot: a post-route middleware marked
/// as an error translator runs ahead of every other post-route middleware
/// whenever the handler (or an earlier stage) returned `Err`.
pub struct ErrorTranslatorMiddleware {
    pub include_details: bool,
}

impl ErrorTranslatorMiddleware {
    pub fn new(include_details: bool) -> Self {
        Self { include_details }
    }
}

#[async_trait]
impl Middleware for ErrorTranslatorMiddleware {
    fn is_error_translator(&self) -> bool {
        true
    }

    async fn post_route(
        &self,
        _req: &HttpRequest,
        result: Result<HttpResponse, Error>,
    ) -> Result<HttpResponse, Error> {
        match result {
            Ok(response) => Ok(response),
            Err(e) => {
                let status = e.status_code();
                let mut body = serde_json::json!({
                    "error": e.to_string(),
                    "status": status,
                });
                if self.include_details {
                    if let Some(help) = e.help() {
                        body["help"] = serde_json::Value::String(help.to_string());
                    }
                }
                Ok(HttpResponse::new(status).with_json(&body)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request() -> HttpRequest {
        HttpRequest::new("GET".to_string(), "/".to_string())
    }

    #[tokio::test]
    async fn pre_route_runs_ascending_by_priority() {
        struct Tag(i32, Arc<std::sync::Mutex<Vec<i32>>>);
        #[async_trait]
        impl Middleware for Tag {
            fn priority(&self) -> i32 {
                self.0
            }
            async fn pre_route(&self, req: HttpRequest) -> Result<MiddlewareResult, Error> {
                self.1.lock().unwrap().push(self.0);
                Ok(MiddlewareResult::Continue(req))
            }
        }

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.register_pre_route(Arc::new(Tag(5, seen.clone())));
        pipeline.register_pre_route(Arc::new(Tag(-5, seen.clone())));
        pipeline.register_pre_route(Arc::new(Tag(0, seen.clone())));

        let _ = pipeline
            .run(make_request(), |_req| async { Ok(HttpResponse::ok()) })
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![-5, 0, 5]);
    }

    #[tokio::test]
    async fn post_route_runs_descending_by_priority() {
        struct Tag(i32, Arc<std::sync::Mutex<Vec<i32>>>);
        #[async_trait]
        impl Middleware for Tag {
            fn priority(&self) -> i32 {
                self.0
            }
            async fn post_route(
                &self,
                _req: &HttpRequest,
                result: Result<HttpResponse, Error>,
            ) -> Result<HttpResponse, Error> {
                self.1.lock().unwrap().push(self.0);
                result
            }
        }

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.register_post_route(Arc::new(Tag(5, seen.clone())));
        pipeline.register_post_route(Arc::new(Tag(-5, seen.clone())));
        pipeline.register_post_route(Arc::new(Tag(0, seen.clone())));

        let _ = pipeline
            .run(make_request(), |_req| async { Ok(HttpResponse::ok()) })
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![5, 0, -5]);
    }

    #[tokio::test]
    async fn same_priority_breaks_tie_by_registration_order() {
        struct Tag(&'static str, Arc<std::sync::Mutex<Vec<&'static str>>>);
        #[async_trait]
        impl Middleware for Tag {
            async fn pre_route(&self, req: HttpRequest) -> Result<MiddlewareResult, Error> {
                self.1.lock().unwrap().push(self.0);
                Ok(MiddlewareResult::Continue(req))
            }
        }

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.register_pre_route(Arc::new(Tag("first", seen.clone())));
        pipeline.register_pre_route(Arc::new(Tag("second", seen.clone())));

        let _ = pipeline
            .run(make_request(), |_req| async { Ok(HttpResponse::ok()) })
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn short_circuit_skips_handler() {
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.register_pre_route(Arc::new(CorsMiddleware::new()));

        let mut req = make_request();
        req.method = "OPTIONS".to_string();

        let response = pipeline
            .run(req, |_req| async {
                panic!("handler should not run for a short-circuited OPTIONS request")
            })
            .await
            .unwrap();

        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn error_translator_runs_before_other_post_route_middleware() {
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.register_post_route(Arc::new(SecurityHeadersMiddleware::new()));
        pipeline.register_post_route(Arc::new(ErrorTranslatorMiddleware::new(false)));

        let response = pipeline
            .run(make_request(), |_req| async {
                Err(Error::NotFound("/missing".to_string()))
            })
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(response.headers.contains_key("X-Content-Type-Options"));
    }
}
