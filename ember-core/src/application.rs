// Application bootstrapper and HTTP server

use crate::arena::{set_memory_profiling, ArenaId, RequestScope};
use crate::connection_manager::{ConnectionManager, ConnectionManagerConfig};
use crate::{
    Container, Error, HttpRequest, HttpResponse, MiddlewarePipeline, Router, ServerConfig,
    ShutdownManager,
};
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{body::Incoming as IncomingBody, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, trace, warn};

/// A bootstrapped server: a frozen DI container, a compiled router, and the
/// global middleware pipeline that wraps every request, plus the shared
/// subsystems (graceful shutdown, connection tuning, closed config surface)
/// that the accept loop drives.
pub struct Application {
    container: Container,
    router: Arc<Router>,
    middleware: Arc<MiddlewarePipeline>,
    shutdown: Arc<ShutdownManager>,
    connections: Arc<ConnectionManager>,
    config: ServerConfig,
}

impl Application {
    /// Build an application from a frozen container, a compiled router, and
    /// the global middleware pipeline every request passes through.
    pub fn new(container: Container, router: Router, middleware: MiddlewarePipeline) -> Self {
        Self {
            container,
            router: Arc::new(router),
            middleware: Arc::new(middleware),
            shutdown: Arc::new(ShutdownManager::new()),
            connections: Arc::new(ConnectionManager::default_manager()),
            config: ServerConfig::default(),
        }
    }

    /// Override the connection manager's tuning configuration.
    pub fn with_connection_config(mut self, config: ConnectionManagerConfig) -> Self {
        self.connections = Arc::new(ConnectionManager::new(config));
        self
    }

    /// Override the server's closed configuration surface (§6: workers,
    /// header/body caps, timeouts, accept queue, memory profiling).
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get a reference to the DI container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Get a reference to the compiled router.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Get a reference to the shutdown manager, for registering hooks or
    /// wiring a signal handler before calling [`Application::listen`].
    pub fn shutdown(&self) -> &Arc<ShutdownManager> {
        &self.shutdown
    }

    /// Get a reference to the connection manager.
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Get a reference to the server's configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Start the HTTP/1.1 server on the given port, over plain TCP.
    ///
    /// Accepts connections until [`ShutdownManager::initiate_shutdown`] is
    /// called (typically from a signal handler spawned by the caller before
    /// `listen`), at which point the listener stops accepting and in-flight
    /// connections are drained before this future resolves.
    pub async fn listen(self, port: u16) -> Result<(), Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        set_memory_profiling(self.config.memory_profiling);

        debug!(address = %addr, "binding to address");
        let listener = TcpListener::bind(addr).await?;

        info!(address = %addr, workers = self.config.workers, "HTTP server listening");

        let router = self.router.clone();
        let middleware = self.middleware.clone();
        let shutdown = self.shutdown.clone();
        let connections = self.connections.clone();
        let container = self.container.clone();
        // Bounds the number of connections accepted-but-not-yet-drained per
        // the `accept_queue` option (§6). A connection that can't acquire a
        // permit gets an immediate 503 + Retry-After instead of being
        // serviced, per the backpressure policy in §5.
        let inflight = Arc::new(Semaphore::new(self.config.accept_queue));
        let config = Arc::new(self.config.clone());

        loop {
            if !shutdown.tracker().is_accepting() {
                info!("no longer accepting connections, stopping accept loop");
                return Ok(());
            }

            let (mut stream, client_addr) = listener.accept().await?;
            trace!(client_address = %client_addr, "connection accepted");

            let Some(guard) = shutdown.tracker().increment() else {
                trace!(client_address = %client_addr, "rejecting connection during shutdown");
                continue;
            };

            let permit = match inflight.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(client = %client_addr, "accept queue saturated, refusing connection");
                    tokio::spawn(async move {
                        let _guard = guard;
                        let _ = write_capacity_rejection(&mut stream).await;
                    });
                    continue;
                }
            };

            let conn_id = connections.register_connection();
            if let Err(e) = stream.set_nodelay(true) {
                trace!(error = %e, "failed to set TCP_NODELAY");
            }

            let io = TokioIo::new(stream);
            let router = router.clone();
            let middleware = middleware.clone();
            let connections_for_task = connections.clone();
            let config = config.clone();
            let container = container.clone();

            tokio::spawn(async move {
                let _guard = guard;
                let _permit = permit;
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let router = router.clone();
                    let middleware = middleware.clone();
                    let config = config.clone();
                    let container = container.clone();
                    if let Some(id) = conn_id {
                        connections_for_task.mark_active(id);
                    }
                    async move {
                        handle_request(req, router, middleware, config, container, client_addr)
                            .await
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!(error = %err, client = %client_addr, "error serving connection");
                }

                if let Some(id) = conn_id {
                    connections_for_task.unregister_connection(id);
                }
            });
        }
    }
}

/// Write a minimal 503 response directly to a freshly accepted socket that
/// never gets a hyper connection at all, since it was rejected purely on
/// accept-queue capacity before any bytes were read.
async fn write_capacity_rejection(stream: &mut tokio::net::TcpStream) -> std::io::Result<()> {
    let body = b"{\"error\":\"server is at capacity\"}";
    let response = format!(
        "HTTP/1.1 503 Service Unavailable\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Retry-After: 1\r\n\
         Connection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await
}

/// Handle a single incoming HTTP request: translate it into an
/// [`HttpRequest`], run it through the global middleware pipeline and
/// router, and translate the result back into a hyper response.
///
/// The request and response arenas are scoped to this call: both are reset
/// (via drop guards) when it returns, regardless of which branch produced
/// the response, matching the "request-arena reset" step in the engine's
/// data flow.
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
    middleware: Arc<MiddlewarePipeline>,
    config: Arc<ServerConfig>,
    container: Container,
    client_addr: SocketAddr,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    let _request_scope = RequestScope::new(ArenaId::Request);
    let _response_scope = RequestScope::new(ArenaId::Response);

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    trace!(method = %method, path = %path, "incoming request");

    // §4.2 edge case: headers exceeding the configured cap produce 431
    // before the body is even read.
    let header_bytes: usize = req
        .headers()
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len() + 4)
        .sum();
    if header_bytes > config.max_header_bytes {
        warn!(method = %method, path = %path, header_bytes, cap = config.max_header_bytes, "headers too large");
        return Ok(error_response(HttpResponse::new(431).with_json(&serde_json::json!({
            "error": "request header fields too large",
        })).unwrap_or_else(|_| HttpResponse::internal_server_error())));
    }

    let full_path = match &query {
        Some(q) => format!("{path}?{q}"),
        None => path.clone(),
    };

    let mut ember_req = HttpRequest::new(method.clone(), full_path).with_client_addr(client_addr);

    for (name, value) in req.headers() {
        if let Ok(value_str) = value.to_str() {
            ember_req
                .headers
                .insert(name.to_string(), value_str.to_string());
        }
    }

    // §4.2: reading the body is bounded by `read_timeout_ms`; exceeding it
    // produces a 408 and the connection is closed after the response is
    // flushed (we signal that via `Connection: close`).
    let body = req.into_body();
    let collected = match tokio::time::timeout(config.read_timeout(), body.collect()).await {
        Ok(Ok(collected)) => collected,
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            warn!(method = %method, path = %path, "body read exceeded read_timeout_ms");
            let mut resp = HttpResponse::new(408)
                .with_json(&serde_json::json!({ "error": "request timed out while reading body" }))
                .unwrap_or_else(|_| HttpResponse::internal_server_error());
            resp.headers.insert("Connection".to_string(), "close".to_string());
            return Ok(error_response(resp));
        }
    };
    let body_bytes = collected.to_bytes();

    // §4.2 edge case: bodies exceeding the per-route cap produce 413.
    if body_bytes.len() > config.max_body_bytes {
        warn!(method = %method, path = %path, body_bytes = body_bytes.len(), cap = config.max_body_bytes, "body too large");
        return Ok(error_response(HttpResponse::new(413).with_json(&serde_json::json!({
            "error": "payload too large",
        })).unwrap_or_else(|_| HttpResponse::internal_server_error())));
    }

    if !body_bytes.is_empty() {
        ember_req.set_body_bytes(body_bytes);
    }

    // §6 `handler_timeout_ms`: stamped as a deadline the middleware pipeline
    // enforces around the handler invocation itself (see `timeout.rs`).
    ember_req
        .extensions
        .insert(crate::timeout::Deadline(
            std::time::Instant::now() + config.handler_timeout(),
        ));

    // §4.7: lets a handler resolve a request-scoped/singleton/transient
    // dependency via the `Dep<T>` extractor. `begin_request` opens a fresh
    // request-scope cache so a `Scope::Request` service resolved twice
    // during this request returns the same instance (§8 DI scope
    // idempotence), without outliving the request.
    ember_req
        .extensions
        .insert(container.begin_request());

    let response = match middleware.run(ember_req, |r| router.route(r)).await {
        Ok(resp) => {
            debug!(method = %method, path = %path, status = resp.status, "request handled");
            resp
        }
        Err(err) => {
            warn!(method = %method, path = %path, error = %err, "request handling failed");
            let status = err.status_code();
            let body = serde_json::json!({ "error": err.to_string(), "status": status });
            HttpResponse::new(status)
                .with_json(&body)
                .unwrap_or_else(|_| HttpResponse::internal_server_error())
        }
    };

    Ok(error_response(response))
}

fn error_response(response: HttpResponse) -> Response<Full<bytes::Bytes>> {
    let mut builder = Response::builder().status(response.status);
    for (key, value) in &response.headers {
        builder = builder.header(key, value);
    }
    let body = Full::new(response.into_body_bytes());
    builder.body(body).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpMethod;

    #[tokio::test]
    async fn application_exposes_container_router_and_shutdown() {
        let container = Container::builder().build().unwrap();
        let mut router = Router::new();
        router
            .register(HttpMethod::GET, "/ping", std::sync::Arc::new(|_req| {
                Box::pin(async { Ok(HttpResponse::text("pong")) })
            }))
            .unwrap();

        let app = Application::new(container, router, MiddlewarePipeline::new());

        assert!(!app.shutdown().is_shutting_down());
        assert_eq!(app.router().len(), 1);
        assert!(app.container().is_empty());
    }

    #[test]
    fn with_config_overrides_defaults() {
        let container = Container::builder().build().unwrap();
        let router = Router::new();
        let app = Application::new(container, router, MiddlewarePipeline::new())
            .with_config(ServerConfig::new().max_body_bytes(1024).accept_queue(4));

        assert_eq!(app.config().max_body_bytes, 1024);
        assert_eq!(app.config().accept_queue, 4);
    }
}
