use ember_core::{Error, HttpMethod, HttpRequest, HttpResponse, Router};
use ember_core::routing::HandlerFn;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

fn handler(f: impl Fn(HttpRequest) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>> + Send + Sync + 'static) -> HandlerFn {
    Arc::new(f)
}

#[tokio::test]
async fn test_static_route() {
    let mut router = Router::new();

    router
        .register(
            HttpMethod::GET,
            "/hello",
            handler(|_req| {
                Box::pin(async { Ok(HttpResponse::ok().with_body(b"Hello, World!".to_vec())) })
            }),
        )
        .unwrap();

    let request = HttpRequest::new("GET".to_string(), "/hello".to_string());
    let response = router.route(request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body_ref(), b"Hello, World!");
}

#[tokio::test]
async fn test_path_parameter() {
    let mut router = Router::new();

    router
        .register(
            HttpMethod::GET,
            "/users/{id}",
            handler(|req| {
                Box::pin(async move {
                    let id = req.param("id").unwrap();
                    Ok(HttpResponse::ok().with_body(id.as_bytes().to_vec()))
                })
            }),
        )
        .unwrap();

    let request = HttpRequest::new("GET".to_string(), "/users/123".to_string());
    let response = router.route(request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body_ref(), b"123");
}

#[tokio::test]
async fn test_route_not_found() {
    let router = Router::new();

    let request = HttpRequest::new("GET".to_string(), "/nonexistent".to_string());
    let result = router.route(request).await;

    assert!(result.is_err());
    assert!(matches!(result.unwrap_err(), Error::RouteNotFound(_)));
}

#[tokio::test]
async fn test_query_parameters() {
    let mut router = Router::new();

    router
        .register(
            HttpMethod::GET,
            "/search",
            handler(|req| {
                Box::pin(async move {
                    let query = req.query("q").unwrap();
                    Ok(HttpResponse::ok().with_body(query.as_bytes().to_vec()))
                })
            }),
        )
        .unwrap();

    let request = HttpRequest::new("GET".to_string(), "/search?q=rust".to_string());
    let response = router.route(request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body_ref(), b"rust");
}
