use crate::core::routes::RouteTable;
use crate::domain::ports::Handler;
use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, LOCATION};
use hyper::{Method, Request, Response, StatusCode};

pub const DEFAULT_FALLBACK_BODY: &str = "Hello, world!\n";

/// Redirects mapped paths and hands everything else to the next handler.
pub struct RedirectHandler {
    table: RouteTable,
    fallback: Box<dyn Handler>,
}

impl RedirectHandler {
    pub fn new(table: RouteTable, fallback: Box<dyn Handler>) -> Self {
        Self { table, fallback }
    }
}

#[async_trait]
impl Handler for RedirectHandler {
    async fn handle(&self, req: Request<Bytes>) -> Response<Full<Bytes>> {
        if let Some(destination) = self.table.resolve(req.uri().path()) {
            tracing::debug!("Redirecting {} to {}", req.uri().path(), destination);
            return build_redirect_response(req.method(), destination);
        }
        self.fallback.handle(req).await
    }
}

/// Terminal handler answering every request with a fixed text body.
pub struct DefaultHandler {
    body: String,
}

impl DefaultHandler {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl Default for DefaultHandler {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_BODY)
    }
}

#[async_trait]
impl Handler for DefaultHandler {
    async fn handle(&self, req: Request<Bytes>) -> Response<Full<Bytes>> {
        tracing::debug!("No route for {}, serving default response", req.uri().path());
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(self.body.clone())))
            .unwrap_or_else(|e| {
                log_build_error("200", &e);
                Response::new(Full::new(Bytes::new()))
            })
    }
}

/// Nests one redirect stage per table around `terminal`. `tables[0]` is
/// consulted first.
pub fn chain_handlers(tables: Vec<RouteTable>, terminal: Box<dyn Handler>) -> Box<dyn Handler> {
    tables
        .into_iter()
        .rev()
        .fold(terminal, |next, table| {
            Box::new(RedirectHandler::new(table, next)) as Box<dyn Handler>
        })
}

pub fn build_redirect_response(method: &Method, destination: &str) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, destination);

    let body = if method == Method::GET {
        builder = builder.header(CONTENT_TYPE, "text/html; charset=utf-8");
        Bytes::from(format!(
            "<a href=\"{}\">Found</a>.\n\n",
            escape_html(destination)
        ))
    } else {
        Bytes::new()
    };

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("302", &e);
        build_500_response()
    })
}

fn build_500_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from("500 Internal Server Error")));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn log_build_error(status: &str, err: &hyper::http::Error) {
    tracing::error!("Failed to build {} response: {}", status, err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RouteRecord;
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Handler for CountingHandler {
        async fn handle(&self, req: Request<Bytes>) -> Response<Full<Bytes>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Response::new(Full::new(Bytes::from(format!(
                "fallback {}",
                req.uri().path()
            ))))
        }
    }

    fn get(path: &str) -> Request<Bytes> {
        Request::builder().uri(path).body(Bytes::new()).unwrap()
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response<Full<Bytes>>) -> Option<&str> {
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    fn sample_table() -> RouteTable {
        RouteTable::from_map(HashMap::from([
            ("/go".to_string(), "https://golang.org".to_string()),
            ("/github".to_string(), "https://github.com".to_string()),
        ]))
    }

    #[tokio::test]
    async fn test_mapped_paths_redirect() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = RedirectHandler::new(
            sample_table(),
            Box::new(CountingHandler {
                calls: Arc::clone(&calls),
            }),
        );

        let response = handler.handle(get("/go")).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), Some("https://golang.org"));

        let response = handler.handle(get("/github")).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), Some("https://github.com"));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unmapped_path_reaches_fallback_untouched() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = RedirectHandler::new(
            sample_table(),
            Box::new(CountingHandler {
                calls: Arc::clone(&calls),
            }),
        );

        let response = handler.handle(get("/missing?x=1")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "fallback /missing");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_string_does_not_affect_lookup() {
        let handler = RedirectHandler::new(sample_table(), Box::new(DefaultHandler::default()));

        let response = handler.handle(get("/go?ref=docs")).await;
        assert_eq!(location(&response), Some("https://golang.org"));
    }

    #[tokio::test]
    async fn test_any_method_is_redirected() {
        let handler = RedirectHandler::new(sample_table(), Box::new(DefaultHandler::default()));
        let req = Request::builder()
            .method(Method::POST)
            .uri("/go")
            .body(Bytes::from("payload"))
            .unwrap();

        let response = handler.handle(req).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_get_redirect_body_is_escaped() {
        let response = build_redirect_response(&Method::GET, "https://example.com/?a=1&b=\"2\"");

        assert_eq!(
            body_string(response).await,
            "<a href=\"https://example.com/?a=1&amp;b=&#34;2&#34;\">Found</a>.\n\n"
        );
    }

    #[tokio::test]
    async fn test_invalid_destination_yields_server_error() {
        let response = build_redirect_response(&Method::GET, "https://bad\nheader");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_yaml_table_with_default_fallback() {
        let table = RouteTable::from_yaml(b"- path: /go\n  url: https://golang.org\n").unwrap();
        let handler = RedirectHandler::new(table, Box::new(DefaultHandler::new("fallback")));

        let response = handler.handle(get("/unknown")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "fallback");
    }

    #[tokio::test]
    async fn test_chain_checks_first_table_first() {
        let specific = RouteTable::build(vec![RouteRecord {
            path: "/go".to_string(),
            url: "https://go.dev".to_string(),
        }]);
        let general = sample_table();
        let chain = chain_handlers(
            vec![specific, general],
            Box::new(DefaultHandler::new("end of chain")),
        );

        let response = chain.handle(get("/go")).await;
        assert_eq!(location(&response), Some("https://go.dev"));

        let response = chain.handle(get("/github")).await;
        assert_eq!(location(&response), Some("https://github.com"));

        let response = chain.handle(get("/nothing")).await;
        assert_eq!(body_string(response).await, "end of chain");
    }

    #[tokio::test]
    async fn test_empty_chain_is_the_terminal_handler() {
        let chain = chain_handlers(vec![], Box::new(DefaultHandler::default()));
        let response = chain.handle(get("/go")).await;
        assert_eq!(body_string(response).await, DEFAULT_FALLBACK_BODY);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_table() {
        let handler: Arc<dyn Handler> = Arc::new(RedirectHandler::new(
            sample_table(),
            Box::new(DefaultHandler::default()),
        ));

        let mut tasks = Vec::new();
        for i in 0..64 {
            let handler = Arc::clone(&handler);
            tasks.push(tokio::spawn(async move {
                let (path, expected) = if i % 2 == 0 {
                    ("/go", "https://golang.org")
                } else {
                    ("/github", "https://github.com")
                };
                let response = handler.handle(get(path)).await;
                assert_eq!(location(&response), Some(expected));
            }));
        }

        for task in tasks {
            task.await.unwrap();
        }
    }
}
