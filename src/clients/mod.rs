/// Outbound HTTP transport
use crate::errors::{SearchError, SearchResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// Single-request transport port.
///
/// Implementations return the raw body of a JSON object response and
/// never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(
        &self,
        path: &str,
        base: &str,
        params: &[(&str, String)],
    ) -> SearchResult<Vec<u8>>;
}

/// Join `base`, `path` and `params` into a request URL, keeping parameter order
pub fn build_url(base: &str, path: &str, params: &[(&str, String)]) -> SearchResult<Url> {
    let mut url = Url::parse(base)?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(SearchError::InvalidAddress(format!(
            "{} is not an http(s) base address",
            base
        )));
    }

    url.set_path(path);
    url.set_query(None);
    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}

/// Accept the body only when it is a JSON object
pub fn ensure_object(body: &[u8]) -> SearchResult<()> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(_)) => Ok(()),
        Ok(Value::Array(_)) => Err(SearchError::UnexpectedShape(
            "response is a JSON array".to_string(),
        )),
        Ok(other) => Err(SearchError::UnexpectedShape(format!(
            "response is a bare JSON {}",
            json_kind(&other)
        ))),
        Err(e) => Err(SearchError::UnexpectedShape(format!(
            "response is not JSON: {}",
            e
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// reqwest-backed transport; the client is built on first use and reused
pub struct HttpTransport {
    client: OnceCell<Client>,
    timeout: Duration,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: OnceCell::new(),
            timeout,
            user_agent: format!("nasa-image-search/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    async fn client(&self) -> SearchResult<&Client> {
        let client = self
            .client
            .get_or_try_init(|| async {
                Client::builder()
                    .timeout(self.timeout)
                    .user_agent(self.user_agent.as_str())
                    .build()
            })
            .await?;
        Ok(client)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(
        &self,
        path: &str,
        base: &str,
        params: &[(&str, String)],
    ) -> SearchResult<Vec<u8>> {
        let url = build_url(base, path, params)?;
        let client = self.client().await?;

        tracing::debug!(url = %url, "GET");
        let resp = client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.bytes().await?.to_vec();
        ensure_object(&body)?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::MOON_PAGE_ONE;
    use axum::{extract::RawQuery, http::header, http::StatusCode, routing::get, Json, Router};
    use tokio::net::TcpListener;

    /// Serve a throwaway router on an ephemeral port, returning its base URL
    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service()).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn upstream() -> Router {
        Router::new()
            .route(
                "/search",
                get(|| async { ([(header::CONTENT_TYPE, "application/json")], MOON_PAGE_ONE) }),
            )
            .route("/array", get(|| async { Json(serde_json::json!([])) }))
            .route("/html", get(|| async { "<html>busy</html>" }))
            .route(
                "/down",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance window") }),
            )
            .route(
                "/echo",
                get(|RawQuery(query): RawQuery| async move {
                    Json(serde_json::json!({ "query": query }))
                }),
            )
    }

    fn params() -> Vec<(&'static str, String)> {
        vec![
            ("q", "apollo 11".to_string()),
            ("page", "3".to_string()),
            ("media_type", "image".to_string()),
        ]
    }

    #[test]
    fn test_build_url_keeps_param_order() {
        let url = build_url("https://images-api.nasa.gov", "search", &params()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://images-api.nasa.gov/search?q=apollo+11&page=3&media_type=image"
        );
    }

    #[test]
    fn test_build_url_replaces_base_path_and_query() {
        let url = build_url("https://example.org/old?x=1", "/search", &params()).unwrap();
        assert_eq!(url.path(), "/search");
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["q", "page", "media_type"]);
    }

    #[test]
    fn test_build_url_rejects_bad_base() {
        let err = build_url("images-api.nasa.gov", "search", &params()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidAddress(_)));

        let err = build_url("mailto:someone@nasa.gov", "search", &params()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidAddress(_)));

        let err = build_url("ftp://images-api.nasa.gov", "search", &params()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidAddress(_)));
    }

    #[test]
    fn test_ensure_object_accepts_object() {
        assert!(ensure_object(br#"{"collection": {}}"#).is_ok());
    }

    #[test]
    fn test_ensure_object_rejects_array() {
        let err = ensure_object(br#"[{"collection": {}}]"#).unwrap_err();
        assert!(matches!(err, SearchError::UnexpectedShape(_)));
    }

    #[test]
    fn test_ensure_object_rejects_non_json() {
        let err = ensure_object(b"<html>busy</html>").unwrap_err();
        assert!(matches!(err, SearchError::UnexpectedShape(_)));

        let err = ensure_object(b"\"just a string\"").unwrap_err();
        assert!(matches!(err, SearchError::UnexpectedShape(_)));
    }

    #[tokio::test]
    async fn test_fetch_invalid_address_before_network() {
        let transport = HttpTransport::default();
        let err = transport
            .fetch("search", "not a url", &params())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_fetch_returns_object_body() {
        let base = serve(upstream()).await;
        let transport = HttpTransport::new(Duration::from_secs(5));

        let body = transport.fetch("search", &base, &params()).await.unwrap();
        let decoded: crate::domain::SearchResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded.collection.items.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_sends_params_in_order() {
        let base = serve(upstream()).await;
        let transport = HttpTransport::new(Duration::from_secs(5));

        let body = transport.fetch("echo", &base, &params()).await.unwrap();
        let echoed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(echoed["query"], "q=apollo+11&page=3&media_type=image");
    }

    #[tokio::test]
    async fn test_fetch_array_body_is_unexpected_shape() {
        let base = serve(upstream()).await;
        let transport = HttpTransport::new(Duration::from_secs(5));

        let err = transport.fetch("array", &base, &params()).await.unwrap_err();
        assert!(matches!(err, SearchError::UnexpectedShape(_)));

        let err = transport.fetch("html", &base, &params()).await.unwrap_err();
        assert!(matches!(err, SearchError::UnexpectedShape(_)));
    }

    #[tokio::test]
    async fn test_fetch_error_status_carries_body() {
        let base = serve(upstream()).await;
        let transport = HttpTransport::new(Duration::from_secs(5));

        let err = transport.fetch("down", &base, &params()).await.unwrap_err();
        match err {
            SearchError::Status { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance window");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_closed_port_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(Duration::from_secs(5));
        let err = transport
            .fetch("search", &format!("http://{}", addr), &params())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_client_is_built_once_and_reused() {
        let base = serve(upstream()).await;
        let transport = HttpTransport::new(Duration::from_secs(5));
        assert!(transport.client.get().is_none());

        transport.fetch("search", &base, &params()).await.unwrap();
        let first: *const Client = transport.client.get().unwrap();

        transport.fetch("search", &base, &params()).await.unwrap();
        let second: *const Client = transport.client.get().unwrap();

        assert!(std::ptr::eq(first, second));
    }
}
