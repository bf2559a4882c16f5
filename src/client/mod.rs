//! Search endpoint client
//!
//! The export pipeline talks to the backend through the [`SearchEndpoint`]
//! trait so that it can be driven by an in-memory implementation in tests.
//! [`HttpSearchClient`] is the production implementation over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::events::{AppEvent, EventBus};
use crate::model::{PageResponse, SearchParams, SearchResponse};

/// Path of the unified search endpoint, relative to the base URL
pub const SEARCH_PATH: &str = "/api/v1/pesquisa/";

/// Trait for the paginated search collaborator
#[async_trait]
pub trait SearchEndpoint: Send + Sync {
    /// Fetch one page of results
    ///
    /// # Arguments
    /// * `params` - Query parameters, including page and page size
    ///
    /// # Returns
    /// * `Result<PageResponse>` - The requested page or error
    async fn search(&self, params: &SearchParams) -> Result<PageResponse>;
}

/// HTTP implementation of [`SearchEndpoint`]
pub struct HttpSearchClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
    events: Option<EventBus>,
}

impl HttpSearchClient {
    /// Create a client for the backend at `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Scheme and host of the backend, e.g. `https://atlas.example.com`
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ApiError::InvalidUrl(base_url.to_string()).into());
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: trimmed.to_string(),
            token: None,
            client,
            events: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Publish authorization failures on `bus`
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Full URL of the search endpoint
    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url, SEARCH_PATH)
    }

    fn publish(&self, event: AppEvent) {
        if let Some(ref bus) = self.events {
            bus.publish(event);
        }
    }

    /// Extract the backend's `detail` message, falling back to the raw body
    fn error_detail(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string())
    }
}

#[async_trait]
impl SearchEndpoint for HttpSearchClient {
    async fn search(&self, params: &SearchParams) -> Result<PageResponse> {
        let url = self.search_url();
        debug!("GET {} page={} page_size={}", url, params.page, params.page_size);

        let mut request = self.client.get(&url).query(params);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail = Self::error_detail(&body);
            return Err(match status {
                StatusCode::FORBIDDEN => {
                    warn!("Permission denied on {}: {}", url, detail);
                    self.publish(AppEvent::PermissionDenied {
                        message: detail.clone(),
                    });
                    ApiError::PermissionDenied(detail)
                }
                StatusCode::UNAUTHORIZED => {
                    self.publish(AppEvent::SessionExpired);
                    ApiError::SessionExpired
                }
                _ => ApiError::Status {
                    status: status.as_u16(),
                    body: detail,
                },
            }
            .into());
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response; returns the base URL and the raw request
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn params() -> SearchParams {
        crate::model::FilterCriteria::search("joao").to_params(2, 100)
    }

    #[tokio::test]
    async fn test_search_decodes_page() {
        let body = r#"{"results":[{"type":"titular","nome":"João"}],"count":1,"total_pages":1,"has_next":false,"has_previous":false}"#;
        let (base, server) = serve_once("200 OK", body).await;

        let client = HttpSearchClient::new(&base, Duration::from_secs(5))
            .unwrap()
            .with_token(Some("secret".to_string()));
        let page = client.search(&params()).await.unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].nome.as_deref(), Some("João"));
        assert!(!page.has_next);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v1/pesquisa/?"));
        assert!(request.contains("page=2"));
        assert!(request.contains("search=joao"));
        assert!(request.to_lowercase().contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn test_forbidden_publishes_permission_event() {
        let (base, _server) = serve_once("403 Forbidden", r#"{"detail":"Sem permissão"}"#).await;
        let bus = EventBus::default();
        let mut subscription = bus.subscribe();

        let client = HttpSearchClient::new(&base, Duration::from_secs(5))
            .unwrap()
            .with_events(bus.clone());
        let err = client.search(&params()).await.unwrap_err();

        assert!(matches!(
            err,
            crate::error::AtlasError::Api(ApiError::PermissionDenied(ref msg))
                if msg == "Sem permissão"
        ));
        assert_eq!(
            subscription.try_recv(),
            Some(AppEvent::PermissionDenied {
                message: "Sem permissão".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_unauthorized_publishes_session_expired() {
        let (base, _server) = serve_once("401 Unauthorized", "{}").await;
        let bus = EventBus::default();
        let mut subscription = bus.subscribe();

        let client = HttpSearchClient::new(&base, Duration::from_secs(5))
            .unwrap()
            .with_events(bus);
        let err = client.search(&params()).await.unwrap_err();

        assert!(matches!(
            err,
            crate::error::AtlasError::Api(ApiError::SessionExpired)
        ));
        assert_eq!(subscription.try_recv(), Some(AppEvent::SessionExpired));
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let (base, _server) = serve_once("500 Internal Server Error", "boom").await;
        let client = HttpSearchClient::new(&base, Duration::from_secs(5)).unwrap();
        let err = client.search(&params()).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::AtlasError::Api(ApiError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = HttpSearchClient::new("atlas.local", Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Invalid base URL"));
    }

    #[test]
    fn test_search_url_trims_trailing_slash() {
        let client =
            HttpSearchClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.search_url(), "http://localhost:8000/api/v1/pesquisa/");
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let client = HttpSearchClient::new("http://localhost:8000", Duration::from_secs(5))
            .unwrap()
            .with_token(Some(String::new()));
        assert!(client.token.is_none());
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            HttpSearchClient::error_detail(r#"{"detail": "Sem permissão"}"#),
            "Sem permissão"
        );
        assert_eq!(HttpSearchClient::error_detail(" bad gateway \n"), "bad gateway");
    }
}
