//! Outbound submission transport

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Mutex;

pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// A single POST to the submission endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// `(name, value)` header pairs
    pub headers: Vec<(String, String)>,
    /// JSON body
    pub body: serde_json::Value,
}

impl OutboundRequest {
    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What came back from the endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed body when it was JSON. Its shape is not checked.
    pub body: Option<serde_json::Value>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a submission somewhere. Errors mean the request never completed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse>;
}

/// HTTP transport posting JSON with reqwest
#[cfg(feature = "http-transport")]
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

#[cfg(feature = "http-transport")]
impl HttpTransport {
    /// Create a transport for the configured endpoint
    pub fn new(config: &crate::config::TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(std::time::Duration::from_millis(ms));
        }

        Ok(Self {
            endpoint: config.endpoint.clone(),
            client: builder.build()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(feature = "http-transport")]
#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse> {
        // `headers` replaces what `json` set, so each name goes out once
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request.body)
            .headers(header_map(&request.headers)?)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.json::<serde_json::Value>().await.ok();

        Ok(TransportResponse { status, body })
    }
}

#[cfg(feature = "http-transport")]
fn header_map(headers: &[(String, String)]) -> Result<reqwest::header::HeaderMap> {
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            crate::error::FormError::SubmissionFailed(format!("invalid header {name}: {e}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            crate::error::FormError::SubmissionFailed(format!("invalid value for {name}: {e}"))
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// In-memory transport that records every request and answers with a fixed
/// status. Used by tests and dry runs.
#[derive(Debug)]
pub struct RecordingTransport {
    status: u16,
    fail: bool,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl RecordingTransport {
    /// Answer every request with `status`
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            fail: false,
            requests: Mutex::new(vec![]),
        }
    }

    /// Answer every request with 200 and `{"success": true}`
    pub fn ok() -> Self {
        Self::with_status(200)
    }

    /// Fail every request as if the connection dropped
    pub fn unreachable() -> Self {
        Self {
            status: 0,
            fail: true,
            requests: Mutex::new(vec![]),
        }
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        if self.fail {
            return Err(crate::error::FormError::SubmissionFailed(
                "connection refused".to_string(),
            ));
        }

        Ok(TransportResponse {
            status: self.status,
            body: Some(serde_json::json!({ "success": (200..300).contains(&self.status) })),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> OutboundRequest {
        OutboundRequest {
            headers: vec![
                ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
                (CSRF_HEADER.to_string(), "abc".to_string()),
            ],
            body: json!({"formType": "donation"}),
        }
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let req = request();
        assert_eq!(req.header("x-csrf-token"), Some("abc"));
        assert_eq!(req.header("content-type"), Some(CONTENT_TYPE_JSON));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn test_response_status() {
        let ok = TransportResponse {
            status: 204,
            body: None,
        };
        let bad = TransportResponse {
            status: 302,
            body: None,
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }

    #[tokio::test]
    async fn test_recording_transport() {
        let transport = RecordingTransport::with_status(500);
        let response = transport.send(request()).await.unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(transport.request_count(), 1);

        let down = RecordingTransport::unreachable();
        assert!(down.send(request()).await.is_err());
        assert_eq!(down.requests()[0].header(CSRF_HEADER), Some("abc"));
    }

    #[test]
    fn test_recording_transport_ok_body() {
        let transport = RecordingTransport::ok();
        let response = tokio_test::block_on(transport.send(request())).unwrap();
        assert!(response.is_success());
        assert_eq!(response.body, Some(json!({"success": true})));
    }

    #[cfg(feature = "http-transport")]
    #[test]
    fn test_http_transport_builds() {
        let config = crate::config::TransportConfig {
            timeout_ms: Some(1000),
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.endpoint(), config.endpoint);
    }

    #[cfg(feature = "http-transport")]
    #[test]
    fn test_header_map_keeps_one_value_per_name() {
        let mut headers = request().headers;
        headers.push(("content-type".to_string(), CONTENT_TYPE_JSON.to_string()));
        let map = header_map(&headers).unwrap();
        assert_eq!(map.get_all("content-type").iter().count(), 1);
        assert_eq!(map.get(CSRF_HEADER).unwrap(), "abc");

        let bad = vec![("X-Bad".to_string(), "line\nbreak".to_string())];
        assert!(header_map(&bad).is_err());
    }

    #[cfg(feature = "http-transport")]
    #[tokio::test]
    async fn test_http_transport_sends_each_header_once() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&raw[..end]).to_lowercase();
                    let body_len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                      content-length: 16\r\nconnection: close\r\n\r\n{\"success\":true}",
                )
                .await
                .unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });

        let config = crate::config::TransportConfig {
            endpoint: format!("http://{addr}/api/submit"),
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let response = transport.send(request()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Some(json!({"success": true})));

        let raw = server.await.unwrap();
        let head = raw.split("\r\n\r\n").next().unwrap().to_lowercase();
        let count = |name: &str| head.lines().filter(|l| l.starts_with(name)).count();
        assert!(head.starts_with("post /api/submit "));
        assert_eq!(count("content-type:"), 1);
        assert_eq!(count("x-csrf-token:"), 1);
        assert!(head.contains("x-csrf-token: abc"));
    }
}
