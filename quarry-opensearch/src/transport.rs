//! Transport seam between the client and the HTTP layer.

use crate::error::{OpenSearchError, Result};
use async_trait::async_trait;
use opensearch::OpenSearch;
use opensearch::http::headers::HeaderMap;
use opensearch::http::request::JsonBody;
use serde_json::Value;
use std::fmt;

/// HTTP method of a transport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// HEAD
    Head,
}

impl Method {
    fn to_opensearch(self) -> opensearch::http::Method {
        match self {
            Self::Get => opensearch::http::Method::Get,
            Self::Post => opensearch::http::Method::Post,
            Self::Put => opensearch::http::Method::Put,
            Self::Delete => opensearch::http::Method::Delete,
            Self::Head => opensearch::http::Method::Head,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        })
    }
}

/// A request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Path, starting with `/`.
    pub path: String,
    /// Query string parameters.
    pub params: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Value>,
}

impl TransportRequest {
    /// Create a request without parameters or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    /// Add a query string parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Set the JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response returned by a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl TransportResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to a cluster.
///
/// Pooling, retries and TLS are the implementation's business.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the raw response.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// [`Transport`] backed by the `opensearch` crate.
#[derive(Clone)]
pub struct OpenSearchTransport {
    client: OpenSearch,
}

impl OpenSearchTransport {
    /// Wrap a configured `opensearch` client.
    pub fn new(client: OpenSearch) -> Self {
        Self { client }
    }
}

impl fmt::Debug for OpenSearchTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenSearchTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for OpenSearchTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let response = self
            .client
            .transport()
            .send(
                request.method.to_opensearch(),
                &request.path,
                HeaderMap::new(),
                Some(&request.params),
                request.body.map(JsonBody::new),
                None,
            )
            .await?;

        let status = response.status_code().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| OpenSearchError::Transport(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = TransportRequest::new(Method::Post, "/logs/_search")
            .param("typed_keys", "true")
            .body(json!({"size": 0}));
        assert_eq!(request.method.to_string(), "POST");
        assert_eq!(request.params, vec![("typed_keys".to_string(), "true".to_string())]);
        assert_eq!(request.body, Some(json!({"size": 0})));
    }

    #[test]
    fn test_response_status() {
        let ok = TransportResponse { status: 200, body: String::new() };
        let missing = TransportResponse { status: 404, body: String::new() };
        assert!(ok.is_success());
        assert!(!missing.is_success());
    }
}
