//! OpenSearch client implementation.

use crate::{
    config::OpenSearchConfig,
    document::Document,
    error::{OpenSearchError, Result},
    search::{SearchRequest, SearchResponse},
    transport::{Method, OpenSearchTransport, Transport, TransportRequest, TransportResponse},
};
use opensearch::{
    OpenSearch,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
};
use quarry_log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

/// OpenSearch client for searches.
#[derive(Clone)]
pub struct OpenSearchClient {
    transport: Arc<dyn Transport>,
    config: Arc<OpenSearchConfig>,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client.
    pub fn new(config: OpenSearchConfig) -> Result<Self> {
        info!("Initializing OpenSearch client for: {:?}", config.urls);

        let url = config
            .urls
            .first()
            .ok_or_else(|| OpenSearchError::Validation("No URLs provided".to_string()))?;

        let url = opensearch::http::Url::parse(url)
            .map_err(|e| OpenSearchError::Validation(format!("Invalid URL: {}", e)))?;

        let conn_pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(config.request_timeout)
            .disable_proxy();

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.auth(opensearch::auth::Credentials::Basic(
                user.clone(),
                pass.clone(),
            ));
        }

        let transport = builder
            .build()
            .map_err(|e| OpenSearchError::Connection(e.to_string()))?;

        debug!("OpenSearch client initialized");

        Ok(Self::with_transport(
            Arc::new(OpenSearchTransport::new(OpenSearch::new(transport))),
            config,
        ))
    }

    /// Create a client over an injected transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: OpenSearchConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenSearchConfig {
        &self.config
    }

    /// Run a search and decode hits as `T`.
    ///
    /// Adds `typed_keys=true` when the configuration asks for it, so
    /// aggregation results decode without shape guessing.
    pub async fn search<T: DeserializeOwned>(&self, request: SearchRequest) -> Result<SearchResponse<T>> {
        debug!("Searching indices: {:?}", request.indices);

        let mut transport_request = TransportRequest::new(Method::Post, request.path()).body(request.body);
        if self.config.typed_keys
            && !request.params.iter().any(|(name, _)| name == "typed_keys")
        {
            transport_request = transport_request.param("typed_keys", "true");
        }
        transport_request.params.extend(request.params);

        self.execute(transport_request).await
    }

    /// Search the index of a document type.
    pub async fn search_documents<D: Document>(&self, body: Value) -> Result<SearchResponse<D>> {
        self.search(SearchRequest::for_document::<D>().body(body)).await
    }

    /// Fetch the next page of a scroll.
    pub async fn scroll<T: DeserializeOwned>(
        &self,
        scroll_id: &str,
        keep_alive: &str,
    ) -> Result<SearchResponse<T>> {
        debug!("Continuing scroll with keep alive {}", keep_alive);

        let mut request = TransportRequest::new(Method::Post, "/_search/scroll")
            .body(json!({ "scroll": keep_alive, "scroll_id": scroll_id }));
        if self.config.typed_keys {
            request = request.param("typed_keys", "true");
        }

        self.execute(request).await
    }

    /// Release a scroll context.
    pub async fn clear_scroll(&self, scroll_id: &str) -> Result<()> {
        let request = TransportRequest::new(Method::Delete, "/_search/scroll")
            .body(json!({ "scroll_id": [scroll_id] }));
        let response = self.transport.send(request).await?;
        check_status(&response)
    }

    /// Ping the cluster.
    pub async fn ping(&self) -> Result<bool> {
        let response = self
            .transport
            .send(TransportRequest::new(Method::Head, "/"))
            .await;
        Ok(response.map(|r| r.is_success()).unwrap_or(false))
    }

    async fn execute<T: DeserializeOwned>(&self, request: TransportRequest) -> Result<T> {
        debug!("{} {}", request.method, request.path);

        let response = self.transport.send(request).await?;
        check_status(&response)?;

        Ok(serde_json::from_str(&response.body)?)
    }
}

fn check_status(response: &TransportResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    let reason = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| {
            body.get("error")
                .and_then(|e| e.get("reason").or(Some(e)))
                .and_then(|r| r.as_str())
                .map(|r| r.to_string())
        })
        .unwrap_or_else(|| "Request failed".to_string());

    Err(OpenSearchError::Query {
        status: response.status,
        reason,
    })
}

impl std::fmt::Debug for OpenSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchClient")
            .field("urls", &self.config.urls)
            .finish()
    }
}
