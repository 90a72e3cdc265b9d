//! OpenSearch client with typed aggregation results.
//!
//! This crate provides:
//! - A search client over a pluggable [`Transport`]
//! - A typed search response model ([`SearchResponse`], [`Hit`])
//! - Decoding of the schema-less `"aggregations"` member into an
//!   [`AggregateMap`](aggregations::AggregateMap) with typed accessors
//!
//! # Example
//!
//! ```rust,no_run
//! use quarry_opensearch::{OpenSearchClient, OpenSearchConfig, SearchRequest};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenSearchClient::new(OpenSearchConfig::new("http://localhost:9200"))?;
//!
//!     let request = SearchRequest::new("orders").body(json!({
//!         "size": 0,
//!         "aggs": {
//!             "revenue": { "sum": { "field": "total" } },
//!             "by_status": { "terms": { "field": "status" } }
//!         }
//!     }));
//!     let response = client.search::<Value>(request).await?;
//!
//!     if let Some(revenue) = response.aggregations.sum("revenue") {
//!         println!("revenue: {:?}", revenue.value);
//!     }
//!     if let Some(by_status) = response.aggregations.terms::<String>("by_status")? {
//!         for bucket in by_status.buckets {
//!             println!("{}: {}", bucket.key, bucket.doc_count);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregations;
mod client;
mod config;
mod document;
mod error;
mod search;
mod transport;

pub use client::OpenSearchClient;
pub use config::OpenSearchConfig;
pub use document::Document;
pub use error::{OpenSearchError, Result};
pub use search::{
    Hit, HitsMetadata, SearchRequest, SearchResponse, ShardStatistics, TotalHits,
    TotalHitsRelation,
};
pub use transport::{Method, OpenSearchTransport, Transport, TransportRequest, TransportResponse};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::aggregations::{Aggregate, AggregateMap, BucketKey, FromBucketKey};
    pub use crate::{
        Document, OpenSearchClient, OpenSearchConfig, OpenSearchError, Result, SearchRequest,
        SearchResponse, Transport,
    };
}
