// Quarry - a typed OpenSearch client
//
// This library re-exports the quarry member crates: the OpenSearch client with
// its aggregation decoder, and the logging macros the client uses.

// Re-export the client
pub use quarry_opensearch::*;

// Re-export logging
pub use quarry_log as log;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::aggregations::{
        Aggregate, AggregateMap, BucketItem, BucketKey, FromBucketKey, KeyedBucket,
    };
    pub use crate::{
        Document, Hit, OpenSearchClient, OpenSearchConfig, OpenSearchError, Result,
        SearchRequest, SearchResponse, Transport, TransportRequest, TransportResponse,
        bucket_key_enum,
    };
}
