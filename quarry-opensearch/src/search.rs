//! Search requests and responses.

use crate::aggregations::AggregateMap;
use crate::document::Document;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;

/// A search request: target indices, a raw JSON body and extra query parameters.
///
/// The body is passed through untouched; building queries and aggregation
/// requests is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Indices to search. Empty means all indices.
    pub indices: Vec<String>,
    /// Request body.
    pub body: Value,
    /// Extra query string parameters.
    pub params: Vec<(String, String)>,
}

impl SearchRequest {
    /// Search one index.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            indices: vec![index.into()],
            ..Self::default()
        }
    }

    /// Search the index a document type lives in.
    pub fn for_document<D: Document>() -> Self {
        Self::new(D::index_name())
    }

    /// Add another index.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.indices.push(index.into());
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Add a query string parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Keep a scroll context open for `keep_alive` (e.g. `"1m"`).
    pub fn scroll(self, keep_alive: impl Into<String>) -> Self {
        self.param("scroll", keep_alive)
    }

    /// Path of the `_search` endpoint for the target indices.
    pub fn path(&self) -> String {
        if self.indices.is_empty() {
            "/_search".to_string()
        } else {
            format!("/{}/_search", self.indices.join(","))
        }
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            indices: Vec::new(),
            body: json!({}),
            params: Vec::new(),
        }
    }
}

/// Response of a search or scroll request.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<T = Value> {
    /// Time the search took, in milliseconds.
    #[serde(default)]
    pub took: u64,
    /// Whether the search timed out.
    #[serde(default)]
    pub timed_out: bool,
    /// Shard statistics.
    #[serde(rename = "_shards", default)]
    pub shards: ShardStatistics,
    /// Matching documents.
    pub hits: HitsMetadata<T>,
    /// Aggregation results; empty when the request had none.
    #[serde(default)]
    pub aggregations: AggregateMap,
    /// Scroll id, when the request opened a scroll context.
    #[serde(rename = "_scroll_id")]
    pub scroll_id: Option<String>,
}

impl<T> SearchResponse<T> {
    /// The `_source` of every hit that has one.
    pub fn documents(&self) -> impl Iterator<Item = &T> {
        self.hits.hits.iter().filter_map(|hit| hit.source.as_ref())
    }

    /// Total hit count, if the server tracked it.
    pub fn total(&self) -> Option<u64> {
        self.hits.total.as_ref().map(|total| total.value)
    }
}

/// Shard statistics.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShardStatistics {
    /// Shards queried.
    #[serde(default)]
    pub total: u32,
    /// Shards that answered.
    #[serde(default)]
    pub successful: u32,
    /// Shards skipped.
    #[serde(default)]
    pub skipped: u32,
    /// Shards that failed.
    #[serde(default)]
    pub failed: u32,
}

/// The `hits` section of a search response.
#[derive(Debug, Clone, Deserialize)]
pub struct HitsMetadata<T> {
    /// Total matches.
    pub total: Option<TotalHits>,
    /// Highest score.
    pub max_score: Option<f64>,
    /// Returned hits.
    #[serde(default = "Vec::new")]
    pub hits: Vec<Hit<T>>,
}

/// One search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit<T> {
    /// Index the document lives in.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score.
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    /// Document version.
    #[serde(rename = "_version")]
    pub version: Option<i64>,
    /// Sequence number.
    #[serde(rename = "_seq_no")]
    pub seq_no: Option<i64>,
    /// Primary term.
    #[serde(rename = "_primary_term")]
    pub primary_term: Option<i64>,
    /// Routing value.
    #[serde(rename = "_routing")]
    pub routing: Option<String>,
    /// Document source.
    #[serde(rename = "_source")]
    pub source: Option<T>,
    /// Highlighted fragments per field.
    pub highlight: Option<HashMap<String, Vec<String>>>,
    /// Sort values.
    pub sort: Option<Vec<Value>>,
}

/// Total hit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "TotalHitsWire")]
pub struct TotalHits {
    /// Count.
    pub value: u64,
    /// Whether the count is exact or a lower bound.
    pub relation: TotalHitsRelation,
}

/// Relation of [`TotalHits::value`] to the real count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalHitsRelation {
    /// Exact.
    Eq,
    /// Lower bound.
    Gte,
}

// Old servers and `rest_total_hits_as_int` send a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum TotalHitsWire {
    Object {
        value: u64,
        relation: TotalHitsRelation,
    },
    Count(u64),
}

impl From<TotalHitsWire> for TotalHits {
    fn from(wire: TotalHitsWire) -> Self {
        match wire {
            TotalHitsWire::Object { value, relation } => Self { value, relation },
            TotalHitsWire::Count(value) => Self {
                value,
                relation: TotalHitsRelation::Eq,
            },
        }
    }
}
