//! Aggregation results.
//!
//! The `"aggregations"` member of a search response has no fixed schema: its
//! shape depends on the request. [`AggregateMap`] decodes it into a small set
//! of [`Aggregate`] variants and leaves bucket lists untyped until an accessor
//! asks for a concrete bucket and key type.
//!
//! ```rust
//! use quarry_opensearch::aggregations::AggregateMap;
//! use serde_json::json;
//!
//! let aggs: AggregateMap = serde_json::from_value(json!({
//!     "sum#total": {"value": 42.0},
//!     "colors": {"buckets": [{"key": "red", "doc_count": 5}]}
//! }))
//! .unwrap();
//!
//! assert_eq!(aggs.sum("total").unwrap().value, Some(42.0));
//! let colors = aggs.terms::<String>("colors").unwrap().unwrap();
//! assert_eq!(colors.buckets[0].key, "red");
//! ```

mod aggregate;
mod bucket;
mod decode;
mod dictionary;
mod key;
mod typed;

pub use aggregate::{
    Aggregate, BucketAggregate, ExtendedStatsAggregate, FiltersAggregate, GeoBounds,
    GeoBoundsAggregate, GeoCentroidAggregate, GeoLineAggregate, GeoLineProperties, GeoLocation,
    KeyedValueAggregate, LineStringGeometry, MatrixStatsAggregate, MatrixStatsField, Meta,
    PercentileItem, PercentilesAggregate, ScriptedMetricAggregate, SingleBucketAggregate,
    StatsAggregate, StdDeviationBounds, TopHitsAggregate, ValueAggregate,
};
pub use bucket::{
    BucketItem, CompositeBucket, CompositeKey, DateHistogramBucket, FiltersBucketItem,
    IpRangeBucket, KeyedBucket, MultiTermsBucket, RangeBucket, SignificantTermsBucket,
    VariableWidthHistogramBucket,
};
pub use decode::TYPED_KEYS_SEPARATOR;
pub use dictionary::AggregateMap;
pub use key::{BucketKey, FromBucketKey};
pub use typed::{
    AutoDateHistogramAggregate, CompositeAggregate, MultiBucketAggregate, MultiTermsAggregate,
    SignificantTermsAggregate, TermsAggregate,
};
