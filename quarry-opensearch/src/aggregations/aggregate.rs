//! Decoded aggregation results.

use super::bucket::{BucketItem, CompositeKey, FiltersBucketItem};
use super::dictionary::AggregateMap;
use crate::error::Result;
use crate::search::{Hit, TotalHits};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// Opaque `meta` payload attached to an aggregation in the request.
pub type Meta = serde_json::Map<String, Value>;

/// A decoded aggregation result.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    /// Single numeric value (`avg`, `sum`, `cardinality`, pipeline values, ...).
    Value(ValueAggregate),
    /// Value with the keys that produced it (`min_bucket`, `max_bucket`).
    KeyedValue(KeyedValueAggregate),
    /// `stats` and `stats_bucket`.
    Stats(StatsAggregate),
    /// `extended_stats` and `extended_stats_bucket`.
    ExtendedStats(ExtendedStatsAggregate),
    /// Percentiles, percentile ranks and `percentiles_bucket`.
    Percentiles(PercentilesAggregate),
    /// `geo_bounds`.
    GeoBounds(GeoBoundsAggregate),
    /// `geo_centroid`.
    GeoCentroid(GeoCentroidAggregate),
    /// `geo_line`.
    GeoLine(GeoLineAggregate),
    /// `top_hits`.
    TopHits(TopHitsAggregate),
    /// `scripted_metric` with a structured result.
    ScriptedMetric(ScriptedMetricAggregate),
    /// `matrix_stats`.
    MatrixStats(MatrixStatsAggregate),
    /// Single bucket aggregations (`filter`, `global`, `nested`, ...).
    SingleBucket(SingleBucketAggregate),
    /// Any aggregation returning a list of buckets.
    Bucket(BucketAggregate),
    /// `filters` with named filters.
    Filters(FiltersAggregate),
}

impl Aggregate {
    /// The `meta` payload, if the request attached one.
    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Self::Value(a) => a.meta.as_ref(),
            Self::KeyedValue(a) => a.meta.as_ref(),
            Self::Stats(a) => a.meta.as_ref(),
            Self::ExtendedStats(a) => a.meta.as_ref(),
            Self::Percentiles(a) => a.meta.as_ref(),
            Self::GeoBounds(a) => a.meta.as_ref(),
            Self::GeoCentroid(a) => a.meta.as_ref(),
            Self::GeoLine(a) => a.meta.as_ref(),
            Self::TopHits(a) => a.meta.as_ref(),
            Self::ScriptedMetric(a) => a.meta.as_ref(),
            Self::MatrixStats(a) => a.meta.as_ref(),
            Self::SingleBucket(a) => a.meta.as_ref(),
            Self::Bucket(a) => a.meta.as_ref(),
            Self::Filters(a) => a.meta.as_ref(),
        }
    }

    pub(crate) fn set_meta(&mut self, meta: Option<Meta>) {
        let slot = match self {
            Self::Value(a) => &mut a.meta,
            Self::KeyedValue(a) => &mut a.meta,
            Self::Stats(a) => &mut a.meta,
            Self::ExtendedStats(a) => &mut a.meta,
            Self::Percentiles(a) => &mut a.meta,
            Self::GeoBounds(a) => &mut a.meta,
            Self::GeoCentroid(a) => &mut a.meta,
            Self::GeoLine(a) => &mut a.meta,
            Self::TopHits(a) => &mut a.meta,
            Self::ScriptedMetric(a) => &mut a.meta,
            Self::MatrixStats(a) => &mut a.meta,
            Self::SingleBucket(a) => &mut a.meta,
            Self::Bucket(a) => &mut a.meta,
            Self::Filters(a) => &mut a.meta,
        };
        *slot = meta;
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::KeyedValue(_) => "keyed_value",
            Self::Stats(_) => "stats",
            Self::ExtendedStats(_) => "extended_stats",
            Self::Percentiles(_) => "percentiles",
            Self::GeoBounds(_) => "geo_bounds",
            Self::GeoCentroid(_) => "geo_centroid",
            Self::GeoLine(_) => "geo_line",
            Self::TopHits(_) => "top_hits",
            Self::ScriptedMetric(_) => "scripted_metric",
            Self::MatrixStats(_) => "matrix_stats",
            Self::SingleBucket(_) => "single_bucket",
            Self::Bucket(_) => "bucket",
            Self::Filters(_) => "filters",
        }
    }
}

macro_rules! aggregate_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Aggregate {
                fn from(aggregate: $ty) -> Self {
                    Aggregate::$variant(aggregate)
                }
            }
        )+
    };
}

aggregate_from!(
    Value(ValueAggregate),
    KeyedValue(KeyedValueAggregate),
    Stats(StatsAggregate),
    ExtendedStats(ExtendedStatsAggregate),
    Percentiles(PercentilesAggregate),
    GeoBounds(GeoBoundsAggregate),
    GeoCentroid(GeoCentroidAggregate),
    GeoLine(GeoLineAggregate),
    TopHits(TopHitsAggregate),
    ScriptedMetric(ScriptedMetricAggregate),
    MatrixStats(MatrixStatsAggregate),
    SingleBucket(SingleBucketAggregate),
    Bucket(BucketAggregate),
    Filters(FiltersAggregate),
);

/// Single numeric value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueAggregate {
    /// The value; `None` when no document contributed.
    pub value: Option<f64>,
    /// Formatted value.
    pub value_as_string: Option<String>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Value plus the bucket keys it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedValueAggregate {
    /// The value.
    pub value: Option<f64>,
    /// Keys of the buckets holding the value.
    pub keys: Vec<String>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Result of a `stats` aggregation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatsAggregate {
    /// Number of values.
    #[serde(default)]
    pub count: u64,
    /// Minimum.
    pub min: Option<f64>,
    /// Maximum.
    pub max: Option<f64>,
    /// Average.
    pub avg: Option<f64>,
    /// Sum.
    #[serde(default)]
    pub sum: f64,
    /// Formatted minimum.
    pub min_as_string: Option<String>,
    /// Formatted maximum.
    pub max_as_string: Option<String>,
    /// Formatted average.
    pub avg_as_string: Option<String>,
    /// Formatted sum.
    pub sum_as_string: Option<String>,
    /// Request meta.
    #[serde(skip)]
    pub meta: Option<Meta>,
}

/// Result of an `extended_stats` aggregation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtendedStatsAggregate {
    /// Number of values.
    #[serde(default)]
    pub count: u64,
    /// Minimum.
    pub min: Option<f64>,
    /// Maximum.
    pub max: Option<f64>,
    /// Average.
    pub avg: Option<f64>,
    /// Sum.
    #[serde(default)]
    pub sum: f64,
    /// Sum of squares.
    pub sum_of_squares: Option<f64>,
    /// Variance.
    pub variance: Option<f64>,
    /// Population variance.
    pub variance_population: Option<f64>,
    /// Sampling variance.
    pub variance_sampling: Option<f64>,
    /// Standard deviation.
    pub std_deviation: Option<f64>,
    /// Population standard deviation.
    pub std_deviation_population: Option<f64>,
    /// Sampling standard deviation.
    pub std_deviation_sampling: Option<f64>,
    /// Bounds at `sigma` standard deviations.
    pub std_deviation_bounds: Option<StdDeviationBounds>,
    /// Request meta.
    #[serde(skip)]
    pub meta: Option<Meta>,
}

/// Standard deviation bounds of an `extended_stats` result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StdDeviationBounds {
    /// Upper bound.
    pub upper: Option<f64>,
    /// Lower bound.
    pub lower: Option<f64>,
    /// Upper bound (population).
    pub upper_population: Option<f64>,
    /// Lower bound (population).
    pub lower_population: Option<f64>,
    /// Upper bound (sampling).
    pub upper_sampling: Option<f64>,
    /// Lower bound (sampling).
    pub lower_sampling: Option<f64>,
}

/// One percentile (or percentile rank) entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileItem {
    /// The percentile, or for percentile ranks the value being ranked.
    pub percentile: f64,
    /// The value at the percentile.
    pub value: Option<f64>,
    /// Formatted value.
    pub value_as_string: Option<String>,
}

/// Percentiles, ordered by ascending percentile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PercentilesAggregate {
    /// Entries.
    pub items: Vec<PercentileItem>,
    /// Request meta.
    pub meta: Option<Meta>,
}

impl PercentilesAggregate {
    /// Value at the given percentile.
    pub fn percentile(&self, percentile: f64) -> Option<f64> {
        self.items
            .iter()
            .find(|item| (item.percentile - percentile).abs() < 1e-9)
            .and_then(|item| item.value)
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoLocation {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

/// Bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoBounds {
    /// Top left corner.
    pub top_left: GeoLocation,
    /// Bottom right corner.
    pub bottom_right: GeoLocation,
}

/// Result of a `geo_bounds` aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoBoundsAggregate {
    /// Bounding box; `None` when no document had a location.
    pub bounds: Option<GeoBounds>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Result of a `geo_centroid` aggregation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeoCentroidAggregate {
    /// Centroid; `None` when no document had a location.
    #[serde(default)]
    pub location: Option<GeoLocation>,
    /// Number of points.
    #[serde(default)]
    pub count: u64,
    /// Request meta.
    #[serde(default)]
    pub meta: Option<Meta>,
}

/// Result of a `geo_line` aggregation, a GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoLineAggregate {
    /// Always `"Feature"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The line.
    pub geometry: LineStringGeometry,
    /// Feature properties.
    #[serde(default)]
    pub properties: GeoLineProperties,
    /// Request meta.
    #[serde(default)]
    pub meta: Option<Meta>,
}

/// GeoJSON line string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineStringGeometry {
    /// Always `"LineString"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `[lon, lat]` points.
    pub coordinates: Vec<Vec<f64>>,
}

/// Properties of a `geo_line` feature.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeoLineProperties {
    /// Whether all points were included.
    #[serde(default)]
    pub complete: bool,
    /// Sort values of the points.
    #[serde(default)]
    pub sort_values: Vec<f64>,
}

/// Result of a `top_hits` aggregation.
///
/// Hits are kept as raw JSON and deserialized on request, since the document
/// type is only known to the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopHitsAggregate {
    /// Total hits.
    pub total: Option<TotalHits>,
    /// Maximum score.
    pub max_score: Option<f64>,
    /// Raw hits.
    pub hits: Vec<Value>,
    /// Request meta.
    pub meta: Option<Meta>,
}

impl TopHitsAggregate {
    /// Deserialize the hits with their metadata.
    pub fn hits<T: DeserializeOwned>(&self) -> Result<Vec<Hit<T>>> {
        self.hits
            .iter()
            .map(|hit| Ok(serde_json::from_value(hit.clone())?))
            .collect()
    }

    /// Deserialize the `_source` of every hit that has one.
    pub fn documents<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        Ok(self.hits::<T>()?.into_iter().filter_map(|hit| hit.source).collect())
    }
}

/// Result of a `scripted_metric` aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedMetricAggregate {
    /// Whatever the reduce script returned.
    pub value: Value,
    /// Request meta.
    pub meta: Option<Meta>,
}

impl ScriptedMetricAggregate {
    /// Deserialize the script result.
    pub fn value_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

/// Statistics of one field in a `matrix_stats` result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatrixStatsField {
    /// Field name.
    pub name: String,
    /// Number of samples.
    #[serde(default)]
    pub count: u64,
    /// Mean.
    pub mean: Option<f64>,
    /// Variance.
    pub variance: Option<f64>,
    /// Skewness.
    pub skewness: Option<f64>,
    /// Kurtosis.
    pub kurtosis: Option<f64>,
    /// Covariance with every other field.
    #[serde(default)]
    pub covariance: HashMap<String, f64>,
    /// Correlation with every other field.
    #[serde(default)]
    pub correlation: HashMap<String, f64>,
}

/// Result of a `matrix_stats` aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixStatsAggregate {
    /// Number of documents.
    pub doc_count: u64,
    /// Per-field statistics.
    pub fields: Vec<MatrixStatsField>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Result of a single bucket aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleBucketAggregate {
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// A list of buckets whose concrete shape is chosen by the accessor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketAggregate {
    /// Buckets in wire order.
    pub items: Vec<BucketItem>,
    /// `terms`: upper bound of the per-bucket count error.
    pub doc_count_error_upper_bound: Option<i64>,
    /// `terms`: documents not in any returned bucket.
    pub sum_other_doc_count: Option<i64>,
    /// `composite`: key to resume from.
    pub after_key: Option<CompositeKey>,
    /// `auto_date_histogram`: interval chosen by the server.
    pub interval: Option<String>,
    /// `significant_terms`: foreground set size.
    pub doc_count: Option<u64>,
    /// `significant_terms`: background set size.
    pub bg_count: Option<u64>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Result of a `filters` aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiltersAggregate {
    /// Buckets in wire order.
    pub buckets: Vec<FiltersBucketItem>,
    /// Request meta.
    pub meta: Option<Meta>,
}

impl FiltersAggregate {
    /// Bucket of a named filter.
    pub fn named_bucket(&self, name: &str) -> Option<&FiltersBucketItem> {
        self.buckets
            .iter()
            .find(|bucket| bucket.key.as_deref() == Some(name))
    }

    /// Buckets of anonymous filters.
    pub fn anonymous_buckets(&self) -> impl Iterator<Item = &FiltersBucketItem> {
        self.buckets.iter().filter(|bucket| bucket.key.is_none())
    }
}
