//! Bucket shapes.
//!
//! [`BucketItem`] is the untyped form a bucket takes while decoding. The
//! concrete bucket structs double as the typed shapes handed out by the
//! accessors on [`AggregateMap`]; only the key of [`KeyedBucket`] and
//! [`SignificantTermsBucket`] needs converting on the way out.

use super::dictionary::AggregateMap;
use super::key::{BucketKey, FromBucketKey, convert_multi};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// One entry of a bucket aggregate, before the caller picks a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketItem {
    /// Terms, histogram, date histogram, grid, adjacency and multi-terms buckets.
    Keyed(KeyedBucket<BucketKey>),
    /// Significant terms/text bucket.
    SignificantTerms(SignificantTermsBucket<BucketKey>),
    /// Numeric or date range bucket.
    Range(RangeBucket),
    /// IP range bucket.
    IpRange(IpRangeBucket),
    /// Composite aggregation bucket.
    Composite(CompositeBucket),
    /// Filters bucket (anonymous, or named when keyed).
    Filters(FiltersBucketItem),
    /// Variable width histogram bucket.
    VariableWidthHistogram(VariableWidthHistogramBucket),
}

impl BucketItem {
    /// Number of documents in the bucket.
    pub fn doc_count(&self) -> u64 {
        match self {
            Self::Keyed(b) => b.doc_count,
            Self::SignificantTerms(b) => b.doc_count,
            Self::Range(b) => b.doc_count,
            Self::IpRange(b) => b.doc_count,
            Self::Composite(b) => b.doc_count,
            Self::Filters(b) => b.doc_count,
            Self::VariableWidthHistogram(b) => b.doc_count,
        }
    }

    /// Sub-aggregations of the bucket.
    pub fn aggregations(&self) -> &AggregateMap {
        match self {
            Self::Keyed(b) => &b.aggregations,
            Self::SignificantTerms(b) => &b.aggregations,
            Self::Range(b) => &b.aggregations,
            Self::IpRange(b) => &b.aggregations,
            Self::Composite(b) => &b.aggregations,
            Self::Filters(b) => &b.aggregations,
            Self::VariableWidthHistogram(b) => &b.aggregations,
        }
    }
}

/// A bucket identified by a single key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedBucket<K> {
    /// Bucket key.
    pub key: K,
    /// Formatted key, when the server sent one.
    pub key_as_string: Option<String>,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Upper bound of the error on `doc_count`.
    pub doc_count_error_upper_bound: Option<i64>,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
}

impl KeyedBucket<BucketKey> {
    pub(crate) fn retype<K: FromBucketKey>(&self) -> Result<KeyedBucket<K>> {
        Ok(KeyedBucket {
            key: K::from_bucket_key(&self.key)?,
            key_as_string: self.key_as_string.clone(),
            doc_count: self.doc_count,
            doc_count_error_upper_bound: self.doc_count_error_upper_bound,
            aggregations: self.aggregations.clone(),
        })
    }

    pub(crate) fn to_multi_terms<K: FromBucketKey>(&self) -> Result<MultiTermsBucket<K>> {
        Ok(MultiTermsBucket {
            key: convert_multi(&self.key)?,
            key_as_string: self.key_as_string.clone(),
            doc_count: self.doc_count,
            doc_count_error_upper_bound: self.doc_count_error_upper_bound,
            aggregations: self.aggregations.clone(),
        })
    }

    pub(crate) fn to_date_histogram(&self) -> Result<DateHistogramBucket> {
        Ok(DateHistogramBucket {
            key: f64::from_bucket_key(&self.key)?,
            key_as_string: self.key_as_string.clone(),
            doc_count: self.doc_count,
            aggregations: self.aggregations.clone(),
        })
    }
}

/// A `multi_terms` bucket whose key is an ordered sequence of converted values.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiTermsBucket<K> {
    /// Key elements, in the order the server sent them.
    pub key: Vec<K>,
    /// Formatted key (`"a|1"`), when the server sent one.
    pub key_as_string: Option<String>,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Upper bound of the error on `doc_count`.
    pub doc_count_error_upper_bound: Option<i64>,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
}

/// A date histogram bucket. The key is milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct DateHistogramBucket {
    /// Epoch milliseconds.
    pub key: f64,
    /// Formatted date.
    pub key_as_string: Option<String>,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
}

impl DateHistogramBucket {
    /// The key as a UTC timestamp.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        if !self.key.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis(self.key as i64)
    }
}

/// A significant terms (or significant text) bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificantTermsBucket<K> {
    /// Bucket key.
    pub key: K,
    /// Number of documents in the foreground set.
    pub doc_count: u64,
    /// Number of documents in the background set.
    pub bg_count: u64,
    /// Significance score.
    pub score: f64,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
}

impl SignificantTermsBucket<BucketKey> {
    pub(crate) fn retype<K: FromBucketKey>(&self) -> Result<SignificantTermsBucket<K>> {
        Ok(SignificantTermsBucket {
            key: K::from_bucket_key(&self.key)?,
            doc_count: self.doc_count,
            bg_count: self.bg_count,
            score: self.score,
            aggregations: self.aggregations.clone(),
        })
    }
}

/// A range bucket (`range`, `date_range`, `geo_distance`).
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBucket {
    /// Range key (`"*-100.0"` or the user supplied key).
    pub key: Option<String>,
    /// Lower bound (inclusive).
    pub from: Option<f64>,
    /// Formatted lower bound.
    pub from_as_string: Option<String>,
    /// Upper bound (exclusive).
    pub to: Option<f64>,
    /// Formatted upper bound.
    pub to_as_string: Option<String>,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
}

/// An IP range bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct IpRangeBucket {
    /// Range key.
    pub key: Option<String>,
    /// Lower address.
    pub from: Option<String>,
    /// Upper address.
    pub to: Option<String>,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
}

/// Key of a composite bucket, and the `after_key` of a composite aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeKey(pub Map<String, Value>);

impl CompositeKey {
    /// Raw value of one source.
    pub fn get(&self, source: &str) -> Option<&Value> {
        self.0.get(source)
    }

    /// Deserialize the value of one source.
    pub fn try_get<T: DeserializeOwned>(&self, source: &str) -> Result<Option<T>> {
        match self.0.get(source) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    /// Source names and values, in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// The key as a JSON object, ready to pass back as `after`.
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// A composite aggregation bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeBucket {
    /// Composite key.
    pub key: CompositeKey,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
}

/// A filters bucket. Named when the request used keyed filters.
#[derive(Debug, Clone, PartialEq)]
pub struct FiltersBucketItem {
    /// Filter name, `None` for anonymous filters.
    pub key: Option<String>,
    /// Number of documents matching the filter.
    pub doc_count: u64,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
}

/// A variable width histogram bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableWidthHistogramBucket {
    /// Bucket centroid.
    pub key: f64,
    /// Formatted key.
    pub key_as_string: Option<String>,
    /// Smallest value in the bucket.
    pub minimum: f64,
    /// Formatted minimum.
    pub minimum_as_string: Option<String>,
    /// Largest value in the bucket.
    pub maximum: f64,
    /// Formatted maximum.
    pub maximum_as_string: Option<String>,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Sub-aggregations.
    pub aggregations: AggregateMap,
}
