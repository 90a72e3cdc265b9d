//! Result shapes produced by reinterpreting a [`BucketAggregate`](super::BucketAggregate).

use super::aggregate::Meta;
use super::bucket::{
    CompositeBucket, CompositeKey, DateHistogramBucket, KeyedBucket, MultiTermsBucket,
    SignificantTermsBucket,
};

/// Buckets of one shape plus the aggregate's meta.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiBucketAggregate<B> {
    /// Buckets in wire order.
    pub buckets: Vec<B>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Result of a `terms` aggregation with keys of type `K`.
#[derive(Debug, Clone, PartialEq)]
pub struct TermsAggregate<K> {
    /// Buckets in wire order.
    pub buckets: Vec<KeyedBucket<K>>,
    /// Upper bound of the per-bucket count error.
    pub doc_count_error_upper_bound: Option<i64>,
    /// Documents not in any returned bucket.
    pub sum_other_doc_count: Option<i64>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Result of a `multi_terms` aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiTermsAggregate<K> {
    /// Buckets in wire order.
    pub buckets: Vec<MultiTermsBucket<K>>,
    /// Upper bound of the per-bucket count error.
    pub doc_count_error_upper_bound: Option<i64>,
    /// Documents not in any returned bucket.
    pub sum_other_doc_count: Option<i64>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Result of a `significant_terms` or `significant_text` aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificantTermsAggregate<K> {
    /// Buckets in wire order.
    pub buckets: Vec<SignificantTermsBucket<K>>,
    /// Foreground set size.
    pub doc_count: Option<u64>,
    /// Background set size.
    pub bg_count: Option<u64>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Result of an `auto_date_histogram` aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoDateHistogramAggregate {
    /// Buckets in wire order.
    pub buckets: Vec<DateHistogramBucket>,
    /// Interval picked by the server, e.g. `"7d"`.
    pub interval: Option<String>,
    /// Request meta.
    pub meta: Option<Meta>,
}

/// Result of a `composite` aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeAggregate {
    /// Buckets in wire order.
    pub buckets: Vec<CompositeBucket>,
    /// Key to pass as `after` for the next page.
    pub after_key: Option<CompositeKey>,
    /// Request meta.
    pub meta: Option<Meta>,
}
