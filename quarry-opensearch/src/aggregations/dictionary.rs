//! [`AggregateMap`] and its typed accessors.
//!
//! Accessors come in three flavours:
//!
//! - direct lookups return `Option<&T>` when the stored result already has
//!   the requested shape;
//! - bucket reinterpretations return an owned `Option<T>` built from the
//!   generic [`BucketAggregate`], keeping only the items of the requested
//!   bucket shape;
//! - key re-typing accessors return `Result<Option<T>>`, failing only when a
//!   bucket key cannot be converted to the requested key type.
//!
//! A missing name, or a name holding a different shape, is `None` everywhere.

use super::aggregate::{
    Aggregate, BucketAggregate, ExtendedStatsAggregate, FiltersAggregate, GeoBoundsAggregate,
    GeoCentroidAggregate, GeoLineAggregate, KeyedValueAggregate, MatrixStatsAggregate,
    PercentilesAggregate, ScriptedMetricAggregate, SingleBucketAggregate, StatsAggregate,
    TopHitsAggregate, ValueAggregate,
};
use super::bucket::{
    BucketItem, DateHistogramBucket, IpRangeBucket, KeyedBucket, RangeBucket,
    VariableWidthHistogramBucket,
};
use super::decode::{insert_entry, sanitize};
use super::key::FromBucketKey;
use super::typed::{
    AutoDateHistogramAggregate, CompositeAggregate, MultiBucketAggregate, MultiTermsAggregate,
    SignificantTermsAggregate, TermsAggregate,
};
use crate::error::Result;
use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::collections::hash_map;

/// Decoded aggregation results, keyed by aggregation name.
///
/// Names never carry a `typed_keys` prefix; lookups strip one if given, so
/// `get("sum#total")` and `get("total")` find the same entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateMap {
    aggregations: HashMap<String, Aggregate>,
}

macro_rules! direct_accessors {
    ($variant:ident => $ty:ty { $($(#[$doc:meta])* $name:ident),+ $(,)? }) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, name: &str) -> Option<&$ty> {
                match self.get(name)? {
                    Aggregate::$variant(aggregate) => Some(aggregate),
                    _ => None,
                }
            }
        )+
    };
}

impl AggregateMap {
    /// Build a map from already decoded aggregates.
    pub fn new(aggregations: HashMap<String, Aggregate>) -> Self {
        aggregations.into_iter().collect()
    }

    pub(crate) fn from_decoded(aggregations: HashMap<String, Aggregate>) -> Self {
        Self { aggregations }
    }

    /// Decode an already parsed `"aggregations"` object.
    pub fn from_json_map(map: Map<String, Value>) -> Self {
        let mut decoded = HashMap::new();
        for (property, value) in map {
            insert_entry(&mut decoded, property, value);
        }
        Self::from_decoded(decoded)
    }

    /// Raw lookup.
    pub fn get(&self, name: &str) -> Option<&Aggregate> {
        self.aggregations.get(sanitize(name))
    }

    /// Returns true if an aggregation with this name was decoded.
    pub fn contains(&self, name: &str) -> bool {
        self.aggregations.contains_key(sanitize(name))
    }

    /// Number of aggregations.
    pub fn len(&self) -> usize {
        self.aggregations.len()
    }

    /// Returns true if nothing was decoded.
    pub fn is_empty(&self) -> bool {
        self.aggregations.is_empty()
    }

    /// Aggregation names, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.aggregations.keys().map(String::as_str)
    }

    /// Names and aggregates, in no particular order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Aggregate> {
        self.aggregations.iter()
    }

    direct_accessors!(Value => ValueAggregate {
        /// `min` result.
        min,
        /// `max` result.
        max,
        /// `sum` result.
        sum,
        /// `avg` result.
        average,
        /// `cardinality` result.
        cardinality,
        /// `value_count` result.
        value_count,
        /// `avg_bucket` result.
        average_bucket,
        /// `derivative` result.
        derivative,
        /// `sum_bucket` result.
        sum_bucket,
        /// `moving_avg` result.
        moving_average,
        /// `moving_fn` result.
        moving_function,
        /// `cumulative_sum` result.
        cumulative_sum,
        /// `cumulative_cardinality` result.
        cumulative_cardinality,
        /// `bucket_script` result.
        bucket_script,
        /// `serial_diff` result.
        serial_differencing,
        /// `weighted_avg` result.
        weighted_average,
        /// `median_absolute_deviation` result.
        median_absolute_deviation,
    });

    direct_accessors!(KeyedValue => KeyedValueAggregate {
        /// `max_bucket` result.
        max_bucket,
        /// `min_bucket` result.
        min_bucket,
    });

    direct_accessors!(Stats => StatsAggregate {
        /// `stats` result.
        stats,
        /// `stats_bucket` result.
        stats_bucket,
    });

    direct_accessors!(ExtendedStats => ExtendedStatsAggregate {
        /// `extended_stats` result.
        extended_stats,
        /// `extended_stats_bucket` result.
        extended_stats_bucket,
    });

    direct_accessors!(Percentiles => PercentilesAggregate {
        /// `percentiles` result.
        percentiles,
        /// `percentiles_bucket` result.
        percentiles_bucket,
        /// `percentile_ranks` result.
        percentile_ranks,
    });

    direct_accessors!(TopHits => TopHitsAggregate {
        /// `top_hits` result.
        top_hits,
    });

    direct_accessors!(GeoBounds => GeoBoundsAggregate {
        /// `geo_bounds` result.
        geo_bounds,
    });

    direct_accessors!(GeoCentroid => GeoCentroidAggregate {
        /// `geo_centroid` result.
        geo_centroid,
    });

    direct_accessors!(GeoLine => GeoLineAggregate {
        /// `geo_line` result.
        geo_line,
    });

    direct_accessors!(MatrixStats => MatrixStatsAggregate {
        /// `matrix_stats` result.
        matrix_stats,
    });

    direct_accessors!(SingleBucket => SingleBucketAggregate {
        /// `global` result.
        global,
        /// `filter` result.
        filter,
        /// `missing` result.
        missing,
        /// `nested` result.
        nested,
        /// `reverse_nested` result.
        reverse_nested,
        /// `children` result.
        children,
        /// `parent` result.
        parent,
        /// `sampler` result.
        sampler,
        /// `diversified_sampler` result.
        diversified_sampler,
    });

    /// `filters` result.
    ///
    /// Named filters decode to a dedicated shape; anonymous filters arrive as
    /// a bucket list whose filter buckets are collected here.
    pub fn filters(&self, name: &str) -> Option<FiltersAggregate> {
        match self.get(name)? {
            Aggregate::Filters(filters) => Some(filters.clone()),
            Aggregate::Bucket(bucket) => Some(FiltersAggregate {
                buckets: bucket
                    .items
                    .iter()
                    .filter_map(|item| match item {
                        BucketItem::Filters(b) => Some(b.clone()),
                        _ => None,
                    })
                    .collect(),
                meta: bucket.meta.clone(),
            }),
            _ => None,
        }
    }

    /// `scripted_metric` result.
    ///
    /// A reduce script returning a plain number decodes as a value aggregate
    /// unless `typed_keys` was set; that number is handed back here.
    pub fn scripted_metric(&self, name: &str) -> Option<ScriptedMetricAggregate> {
        match self.get(name)? {
            Aggregate::ScriptedMetric(scripted) => Some(scripted.clone()),
            Aggregate::Value(value) => Some(ScriptedMetricAggregate {
                value: value
                    .value
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number),
                meta: value.meta.clone(),
            }),
            _ => None,
        }
    }

    /// `terms` result with keys converted to `K`.
    pub fn terms<K: FromBucketKey>(&self, name: &str) -> Result<Option<TermsAggregate<K>>> {
        let Some(bucket) = self.bucket(name) else {
            return Ok(None);
        };
        Ok(Some(TermsAggregate {
            buckets: keyed_buckets(bucket)?,
            doc_count_error_upper_bound: bucket.doc_count_error_upper_bound,
            sum_other_doc_count: bucket.sum_other_doc_count,
            meta: bucket.meta.clone(),
        }))
    }

    /// `rare_terms` result with keys converted to `K`.
    pub fn rare_terms<K: FromBucketKey>(
        &self,
        name: &str,
    ) -> Result<Option<MultiBucketAggregate<KeyedBucket<K>>>> {
        self.keyed(name)
    }

    /// `multi_terms` result with every key element converted to `K`.
    pub fn multi_terms<K: FromBucketKey>(&self, name: &str) -> Result<Option<MultiTermsAggregate<K>>> {
        let Some(bucket) = self.bucket(name) else {
            return Ok(None);
        };
        let buckets = bucket
            .items
            .iter()
            .filter_map(|item| match item {
                BucketItem::Keyed(b) => Some(b.to_multi_terms()),
                _ => None,
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(MultiTermsAggregate {
            buckets,
            doc_count_error_upper_bound: bucket.doc_count_error_upper_bound,
            sum_other_doc_count: bucket.sum_other_doc_count,
            meta: bucket.meta.clone(),
        }))
    }

    /// `significant_terms` result with keys converted to `K`.
    pub fn significant_terms<K: FromBucketKey>(
        &self,
        name: &str,
    ) -> Result<Option<SignificantTermsAggregate<K>>> {
        let Some(bucket) = self.bucket(name) else {
            return Ok(None);
        };
        let buckets = bucket
            .items
            .iter()
            .filter_map(|item| match item {
                BucketItem::SignificantTerms(b) => Some(b.retype()),
                _ => None,
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(SignificantTermsAggregate {
            buckets,
            doc_count: bucket.doc_count,
            bg_count: bucket.bg_count,
            meta: bucket.meta.clone(),
        }))
    }

    /// `significant_text` result with keys converted to `K`.
    pub fn significant_text<K: FromBucketKey>(
        &self,
        name: &str,
    ) -> Result<Option<SignificantTermsAggregate<K>>> {
        self.significant_terms(name)
    }

    /// `histogram` result.
    pub fn histogram(&self, name: &str) -> Result<Option<MultiBucketAggregate<KeyedBucket<f64>>>> {
        self.keyed(name)
    }

    /// `date_histogram` result.
    pub fn date_histogram(&self, name: &str) -> Result<Option<MultiBucketAggregate<DateHistogramBucket>>> {
        let Some(bucket) = self.bucket(name) else {
            return Ok(None);
        };
        Ok(Some(MultiBucketAggregate {
            buckets: date_histogram_buckets(bucket)?,
            meta: bucket.meta.clone(),
        }))
    }

    /// `auto_date_histogram` result, with the interval the server chose.
    pub fn auto_date_histogram(&self, name: &str) -> Result<Option<AutoDateHistogramAggregate>> {
        let Some(bucket) = self.bucket(name) else {
            return Ok(None);
        };
        Ok(Some(AutoDateHistogramAggregate {
            buckets: date_histogram_buckets(bucket)?,
            interval: bucket.interval.clone(),
            meta: bucket.meta.clone(),
        }))
    }

    /// `geohash_grid` result.
    pub fn geohash_grid(&self, name: &str) -> Result<Option<MultiBucketAggregate<KeyedBucket<String>>>> {
        self.keyed(name)
    }

    /// `geotile_grid` result.
    pub fn geotile_grid(&self, name: &str) -> Result<Option<MultiBucketAggregate<KeyedBucket<String>>>> {
        self.keyed(name)
    }

    /// `adjacency_matrix` result.
    pub fn adjacency_matrix(
        &self,
        name: &str,
    ) -> Result<Option<MultiBucketAggregate<KeyedBucket<String>>>> {
        self.keyed(name)
    }

    /// `range` result.
    pub fn range(&self, name: &str) -> Option<MultiBucketAggregate<RangeBucket>> {
        self.ranges(name)
    }

    /// `date_range` result.
    pub fn date_range(&self, name: &str) -> Option<MultiBucketAggregate<RangeBucket>> {
        self.ranges(name)
    }

    /// `geo_distance` result.
    pub fn geo_distance(&self, name: &str) -> Option<MultiBucketAggregate<RangeBucket>> {
        self.ranges(name)
    }

    /// `ip_range` result.
    pub fn ip_range(&self, name: &str) -> Option<MultiBucketAggregate<IpRangeBucket>> {
        self.multi_bucket(name, |item| match item {
            BucketItem::IpRange(b) => Some(b.clone()),
            _ => None,
        })
    }

    /// `composite` result, with the key to resume paging from.
    pub fn composite(&self, name: &str) -> Option<CompositeAggregate> {
        let bucket = self.bucket(name)?;
        Some(CompositeAggregate {
            buckets: bucket
                .items
                .iter()
                .filter_map(|item| match item {
                    BucketItem::Composite(b) => Some(b.clone()),
                    _ => None,
                })
                .collect(),
            after_key: bucket.after_key.clone(),
            meta: bucket.meta.clone(),
        })
    }

    /// `variable_width_histogram` result.
    pub fn variable_width_histogram(
        &self,
        name: &str,
    ) -> Option<MultiBucketAggregate<VariableWidthHistogramBucket>> {
        self.multi_bucket(name, |item| match item {
            BucketItem::VariableWidthHistogram(b) => Some(b.clone()),
            _ => None,
        })
    }

    fn bucket(&self, name: &str) -> Option<&BucketAggregate> {
        match self.get(name)? {
            Aggregate::Bucket(bucket) => Some(bucket),
            _ => None,
        }
    }

    fn multi_bucket<B>(
        &self,
        name: &str,
        select: impl FnMut(&BucketItem) -> Option<B>,
    ) -> Option<MultiBucketAggregate<B>> {
        let bucket = self.bucket(name)?;
        Some(MultiBucketAggregate {
            buckets: bucket.items.iter().filter_map(select).collect(),
            meta: bucket.meta.clone(),
        })
    }

    fn ranges(&self, name: &str) -> Option<MultiBucketAggregate<RangeBucket>> {
        self.multi_bucket(name, |item| match item {
            BucketItem::Range(b) => Some(b.clone()),
            _ => None,
        })
    }

    fn keyed<K: FromBucketKey>(&self, name: &str) -> Result<Option<MultiBucketAggregate<KeyedBucket<K>>>> {
        let Some(bucket) = self.bucket(name) else {
            return Ok(None);
        };
        Ok(Some(MultiBucketAggregate {
            buckets: keyed_buckets(bucket)?,
            meta: bucket.meta.clone(),
        }))
    }
}

fn keyed_buckets<K: FromBucketKey>(bucket: &BucketAggregate) -> Result<Vec<KeyedBucket<K>>> {
    bucket
        .items
        .iter()
        .filter_map(|item| match item {
            BucketItem::Keyed(b) => Some(b.retype()),
            _ => None,
        })
        .collect()
}

fn date_histogram_buckets(bucket: &BucketAggregate) -> Result<Vec<DateHistogramBucket>> {
    bucket
        .items
        .iter()
        .filter_map(|item| match item {
            BucketItem::Keyed(b) => Some(b.to_date_histogram()),
            _ => None,
        })
        .collect()
}

impl FromIterator<(String, Aggregate)> for AggregateMap {
    fn from_iter<I: IntoIterator<Item = (String, Aggregate)>>(iter: I) -> Self {
        Self::from_decoded(
            iter.into_iter()
                .map(|(name, aggregate)| (sanitize(&name).to_string(), aggregate))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a AggregateMap {
    type Item = (&'a String, &'a Aggregate);
    type IntoIter = hash_map::Iter<'a, String, Aggregate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Aggregation results are response-only; writing them back is refused.
impl Serialize for AggregateMap {
    fn serialize<S>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Err(S::Error::custom("serializing aggregation results is not supported"))
    }
}
