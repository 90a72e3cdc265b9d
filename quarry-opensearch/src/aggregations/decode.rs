//! Decoding of the `"aggregations"` member of a search response.
//!
//! Property names are either plain (`"colors"`) or, when the request set
//! `typed_keys`, prefixed with the aggregation type (`"sterms#colors"`). The
//! prefix is stripped for the map key. A handful of types whose results are
//! structurally ambiguous get a dedicated decoder when the prefix names them;
//! everything else, including types this client has never heard of, goes
//! through shape detection.
//!
//! Shape detection checks, in order:
//!
//! 1. `buckets` array → [`Aggregate::Bucket`]; `buckets` object without a
//!    top-level `doc_count` → keyed buckets ([`Aggregate::Filters`] when every
//!    entry is a plain filter bucket, [`Aggregate::Bucket`] otherwise)
//!    (an empty keyed object is an empty [`Aggregate::Bucket`])
//! 2. `after_key` without `doc_count` → empty [`Aggregate::Bucket`] carrying the key
//! 3. `doc_count` with a `fields` array → [`Aggregate::MatrixStats`]
//! 4. `doc_count` → [`Aggregate::SingleBucket`]
//! 5. `bounds` → [`Aggregate::GeoBounds`]
//! 6. `location`, or a lone `count` → [`Aggregate::GeoCentroid`]
//! 7. GeoJSON `Feature` → [`Aggregate::GeoLine`]
//! 8. `hits` → [`Aggregate::TopHits`]
//! 9. `values` → [`Aggregate::Percentiles`]
//! 10. `count` with stats members → [`Aggregate::ExtendedStats`] or [`Aggregate::Stats`]
//! 11. `value` → [`Aggregate::KeyedValue`] with `keys`, [`Aggregate::Value`]
//!     for numbers and null, [`Aggregate::ScriptedMetric`] otherwise
//!
//! Anything else (including `{}`) is dropped from the map.

use super::aggregate::{
    Aggregate, BucketAggregate, ExtendedStatsAggregate, FiltersAggregate, GeoBounds,
    GeoBoundsAggregate, GeoCentroidAggregate, GeoLineAggregate, KeyedValueAggregate,
    MatrixStatsAggregate, MatrixStatsField, Meta, PercentileItem, PercentilesAggregate,
    ScriptedMetricAggregate, SingleBucketAggregate, StatsAggregate, TopHitsAggregate,
    ValueAggregate,
};
use super::bucket::{
    BucketItem, CompositeBucket, CompositeKey, FiltersBucketItem, IpRangeBucket, KeyedBucket,
    RangeBucket, SignificantTermsBucket, VariableWidthHistogramBucket,
};
use super::dictionary::AggregateMap;
use super::key::BucketKey;
use quarry_log::{debug, trace};
use serde::de::{Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Separates the type name from the aggregation name under `typed_keys`.
pub const TYPED_KEYS_SEPARATOR: char = '#';

const STATS_FIELDS: &[&str] = &["min", "max", "avg", "sum"];
const EXTENDED_STATS_FIELDS: &[&str] = &["sum_of_squares", "std_deviation", "variance"];

/// Strip a `typed_keys` prefix from an aggregation name.
pub(crate) fn sanitize(name: &str) -> &str {
    name.split_once(TYPED_KEYS_SEPARATOR)
        .map_or(name, |(_, name)| name)
}

/// Decode one `"<name>"` / `"<type>#<name>"` property into `target`.
pub(crate) fn insert_entry(target: &mut HashMap<String, Aggregate>, property: String, value: Value) {
    if property.is_empty() {
        trace!("Skipping aggregation with an empty name");
        return;
    }

    let (name, aggregate) = match property.split_once(TYPED_KEYS_SEPARATOR) {
        Some((kind, name)) => (name.to_string(), decode_typed(kind, name, value)),
        None => (property.clone(), decode_aggregate(value)),
    };

    match aggregate {
        Some(aggregate) => {
            trace!("Decoded '{}' as {}", name, aggregate.kind());
            target.insert(name, aggregate);
        }
        None => debug!("Dropping aggregation '{}': unrecognized result shape", name),
    }
}

#[derive(serde::Deserialize)]
struct ScriptedMetricWire {
    value: Value,
    #[serde(default)]
    meta: Option<Meta>,
}

fn decode_typed(kind: &str, name: &str, value: Value) -> Option<Aggregate> {
    let dedicated = match kind {
        "geo_centroid" => GeoCentroidAggregate::deserialize(&value).map(Aggregate::from),
        "geo_line" => GeoLineAggregate::deserialize(&value).map(Aggregate::from),
        "scripted_metric" => ScriptedMetricWire::deserialize(&value).map(|wire| {
            Aggregate::from(ScriptedMetricAggregate {
                value: wire.value,
                meta: wire.meta,
            })
        }),
        _ => {
            trace!("No dedicated decoder for '{}', detecting shape of '{}'", kind, name);
            return decode_aggregate(value);
        }
    };

    match dedicated {
        Ok(aggregate) => Some(aggregate),
        Err(e) => {
            debug!(
                "Dedicated {} decoder rejected '{}' ({}), detecting shape instead",
                kind, name, e
            );
            decode_aggregate(value)
        }
    }
}

/// Decode one aggregation result by shape.
pub(crate) fn decode_aggregate(value: Value) -> Option<Aggregate> {
    let Value::Object(mut object) = value else {
        return None;
    };
    let meta = match object.remove("meta") {
        Some(Value::Object(meta)) => Some(meta),
        _ => None,
    };
    let mut aggregate = classify(object)?;
    aggregate.set_meta(meta);
    Some(aggregate)
}

fn classify(mut object: Map<String, Value>) -> Option<Aggregate> {
    let has_doc_count = matches!(object.get("doc_count"), Some(Value::Number(_)));

    if matches!(object.get("buckets"), Some(Value::Array(_))) {
        return Some(decode_bucket_list(object).into());
    }
    if matches!(object.get("buckets"), Some(Value::Object(_))) && !has_doc_count {
        return Some(decode_keyed_buckets(object));
    }

    if object.contains_key("after_key") && !has_doc_count {
        return Some(bucket_aggregate(&mut object, Vec::new()).into());
    }

    if has_doc_count {
        if let Some(matrix) = decode_matrix_stats(&object) {
            return Some(matrix.into());
        }
        return Some(decode_single_bucket(object).into());
    }

    if let Some(bounds) = object.get("bounds").filter(|b| b.is_object()) {
        return Some(
            GeoBoundsAggregate {
                bounds: GeoBounds::deserialize(bounds).ok(),
                meta: None,
            }
            .into(),
        );
    }

    if object.contains_key("location") || (object.len() == 1 && object.contains_key("count")) {
        return GeoCentroidAggregate::deserialize(&Value::Object(object))
            .ok()
            .map(Aggregate::from);
    }

    if object.get("type").and_then(Value::as_str) == Some("Feature")
        && object.contains_key("geometry")
    {
        return GeoLineAggregate::deserialize(&Value::Object(object))
            .ok()
            .map(Aggregate::from);
    }

    if matches!(object.get("hits"), Some(Value::Object(_))) {
        return Some(decode_top_hits(object).into());
    }

    if let Some(values) = object.remove("values") {
        return Some(decode_percentiles(values).into());
    }

    if object.contains_key("count") && STATS_FIELDS.iter().any(|f| object.contains_key(*f)) {
        let extended = EXTENDED_STATS_FIELDS.iter().any(|f| object.contains_key(*f));
        let value = Value::Object(object);
        return if extended {
            ExtendedStatsAggregate::deserialize(&value)
                .ok()
                .map(Aggregate::from)
        } else {
            StatsAggregate::deserialize(&value).ok().map(Aggregate::from)
        };
    }

    if let Some(value) = object.remove("value") {
        return Some(decode_value(value, &object));
    }

    None
}

fn decode_value(value: Value, object: &Map<String, Value>) -> Aggregate {
    if let Some(Value::Array(keys)) = object.get("keys") {
        return KeyedValueAggregate {
            value: value.as_f64(),
            keys: keys
                .iter()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect(),
            meta: None,
        }
        .into();
    }

    match value {
        Value::Number(_) | Value::Null => ValueAggregate {
            value: value.as_f64(),
            value_as_string: object
                .get("value_as_string")
                .and_then(Value::as_str)
                .map(str::to_string),
            meta: None,
        }
        .into(),
        other => ScriptedMetricAggregate {
            value: other,
            meta: None,
        }
        .into(),
    }
}

fn decode_percentiles(values: Value) -> PercentilesAggregate {
    let mut items: Vec<PercentileItem> = match values {
        Value::Object(entries) => entries
            .iter()
            .filter(|(name, _)| !name.ends_with("_as_string"))
            .filter_map(|(name, value)| {
                Some(PercentileItem {
                    percentile: name.parse().ok()?,
                    value: value.as_f64(),
                    value_as_string: entries
                        .get(&format!("{}_as_string", name))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect(),
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| {
                Some(PercentileItem {
                    percentile: entry.get("key")?.as_f64()?,
                    value: entry.get("value").and_then(Value::as_f64),
                    value_as_string: entry
                        .get("value_as_string")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect(),
        _ => Vec::new(),
    };
    items.sort_by(|a, b| a.percentile.total_cmp(&b.percentile));

    PercentilesAggregate { items, meta: None }
}

fn decode_top_hits(mut object: Map<String, Value>) -> TopHitsAggregate {
    let Some(Value::Object(mut hits)) = object.remove("hits") else {
        return TopHitsAggregate::default();
    };
    TopHitsAggregate {
        total: hits
            .remove("total")
            .and_then(|total| serde_json::from_value(total).ok()),
        max_score: hits.get("max_score").and_then(Value::as_f64),
        hits: match hits.remove("hits") {
            Some(Value::Array(hits)) => hits,
            _ => Vec::new(),
        },
        meta: None,
    }
}

fn decode_matrix_stats(object: &Map<String, Value>) -> Option<MatrixStatsAggregate> {
    let fields = object.get("fields").filter(|f| f.is_array())?;
    Some(MatrixStatsAggregate {
        doc_count: object.get("doc_count").and_then(Value::as_u64).unwrap_or(0),
        fields: Vec::<MatrixStatsField>::deserialize(fields).ok()?,
        meta: None,
    })
}

fn decode_single_bucket(mut object: Map<String, Value>) -> SingleBucketAggregate {
    SingleBucketAggregate {
        doc_count: take_u64(&mut object, "doc_count").unwrap_or(0),
        aggregations: sub_aggregations(object),
        meta: None,
    }
}

fn decode_bucket_list(mut object: Map<String, Value>) -> BucketAggregate {
    let items = match object.remove("buckets") {
        Some(Value::Array(buckets)) => buckets
            .into_iter()
            .filter_map(|bucket| decode_bucket_item(bucket, None))
            .collect(),
        _ => Vec::new(),
    };
    bucket_aggregate(&mut object, items)
}

fn decode_keyed_buckets(mut object: Map<String, Value>) -> Aggregate {
    let items: Vec<BucketItem> = match object.remove("buckets") {
        Some(Value::Object(buckets)) => buckets
            .into_iter()
            .filter_map(|(name, bucket)| decode_bucket_item(bucket, Some(&name)))
            .collect(),
        _ => Vec::new(),
    };

    if !items.is_empty() && items.iter().all(|item| matches!(item, BucketItem::Filters(_))) {
        let buckets = items
            .into_iter()
            .filter_map(|item| match item {
                BucketItem::Filters(bucket) => Some(bucket),
                _ => None,
            })
            .collect();
        return FiltersAggregate {
            buckets,
            meta: None,
        }
        .into();
    }

    bucket_aggregate(&mut object, items).into()
}

fn bucket_aggregate(object: &mut Map<String, Value>, items: Vec<BucketItem>) -> BucketAggregate {
    BucketAggregate {
        items,
        doc_count_error_upper_bound: take_i64(object, "doc_count_error_upper_bound"),
        sum_other_doc_count: take_i64(object, "sum_other_doc_count"),
        after_key: take_composite_key(object, "after_key"),
        interval: take_string(object, "interval"),
        doc_count: take_u64(object, "doc_count"),
        bg_count: take_u64(object, "bg_count"),
        meta: None,
    }
}

/// Decode one bucket. `name` is the property name for keyed buckets.
fn decode_bucket_item(value: Value, name: Option<&str>) -> Option<BucketItem> {
    let Value::Object(mut object) = value else {
        return None;
    };
    let doc_count = take_u64(&mut object, "doc_count");

    if matches!(object.get("key"), Some(Value::Object(_))) {
        return Some(BucketItem::Composite(CompositeBucket {
            key: take_composite_key(&mut object, "key").unwrap_or_default(),
            doc_count: doc_count.unwrap_or(0),
            aggregations: sub_aggregations(object),
        }));
    }

    if is_bound(object.get("from")) || is_bound(object.get("to")) {
        let key = take_string(&mut object, "key").or_else(|| name.map(str::to_string));
        let textual = matches!(object.get("from"), Some(Value::String(_)))
            || matches!(object.get("to"), Some(Value::String(_)));
        if textual {
            return Some(BucketItem::IpRange(IpRangeBucket {
                key,
                from: take_string(&mut object, "from"),
                to: take_string(&mut object, "to"),
                doc_count: doc_count.unwrap_or(0),
                aggregations: sub_aggregations(object),
            }));
        }
        return Some(BucketItem::Range(RangeBucket {
            key,
            from: take_f64(&mut object, "from"),
            from_as_string: take_string(&mut object, "from_as_string"),
            to: take_f64(&mut object, "to"),
            to_as_string: take_string(&mut object, "to_as_string"),
            doc_count: doc_count.unwrap_or(0),
            aggregations: sub_aggregations(object),
        }));
    }

    let numeric_min_max = matches!(object.get("min"), Some(Value::Number(_)))
        && matches!(object.get("max"), Some(Value::Number(_)));
    if numeric_min_max && matches!(object.get("key"), Some(Value::Number(_))) {
        return Some(BucketItem::VariableWidthHistogram(VariableWidthHistogramBucket {
            key: take_f64(&mut object, "key")?,
            key_as_string: take_string(&mut object, "key_as_string"),
            minimum: take_f64(&mut object, "min")?,
            minimum_as_string: take_string(&mut object, "min_as_string"),
            maximum: take_f64(&mut object, "max")?,
            maximum_as_string: take_string(&mut object, "max_as_string"),
            doc_count: doc_count.unwrap_or(0),
            aggregations: sub_aggregations(object),
        }));
    }

    match object.remove("key") {
        Some(raw) => {
            let key = BucketKey::from_json(&raw)?;
            let significant = matches!(object.get("bg_count"), Some(Value::Number(_)))
                || matches!(object.get("score"), Some(Value::Number(_)));
            if significant {
                return Some(BucketItem::SignificantTerms(SignificantTermsBucket {
                    key,
                    doc_count: doc_count.unwrap_or(0),
                    bg_count: take_u64(&mut object, "bg_count").unwrap_or(0),
                    score: take_f64(&mut object, "score").unwrap_or(0.0),
                    aggregations: sub_aggregations(object),
                }));
            }
            Some(BucketItem::Keyed(KeyedBucket {
                key,
                key_as_string: take_string(&mut object, "key_as_string"),
                doc_count: doc_count.unwrap_or(0),
                doc_count_error_upper_bound: take_i64(&mut object, "doc_count_error_upper_bound"),
                aggregations: sub_aggregations(object),
            }))
        }
        None => Some(BucketItem::Filters(FiltersBucketItem {
            key: name.map(str::to_string),
            doc_count: doc_count?,
            aggregations: sub_aggregations(object),
        })),
    }
}

/// Remaining object members of a bucket are its sub-aggregations.
fn sub_aggregations(object: Map<String, Value>) -> AggregateMap {
    let mut decoded = HashMap::new();
    for (name, value) in object {
        if value.is_object() {
            insert_entry(&mut decoded, name, value);
        }
    }
    AggregateMap::from_decoded(decoded)
}

fn is_bound(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Number(_) | Value::String(_)))
}

fn take_f64(object: &mut Map<String, Value>, field: &str) -> Option<f64> {
    object.remove(field).and_then(|v| v.as_f64())
}

fn take_u64(object: &mut Map<String, Value>, field: &str) -> Option<u64> {
    object.remove(field).and_then(|v| v.as_u64())
}

fn take_i64(object: &mut Map<String, Value>, field: &str) -> Option<i64> {
    object.remove(field).and_then(|v| v.as_i64())
}

fn take_string(object: &mut Map<String, Value>, field: &str) -> Option<String> {
    match object.remove(field) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn take_composite_key(object: &mut Map<String, Value>, field: &str) -> Option<CompositeKey> {
    match object.remove(field) {
        Some(Value::Object(key)) => Some(CompositeKey(key)),
        _ => None,
    }
}

struct AggregateMapVisitor;

impl<'de> Visitor<'de> for AggregateMapVisitor {
    type Value = AggregateMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an aggregations object")
    }

    fn visit_map<A>(self, mut access: A) -> Result<AggregateMap, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut decoded = HashMap::new();
        while let Some(property) = access.next_key::<String>()? {
            if property.is_empty() {
                access.next_value::<IgnoredAny>()?;
                trace!("Skipping aggregation with an empty name");
                continue;
            }
            let value: Value = access.next_value()?;
            insert_entry(&mut decoded, property, value);
        }
        Ok(AggregateMap::from_decoded(decoded))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<AggregateMap, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        debug!("Aggregations member is an array, ignoring it");
        Ok(AggregateMap::default())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<AggregateMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_none<E>(self) -> Result<AggregateMap, E> {
        Ok(AggregateMap::default())
    }

    fn visit_unit<E>(self) -> Result<AggregateMap, E> {
        Ok(AggregateMap::default())
    }

    fn visit_bool<E>(self, _: bool) -> Result<AggregateMap, E> {
        Ok(AggregateMap::default())
    }

    fn visit_i64<E>(self, _: i64) -> Result<AggregateMap, E> {
        Ok(AggregateMap::default())
    }

    fn visit_u64<E>(self, _: u64) -> Result<AggregateMap, E> {
        Ok(AggregateMap::default())
    }

    fn visit_f64<E>(self, _: f64) -> Result<AggregateMap, E> {
        Ok(AggregateMap::default())
    }

    fn visit_str<E>(self, _: &str) -> Result<AggregateMap, E> {
        Ok(AggregateMap::default())
    }
}

impl<'de> Deserialize<'de> for AggregateMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AggregateMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Option<Aggregate> {
        decode_aggregate(value)
    }

    fn map(value: Value) -> AggregateMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("sum#total"), "total");
        assert_eq!(sanitize("total"), "total");
        assert_eq!(sanitize("a#b#c"), "b#c");
    }

    #[test]
    fn test_typed_and_untyped_names() {
        let aggs = map(json!({
            "my_sum#total": {"value": 42.0},
            "plain": {"value": 1.0}
        }));
        assert!(aggs.contains("total"));
        assert!(aggs.contains("plain"));
        assert!(!aggs.contains("my_sum#total"));
        assert_eq!(aggs.len(), 2);
    }

    #[test]
    fn test_empty_name_is_skipped() {
        let aggs = map(json!({"": {"value": 1.0}, "ok": {"value": 2.0}}));
        assert_eq!(aggs.len(), 1);
        assert!(aggs.contains("ok"));
    }

    #[test]
    fn test_non_object_input_decodes_to_empty_map() {
        assert!(map(json!(null)).is_empty());
        assert!(map(json!([1, {"a": 2}])).is_empty());
        assert!(map(json!("aggregations")).is_empty());
        assert!(map(json!(12)).is_empty());
    }

    #[test]
    fn test_non_object_input_is_consumed() {
        #[derive(serde::Deserialize)]
        struct Response {
            aggregations: AggregateMap,
            took: u64,
        }
        let response: Response =
            serde_json::from_str(r#"{"aggregations": [1, [2, 3], {"x": 4}], "took": 7}"#).unwrap();
        assert!(response.aggregations.is_empty());
        assert_eq!(response.took, 7);
    }

    #[test]
    fn test_value_shapes() {
        assert!(matches!(
            decode(json!({"value": 3.5, "value_as_string": "3.5"})),
            Some(Aggregate::Value(ValueAggregate { value: Some(v), value_as_string: Some(_), .. })) if v == 3.5
        ));
        assert!(matches!(
            decode(json!({"value": null})),
            Some(Aggregate::Value(ValueAggregate { value: None, .. }))
        ));
        assert!(matches!(
            decode(json!({"value": 10.0, "keys": ["2023-01"]})),
            Some(Aggregate::KeyedValue(KeyedValueAggregate { ref keys, .. })) if keys == &["2023-01"]
        ));
        assert!(matches!(
            decode(json!({"value": {"total": 3}})),
            Some(Aggregate::ScriptedMetric(_))
        ));
    }

    #[test]
    fn test_empty_object_is_unclassified() {
        assert_eq!(decode(json!({})), None);
        assert_eq!(decode(json!({"meta": {"a": 1}})), None);
        assert!(map(json!({"empty": {}})).is_empty());
    }

    #[test]
    fn test_meta_is_passed_through() {
        let aggregate = decode(json!({"meta": {"owner": "ops"}, "value": 1.0})).unwrap();
        assert_eq!(aggregate.meta().unwrap()["owner"], "ops");
    }

    #[test]
    fn test_stats_and_extended_stats() {
        let stats = decode(json!({"count": 2, "min": 1.0, "max": 3.0, "avg": 2.0, "sum": 4.0}));
        assert!(matches!(stats, Some(Aggregate::Stats(StatsAggregate { count: 2, .. }))));

        let extended = decode(json!({
            "count": 2, "min": 1.0, "max": 3.0, "avg": 2.0, "sum": 4.0,
            "sum_of_squares": 10.0, "variance": 1.0, "std_deviation": 1.0,
            "std_deviation_bounds": {"upper": 4.0, "lower": 0.0}
        }));
        let Some(Aggregate::ExtendedStats(extended)) = extended else {
            panic!("expected extended stats");
        };
        assert_eq!(extended.std_deviation_bounds.unwrap().upper, Some(4.0));

        let empty = decode(json!({"count": 0, "min": null, "max": null, "avg": null, "sum": 0.0}));
        assert!(matches!(empty, Some(Aggregate::Stats(StatsAggregate { min: None, .. }))));
    }

    #[test]
    fn test_percentiles_object_and_array_forms() {
        let keyed = decode(json!({"values": {"99.0": 9.0, "1.0": 1.0, "1.0_as_string": "1"}}));
        let Some(Aggregate::Percentiles(keyed)) = keyed else {
            panic!("expected percentiles");
        };
        assert_eq!(keyed.items.len(), 2);
        assert_eq!(keyed.items[0].percentile, 1.0);
        assert_eq!(keyed.items[0].value_as_string.as_deref(), Some("1"));
        assert_eq!(keyed.percentile(99.0), Some(9.0));

        let listed = decode(json!({"values": [{"key": 50.0, "value": 5.0}]}));
        let Some(Aggregate::Percentiles(listed)) = listed else {
            panic!("expected percentiles");
        };
        assert_eq!(listed.percentile(50.0), Some(5.0));
    }

    #[test]
    fn test_geo_shapes() {
        let bounds = decode(json!({"bounds": {
            "top_left": {"lat": 48.8, "lon": 2.2},
            "bottom_right": {"lat": 48.7, "lon": 2.4}
        }}));
        assert!(matches!(bounds, Some(Aggregate::GeoBounds(GeoBoundsAggregate { bounds: Some(_), .. }))));

        let centroid = decode(json!({"location": {"lat": 1.0, "lon": 2.0}, "count": 3}));
        assert!(matches!(centroid, Some(Aggregate::GeoCentroid(GeoCentroidAggregate { count: 3, .. }))));

        let line = decode(json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[1.0, 2.0], [3.0, 4.0]]},
            "properties": {"complete": true, "sort_values": [1.0, 2.0]}
        }));
        let Some(Aggregate::GeoLine(line)) = line else {
            panic!("expected geo line");
        };
        assert_eq!(line.geometry.coordinates.len(), 2);
        assert!(line.properties.complete);
    }

    #[test]
    fn test_lone_count_is_geo_centroid() {
        assert!(matches!(
            decode(json!({"count": 0})),
            Some(Aggregate::GeoCentroid(GeoCentroidAggregate { location: None, count: 0, .. }))
        ));
    }

    #[test]
    fn test_typed_geo_centroid_accepts_empty_result() {
        let aggs = map(json!({"geo_centroid#center": {}}));
        assert!(aggs.geo_centroid("center").is_some());
    }

    #[test]
    fn test_typed_scripted_metric_keeps_numeric_value() {
        let aggs = map(json!({"scripted_metric#profit": {"value": 12.5}}));
        assert!(matches!(aggs.get("profit"), Some(Aggregate::ScriptedMetric(_))));
    }

    #[test]
    fn test_unknown_type_falls_back_to_shape_detection() {
        let aggs = map(json!({"brand_new_agg#thing": {"value": 1.0}}));
        assert!(matches!(aggs.get("thing"), Some(Aggregate::Value(_))));
    }

    #[test]
    fn test_rejected_dedicated_decoder_falls_back() {
        let aggs = map(json!({"geo_line#route": {"value": 2.0}}));
        assert!(matches!(aggs.get("route"), Some(Aggregate::Value(_))));
    }

    #[test]
    fn test_top_hits() {
        let hits = decode(json!({"hits": {
            "total": {"value": 1, "relation": "eq"},
            "max_score": 1.0,
            "hits": [{"_index": "i", "_id": "1", "_score": 1.0, "_source": {"a": 1}}]
        }}));
        let Some(Aggregate::TopHits(hits)) = hits else {
            panic!("expected top hits");
        };
        assert_eq!(hits.hits.len(), 1);
        assert_eq!(hits.total.unwrap().value, 1);
    }

    #[test]
    fn test_matrix_stats_wins_over_single_bucket() {
        let matrix = decode(json!({
            "doc_count": 50,
            "fields": [{"name": "income", "count": 50, "mean": 1.0, "variance": 2.0,
                        "skewness": 0.1, "kurtosis": 3.0,
                        "covariance": {"income": 2.0}, "correlation": {"income": 1.0}}]
        }));
        let Some(Aggregate::MatrixStats(matrix)) = matrix else {
            panic!("expected matrix stats");
        };
        assert_eq!(matrix.doc_count, 50);
        assert_eq!(matrix.fields[0].name, "income");
    }

    #[test]
    fn test_doc_count_wins_over_sub_aggregation_names() {
        let single = decode(json!({
            "doc_count": 3,
            "value": {"value": 1.0},
            "hits": {"hits": {"hits": []}},
            "typed#count": {"value": 2.0}
        }));
        let Some(Aggregate::SingleBucket(single)) = single else {
            panic!("expected single bucket");
        };
        assert_eq!(single.doc_count, 3);
        assert!(matches!(single.aggregations.get("value"), Some(Aggregate::Value(_))));
        assert!(matches!(single.aggregations.get("hits"), Some(Aggregate::TopHits(_))));
        assert!(matches!(single.aggregations.get("count"), Some(Aggregate::Value(_))));
    }

    #[test]
    fn test_buckets_win_over_doc_count() {
        let significant = decode(json!({
            "doc_count": 47, "bg_count": 5000,
            "buckets": [{"key": "x", "doc_count": 5, "score": 0.5, "bg_count": 6}]
        }));
        let Some(Aggregate::Bucket(bucket)) = significant else {
            panic!("expected bucket aggregate");
        };
        assert_eq!(bucket.doc_count, Some(47));
        assert_eq!(bucket.bg_count, Some(5000));
        assert!(matches!(bucket.items[0], BucketItem::SignificantTerms(_)));
    }

    #[test]
    fn test_after_key_without_buckets() {
        let composite = decode(json!({"after_key": {"a": 1}}));
        let Some(Aggregate::Bucket(bucket)) = composite else {
            panic!("expected bucket aggregate");
        };
        assert!(bucket.items.is_empty());
        assert_eq!(bucket.after_key.unwrap().get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_bucket_item_shapes() {
        let aggregate = decode(json!({"buckets": [
            {"key": {"a": 1}, "doc_count": 1},
            {"key": "*-10.0", "to": 10.0, "doc_count": 2},
            {"key": "10.0.0.0/25", "from": "10.0.0.0", "to": "10.0.0.128", "doc_count": 3},
            {"key": 5.0, "min": 1.0, "max": 9.0, "doc_count": 4},
            {"key": "sig", "doc_count": 5, "bg_count": 9, "score": 0.3},
            {"key": "term", "doc_count": 6},
            {"doc_count": 7},
            {"nothing": true},
            12
        ]}));
        let Some(Aggregate::Bucket(bucket)) = aggregate else {
            panic!("expected bucket aggregate");
        };
        let kinds: Vec<&str> = bucket
            .items
            .iter()
            .map(|item| match item {
                BucketItem::Composite(_) => "composite",
                BucketItem::Range(_) => "range",
                BucketItem::IpRange(_) => "ip_range",
                BucketItem::VariableWidthHistogram(_) => "variable_width",
                BucketItem::SignificantTerms(_) => "significant",
                BucketItem::Keyed(_) => "keyed",
                BucketItem::Filters(_) => "filters",
            })
            .collect();
        assert_eq!(
            kinds,
            ["composite", "range", "ip_range", "variable_width", "significant", "keyed", "filters"]
        );
    }

    #[test]
    fn test_sub_aggregation_named_like_a_field_does_not_change_bucket_shape() {
        let aggregate = decode(json!({"buckets": [
            {"key": "a", "doc_count": 1, "to": {"value": 3.0}, "min": {"value": 1.0}, "max": {"value": 2.0}}
        ]}));
        let Some(Aggregate::Bucket(bucket)) = aggregate else {
            panic!("expected bucket aggregate");
        };
        let BucketItem::Keyed(keyed) = &bucket.items[0] else {
            panic!("expected keyed bucket");
        };
        assert_eq!(keyed.aggregations.len(), 3);
    }

    #[test]
    fn test_keyed_filters() {
        let aggregate = decode(json!({"buckets": {
            "errors": {"doc_count": 34, "monthly": {"buckets": []}},
            "warnings": {"doc_count": 439}
        }}));
        let Some(Aggregate::Filters(filters)) = aggregate else {
            panic!("expected filters");
        };
        assert_eq!(filters.named_bucket("errors").unwrap().doc_count, 34);
        assert_eq!(filters.buckets[1].key.as_deref(), Some("warnings"));
        assert!(filters.named_bucket("errors").unwrap().aggregations.contains("monthly"));
    }

    #[test]
    fn test_keyed_ranges_take_name_as_key() {
        let aggregate = decode(json!({"buckets": {
            "cheap": {"to": 100.0, "doc_count": 2},
            "expensive": {"from": 100.0, "doc_count": 1}
        }}));
        let Some(Aggregate::Bucket(bucket)) = aggregate else {
            panic!("expected bucket aggregate");
        };
        let BucketItem::Range(cheap) = &bucket.items[0] else {
            panic!("expected range bucket");
        };
        assert_eq!(cheap.key.as_deref(), Some("cheap"));
        assert_eq!(cheap.to, Some(100.0));
    }

    #[test]
    fn test_empty_keyed_buckets_are_a_bucket_aggregate() {
        let aggs = map(json!({
            "range#prices": {"buckets": {}},
            "date_histogram#per_day": {"buckets": {}}
        }));
        assert_eq!(aggs.get("prices").unwrap().kind(), "bucket");
        assert!(aggs.range("prices").unwrap().buckets.is_empty());
        assert!(aggs.date_histogram("per_day").unwrap().unwrap().buckets.is_empty());
        assert!(aggs.filters("prices").unwrap().buckets.is_empty());
    }

    #[test]
    fn test_doc_count_wins_over_after_key() {
        let aggs = map(json!({"filter#recent": {"doc_count": 4, "after_key": {"value": 1.0}}}));
        assert_eq!(aggs.get("recent").unwrap().kind(), "single_bucket");

        let recent = aggs.filter("recent").unwrap();
        assert_eq!(recent.doc_count, 4);
        assert_eq!(recent.aggregations.get("after_key").unwrap().kind(), "value");
    }

    #[test]
    fn test_bounds_win_over_location() {
        let aggregate = decode(json!({
            "bounds": {"top_left": {"lat": 2.0, "lon": 1.0}, "bottom_right": {"lat": 1.0, "lon": 2.0}},
            "location": {"lat": 1.5, "lon": 1.5}
        }))
        .unwrap();
        assert_eq!(aggregate.kind(), "geo_bounds");
    }

    #[test]
    fn test_hits_win_over_values() {
        let aggregate = decode(json!({
            "hits": {"hits": []},
            "values": {"50.0": 1.0}
        }))
        .unwrap();
        assert_eq!(aggregate.kind(), "top_hits");
    }

    #[test]
    fn test_values_win_over_stats() {
        let aggregate = decode(json!({
            "values": {"50.0": 1.0},
            "count": 2, "min": 1.0, "max": 3.0, "avg": 2.0, "sum": 4.0
        }))
        .unwrap();
        assert_eq!(aggregate.kind(), "percentiles");
    }

    #[test]
    fn test_stats_win_over_value() {
        let aggregate = decode(json!({
            "count": 2, "min": 1.0, "max": 3.0, "avg": 2.0, "sum": 4.0,
            "value": 9.0
        }))
        .unwrap();
        assert_eq!(aggregate.kind(), "stats");
    }
}
