//! Untyped bucket keys and their conversion into caller-requested key types.
//!
//! Bucket keys arrive from the wire as strings, numbers, booleans or (for
//! `multi_terms`) arrays of those. They are stored untyped as [`BucketKey`]
//! and only converted when a typed accessor such as
//! [`AggregateMap::terms`](super::AggregateMap::terms) asks for a concrete
//! key type through [`FromBucketKey`].

use crate::error::{OpenSearchError, Result};
use serde_json::Value;
use std::fmt;

/// A bucket key as decoded from JSON, before any re-typing.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketKey {
    /// String key (keyword terms, geohash cells, range names, ...).
    String(String),
    /// Integral numeric key.
    Long(i64),
    /// Floating point numeric key (histograms, dates as epoch millis).
    Double(f64),
    /// Boolean key.
    Boolean(bool),
    /// Ordered composite key produced by `multi_terms`.
    Multi(Vec<BucketKey>),
}

impl BucketKey {
    /// Build a key from a JSON value. Objects and `null` are not keys.
    pub(crate) fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Long(i)),
                None => n.as_f64().map(Self::Double),
            },
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Self::Multi),
            Value::Null | Value::Object(_) => None,
        }
    }

    /// Returns true for `multi_terms` keys.
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// The key as a string slice, if it is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Long(n) => write!(f, "{}", n),
            Self::Double(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Multi(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Conversion from an untyped [`BucketKey`] into a concrete key type.
///
/// Every key-re-typing accessor goes through this trait, so conversion
/// failures surface the same way everywhere: as
/// [`OpenSearchError::KeyConversion`]. There is no silent fallback to a
/// default value.
///
/// Enumerations implement it with [`bucket_key_enum!`](crate::bucket_key_enum),
/// which matches the key's string form against the variant names
/// case-insensitively.
pub trait FromBucketKey: Sized {
    /// Convert the key.
    fn from_bucket_key(key: &BucketKey) -> Result<Self>;
}

fn composite_key_error(key: &BucketKey, target: &'static str) -> OpenSearchError {
    OpenSearchError::key_conversion(key, target, "composite keys cannot be converted to a scalar")
}

impl FromBucketKey for BucketKey {
    fn from_bucket_key(key: &BucketKey) -> Result<Self> {
        Ok(key.clone())
    }
}

impl FromBucketKey for String {
    fn from_bucket_key(key: &BucketKey) -> Result<Self> {
        match key {
            BucketKey::Multi(_) => Err(composite_key_error(key, "String")),
            other => Ok(other.to_string()),
        }
    }
}

impl FromBucketKey for bool {
    fn from_bucket_key(key: &BucketKey) -> Result<Self> {
        match key {
            BucketKey::Boolean(b) => Ok(*b),
            BucketKey::Long(n) => Ok(*n != 0),
            BucketKey::Double(n) => Ok(*n != 0.0),
            BucketKey::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(OpenSearchError::key_conversion(key, "bool", "not a boolean"))
                }
            }
            BucketKey::Multi(_) => Err(composite_key_error(key, "bool")),
        }
    }
}

macro_rules! integer_bucket_key {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromBucketKey for $ty {
                fn from_bucket_key(key: &BucketKey) -> Result<Self> {
                    let target = stringify!($ty);
                    match key {
                        BucketKey::Long(n) => <$ty>::try_from(*n).map_err(|_| {
                            OpenSearchError::key_conversion(key, target, "value out of range")
                        }),
                        BucketKey::Double(n) => {
                            let rounded = n.round_ties_even();
                            if rounded.is_finite()
                                && rounded >= <$ty>::MIN as f64
                                && rounded < <$ty>::MAX as f64 + 1.0
                            {
                                Ok(rounded as $ty)
                            } else {
                                Err(OpenSearchError::key_conversion(key, target, "value out of range"))
                            }
                        }
                        BucketKey::String(s) => s
                            .trim()
                            .parse::<$ty>()
                            .map_err(|e| OpenSearchError::key_conversion(key, target, e.to_string())),
                        BucketKey::Boolean(b) => Ok(<$ty>::from(*b)),
                        BucketKey::Multi(_) => Err(composite_key_error(key, target)),
                    }
                }
            }
        )+
    };
}

integer_bucket_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! float_bucket_key {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromBucketKey for $ty {
                fn from_bucket_key(key: &BucketKey) -> Result<Self> {
                    let target = stringify!($ty);
                    match key {
                        BucketKey::Long(n) => Ok(*n as $ty),
                        BucketKey::Double(n) => Ok(*n as $ty),
                        BucketKey::String(s) => s
                            .trim()
                            .parse::<$ty>()
                            .map_err(|e| OpenSearchError::key_conversion(key, target, e.to_string())),
                        BucketKey::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
                        BucketKey::Multi(_) => Err(composite_key_error(key, target)),
                    }
                }
            }
        )+
    };
}

float_bucket_key!(f32, f64);

/// Convert every element of a composite key, preserving order.
pub(crate) fn convert_multi<K: FromBucketKey>(key: &BucketKey) -> Result<Vec<K>> {
    match key {
        BucketKey::Multi(items) => items.iter().map(K::from_bucket_key).collect(),
        other => Ok(vec![K::from_bucket_key(other)?]),
    }
}

/// Implement [`FromBucketKey`] for a fieldless enum.
///
/// The key's string form is matched against the listed variant names
/// ignoring ASCII case and surrounding whitespace.
///
/// ```rust
/// use quarry_opensearch::bucket_key_enum;
///
/// #[derive(Debug, PartialEq)]
/// enum Color {
///     Red,
///     Blue,
/// }
///
/// bucket_key_enum!(Color { Red, Blue });
/// ```
#[macro_export]
macro_rules! bucket_key_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::aggregations::FromBucketKey for $ty {
            fn from_bucket_key(
                key: &$crate::aggregations::BucketKey,
            ) -> $crate::Result<Self> {
                if key.is_multi() {
                    return Err($crate::OpenSearchError::KeyConversion {
                        key: key.to_string(),
                        target: stringify!($ty),
                        reason: "composite keys cannot be converted to a scalar".to_string(),
                    });
                }
                let name = key.to_string();
                let name = name.trim();
                $(
                    if name.eq_ignore_ascii_case(stringify!($variant)) {
                        return Ok($ty::$variant);
                    }
                )+
                Err($crate::OpenSearchError::KeyConversion {
                    key: key.to_string(),
                    target: stringify!($ty),
                    reason: "no variant with this name".to_string(),
                })
            }
        }
    };
}
