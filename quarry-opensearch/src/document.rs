//! Document trait.

use serde::{Serialize, de::DeserializeOwned};

/// A document type stored in a known index.
///
/// # Example
///
/// ```rust
/// use quarry_opensearch::Document;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Product {
///     name: String,
///     price: f64,
///     category: String,
/// }
///
/// impl Document for Product {
///     fn index_name() -> &'static str {
///         "products"
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Returns the default index name for this document type.
    fn index_name() -> &'static str;
}
