//! Product documents as supplied by the acquisition process.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;

lazy_static! {
    static ref PRODUCT_PATH: Regex = Regex::new(r"/product/(\d+)").expect("valid regex");
}

/// Feature key holding the country of origin.
pub const ORIGIN_KEY: &str = "made in";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identity. Records without one are skipped at build time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub product_features: BTreeMap<String, Value>,
    #[serde(default)]
    pub product_reviews: Vec<Review>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    /// Fields the engine does not interpret, kept so the corpus round-trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn title(&self) -> &str { self.title.as_deref().unwrap_or("") }

    pub fn description(&self) -> &str { self.description.as_deref().unwrap_or("") }

    /// Text of a product feature. Non-string JSON values are rendered as JSON text.
    pub fn feature_text(&self, key: &str) -> Option<String> {
        match self.product_features.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Brand from the feature map, falling back to the top-level field.
    pub fn brand_text(&self) -> Option<String> {
        self.feature_text("brand").or_else(|| self.brand.clone())
    }

    pub fn origin(&self) -> Option<String> { self.feature_text(ORIGIN_KEY) }

    /// Merge the URL-embedded product reference into the document.
    pub fn with_product_ref(mut self) -> Self {
        let r = self.url.as_deref().map(ProductRef::parse).unwrap_or_default();
        self.product_id = r.product_id;
        self.variant = r.variant;
        self
    }
}

/// Identifier and variant carried in a product URL, e.g.
/// `https://web-scraping.dev/product/1?variant=orange-small`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductRef {
    pub product_id: Option<String>,
    pub variant: Option<String>,
}

impl ProductRef {
    pub fn parse(raw: &str) -> Self {
        let product_id = PRODUCT_PATH.captures(raw).map(|c| c[1].to_string());
        let variant = match Url::parse(raw) {
            Ok(u) => u.query_pairs().find(|(k, _)| k == "variant").map(|(_, v)| v.into_owned()),
            Err(e) => {
                tracing::debug!(url = raw, error = %e, "unparseable document url");
                None
            }
        };
        Self { product_id, variant }
    }
}
