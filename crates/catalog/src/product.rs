use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shopcart_core::ProductId;

/// Product as served by `GET products/{id}`.
///
/// Unknown catalog fields are kept in `extra` so a line item built from a
/// product round-trips whatever the catalog sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Unit price in the catalog's currency.
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn new(id: ProductId, title: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: String::new(),
            extra: Map::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}
