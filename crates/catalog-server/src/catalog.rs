//! In-memory catalog loaded from a db file.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use shopcart_catalog::{Product, StockLevel};
use shopcart_core::ProductId;

/// On-disk shape: `{"products": [...], "stock": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDb {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub stock: Vec<StockLevel>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate product id {0}")]
    DuplicateProduct(ProductId),
    #[error("duplicate stock entry for product {0}")]
    DuplicateStock(ProductId),
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: BTreeMap<ProductId, Product>,
    stock: BTreeMap<ProductId, StockLevel>,
}

impl Catalog {
    pub fn from_db(db: CatalogDb) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for product in db.products {
            let id = product.id;
            if catalog.products.insert(id, product).is_some() {
                return Err(CatalogError::DuplicateProduct(id));
            }
        }

        for level in db.stock {
            if catalog.stock.insert(level.id, level).is_some() {
                return Err(CatalogError::DuplicateStock(level.id));
            }
        }

        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog db at {path:?}"))?;
        let db: CatalogDb = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse catalog db at {path:?}"))?;
        Ok(Self::from_db(db)?)
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn stock(&self, id: ProductId) -> Option<&StockLevel> {
        self.stock.get(&id)
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn stock_levels(&self) -> impl Iterator<Item = &StockLevel> {
        self.stock.values()
    }
}
