//! Catalog API client: product data and stock levels.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use shopcart_catalog::{Product, StockLevel};
use shopcart_core::ProductId;

/// Remote catalog as seen by the cart.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET products/{id}`.
    async fn product(&self, id: ProductId) -> Result<Product, ApiError>;

    /// `GET stock/{id}`.
    async fn stock(&self, id: ProductId) -> Result<StockLevel, ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// The stock endpoint only promises an integer `amount`.
#[derive(Debug, Deserialize)]
struct StockPayload {
    amount: i64,
}

/// `reqwest`-backed catalog client.
#[derive(Debug, Clone)]
pub struct HttpCatalogApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpCatalogApi {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(api_url)
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        let url = format!("{}/health", self.api_url);
        matches!(self.client.get(&url).send().await, Ok(resp) if resp.status().is_success())
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.api_url, path);
        let mut req = self.client.get(&url);

        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ApiError::Api(
                resp.status().as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let product: Product = self.get_json(&format!("products/{id}")).await?;
        tracing::debug!(product_id = %id, title = %product.title, "fetched product");
        Ok(product)
    }

    async fn stock(&self, id: ProductId) -> Result<StockLevel, ApiError> {
        let payload: StockPayload = self.get_json(&format!("stock/{id}")).await?;
        tracing::debug!(product_id = %id, amount = payload.amount, "fetched stock level");
        Ok(StockLevel::new(id, payload.amount))
    }
}
