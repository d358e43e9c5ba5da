//! Storefront client configuration (environment driven).

use std::path::PathBuf;

/// Catalog API used when `SHOPCART_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:3333";

/// Persistence key holding the serialized cart.
pub const DEFAULT_CART_KEY: &str = "@shopcart:cart";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Base URL of the catalog API (`{api_url}/products/{id}`, `{api_url}/stock/{id}`).
    pub api_url: String,
    /// Optional bearer token sent with catalog requests.
    pub auth_token: Option<String>,
    /// SQLite file backing the persistence slot. `None` uses the OS data dir.
    pub storage_path: Option<PathBuf>,
    pub cart_key: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            storage_path: None,
            cart_key: DEFAULT_CART_KEY.to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Read configuration from the process environment.
    ///
    /// - `SHOPCART_API_URL`
    /// - `SHOPCART_AUTH_TOKEN`
    /// - `SHOPCART_STORAGE_PATH`
    /// - `SHOPCART_CART_KEY`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        Self {
            api_url: get("SHOPCART_API_URL").unwrap_or(defaults.api_url),
            auth_token: get("SHOPCART_AUTH_TOKEN"),
            storage_path: get("SHOPCART_STORAGE_PATH").map(PathBuf::from),
            cart_key: get("SHOPCART_CART_KEY").unwrap_or(defaults.cart_key),
        }
    }
}
