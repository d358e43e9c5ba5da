//! The cart store: in-memory cart, persistence slot, and stock validation.
//!
//! Every operation follows the same shape:
//!
//! 1. fetch whatever the decision needs from the catalog (no lock held),
//! 2. under the cart lock, decide against the *current* cart,
//! 3. commit the resulting cart to storage, then swap it in.
//!
//! A rejected or failed operation never reaches step 3, so storage and memory
//! only ever hold carts produced by accepted changes.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use shopcart_cart::{AddProduct, Cart, CartCommand, ClearCart, RemoveProduct, UpdateAmount};
use shopcart_catalog::{Product, StockLevel};
use shopcart_core::{Aggregate, DomainError, ProductId};

use crate::api::{ApiError, CatalogApi, HttpCatalogApi};
use crate::config::StorefrontConfig;
use crate::notice::{Notice, Notifier};
use crate::storage::{CartStorage, SqliteStorage};

/// What happened to a cart operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CartOutcome {
    /// The cart changed and was committed.
    Applied,
    /// Nothing to do (absent product, same amount, empty cart).
    Unchanged,
    /// The change was refused; the notice has already been shown.
    Rejected(Notice),
}

impl CartOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CartOutcome::Applied)
    }
}

/// Internal failure of a cart operation, mapped to a [`Notice`] at the
/// operation boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn notice(&self, fallback: Notice) -> Notice {
        match self {
            StoreError::Domain(err) if err.is_amount_rejection() => Notice::OutOfStock,
            _ => fallback,
        }
    }
}

struct Inner {
    api: Arc<dyn CatalogApi>,
    storage: Arc<dyn CartStorage>,
    notifier: Arc<dyn Notifier>,
    key: String,
    cart: Mutex<Cart>,
}

/// Injectable cart handle. Clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Inner>,
}

impl core::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.inner.key)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restore the cart persisted under `key` (empty if the key is missing).
    ///
    /// A blob that does not parse is discarded with a warning; the next
    /// commit overwrites it.
    pub async fn load(
        api: Arc<dyn CatalogApi>,
        storage: Arc<dyn CartStorage>,
        notifier: Arc<dyn Notifier>,
        key: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let key = key.into();
        let cart = read_cart(storage.as_ref(), &key).await?;

        tracing::info!(key = %key, items = cart.len(), "cart loaded");

        Ok(Self {
            inner: Arc::new(Inner {
                api,
                storage,
                notifier,
                key,
                cart: Mutex::new(cart),
            }),
        })
    }

    /// Wire the HTTP catalog client and SQLite slot described by `config`.
    pub async fn open(
        config: &StorefrontConfig,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let api: Arc<dyn CatalogApi> = match &config.auth_token {
            Some(token) => Arc::new(HttpCatalogApi::with_token(&config.api_url, token)),
            None => Arc::new(HttpCatalogApi::new(&config.api_url)),
        };
        let storage: Arc<dyn CartStorage> = match &config.storage_path {
            Some(path) => Arc::new(SqliteStorage::at(path)),
            None => Arc::new(SqliteStorage::open_default()?),
        };

        Self::load(api, storage, notifier, config.cart_key.clone()).await
    }

    /// Copy of the current cart.
    pub async fn snapshot(&self) -> Cart {
        self.inner.cart.lock().await.clone()
    }

    /// Add one unit of a product.
    ///
    /// A product not yet in the cart is inserted with amount 1. A product
    /// already present is incremented only if stock allows it.
    pub async fn add_product(&self, product_id: ProductId) -> CartOutcome {
        let result = self.try_add_product(product_id).await;
        self.finish("add_product", product_id, result, Notice::AddFailed)
    }

    /// Remove a product's line item. Removing an absent product is a no-op.
    pub async fn remove_product(&self, product_id: ProductId) -> CartOutcome {
        let command = CartCommand::RemoveProduct(RemoveProduct {
            product_id,
            occurred_at: Utc::now(),
        });
        let result = self.commit(&command).await;
        self.finish("remove_product", product_id, result, Notice::RemoveFailed)
    }

    /// Set a product's amount after validating it against remote stock.
    ///
    /// Amounts below one are refused without asking the catalog. Updating a
    /// product that is not in the cart is a no-op.
    pub async fn update_product_amount(&self, product_id: ProductId, amount: i64) -> CartOutcome {
        let result = match self.try_update_amount(product_id, amount).await {
            // Removed while the stock request was in flight.
            Err(StoreError::Domain(DomainError::NotFound)) => Ok(false),
            other => other,
        };
        self.finish("update_product_amount", product_id, result, Notice::UpdateFailed)
    }

    /// Empty the cart.
    pub async fn clear(&self) -> anyhow::Result<bool> {
        let command = CartCommand::ClearCart(ClearCart {
            occurred_at: Utc::now(),
        });
        self.commit(&command).await.map_err(anyhow::Error::new)
    }

    /// Write the current cart to storage.
    pub async fn save(&self) -> anyhow::Result<()> {
        let cart = self.inner.cart.lock().await;
        self.write(&cart).await.map_err(anyhow::Error::new)
    }

    /// Replace the in-memory cart with what storage holds.
    pub async fn reload(&self) -> anyhow::Result<()> {
        let mut cart = self.inner.cart.lock().await;
        *cart = read_cart(self.inner.storage.as_ref(), &self.inner.key).await?;
        Ok(())
    }

    async fn try_add_product(&self, product_id: ProductId) -> Result<bool, StoreError> {
        let product = self.inner.api.product(product_id).await?;

        let in_cart = self.inner.cart.lock().await.contains(product_id);
        let stock = if in_cart {
            Some(self.inner.api.stock(product_id).await?)
        } else {
            None
        };

        match self.commit(&add_command(product.clone(), stock)).await {
            // Added by a concurrent operation after the check; retry once as
            // an increment.
            Err(StoreError::Domain(DomainError::InvariantViolation(_))) if stock.is_none() => {
                let stock = self.inner.api.stock(product_id).await?;
                self.commit(&add_command(product, Some(stock))).await
            }
            other => other,
        }
    }

    async fn try_update_amount(&self, product_id: ProductId, amount: i64) -> Result<bool, StoreError> {
        if !self.inner.cart.lock().await.contains(product_id) {
            return Ok(false);
        }

        let stock = if amount < 1 {
            None
        } else {
            Some(self.inner.api.stock(product_id).await?)
        };

        self.commit(&CartCommand::UpdateAmount(UpdateAmount {
            product_id,
            amount,
            stock,
            occurred_at: Utc::now(),
        }))
        .await
    }

    /// Decide against the current cart and commit the result.
    ///
    /// Returns `Ok(false)` when the command produced no events; storage is
    /// not touched in that case.
    async fn commit(&self, command: &CartCommand) -> Result<bool, StoreError> {
        let mut cart = self.inner.cart.lock().await;

        let mut next = cart.clone();
        let events = next.execute(command)?;
        if events.is_empty() {
            return Ok(false);
        }

        self.write(&next).await?;

        for event in &events {
            tracing::info!(
                event_type = event.event_type(),
                occurred_at = %event.occurred_at(),
                version = next.version(),
                items = next.len(),
                "cart changed"
            );
        }

        *cart = next;
        Ok(true)
    }

    async fn write(&self, cart: &Cart) -> Result<(), StoreError> {
        let payload = serde_json::to_string(cart)?;
        self.inner
            .storage
            .set_item(&self.inner.key, &payload)
            .await
            .map_err(StoreError::Storage)
    }

    fn finish(
        &self,
        operation: &'static str,
        product_id: ProductId,
        result: Result<bool, StoreError>,
        fallback: Notice,
    ) -> CartOutcome {
        match result {
            Ok(true) => CartOutcome::Applied,
            Ok(false) => CartOutcome::Unchanged,
            Err(err) => {
                let notice = err.notice(fallback);
                tracing::warn!(operation, product_id = %product_id, error = %err, "cart operation rejected");
                self.inner.notifier.notify(notice);
                CartOutcome::Rejected(notice)
            }
        }
    }
}

fn add_command(product: Product, stock: Option<StockLevel>) -> CartCommand {
    CartCommand::AddProduct(AddProduct {
        product,
        stock,
        occurred_at: Utc::now(),
    })
}

async fn read_cart(storage: &dyn CartStorage, key: &str) -> anyhow::Result<Cart> {
    let Some(raw) = storage.get_item(key).await? else {
        return Ok(Cart::empty());
    };

    match Cart::from_persisted_json(&raw) {
        Ok((cart, dropped)) => {
            if dropped > 0 {
                tracing::warn!(key = %key, dropped, "dropped invalid line items from persisted cart");
            }
            Ok(cart)
        }
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "persisted cart is unreadable; starting empty");
            Ok(Cart::empty())
        }
    }
}
