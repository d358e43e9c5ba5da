//! `shopcart-storefront`
//!
//! **Responsibility:** client-side cart state for a storefront.
//!
//! This crate provides:
//! - `CartStore`: the injectable cart object (add/remove/update, explicit save)
//! - a persistence slot (`CartStorage`) holding the serialized cart
//! - a catalog client (`CatalogApi`) for product data and stock levels
//! - user-facing notices (`Notice`, `Notifier`)
//!
//! The remote catalog stays the authority on stock; the cart only validates
//! against it before an amount grows.

pub mod api;
pub mod config;
pub mod notice;
pub mod storage;
pub mod store;

pub use api::{ApiError, CatalogApi, HttpCatalogApi};
pub use config::StorefrontConfig;
pub use notice::{Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use storage::{CartStorage, MemoryStorage, SqliteStorage};
pub use store::{CartOutcome, CartStore, StoreError};
