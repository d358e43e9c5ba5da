//! Catalog fixture server: the product and stock endpoints the cart talks to,
//! served from a json-server style db file.

pub mod app;
pub mod catalog;

pub use app::build_app;
pub use catalog::{Catalog, CatalogDb, CatalogError};
