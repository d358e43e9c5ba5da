//! Catalog read models.
//!
//! These mirror what the remote catalog endpoints return: product display
//! data and per-product stock levels. No IO lives here.

pub mod product;
pub mod stock;

pub use product::Product;
pub use stock::StockLevel;
