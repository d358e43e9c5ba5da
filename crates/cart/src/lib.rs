//! Cart domain module.
//!
//! Business rules for the shopping cart, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage). Catalog and stock data are
//! fetched by the caller and handed in through commands.

pub mod cart;
pub mod line_item;

pub use cart::{
    AddProduct, AmountChanged, Cart, CartCleared, CartCommand, CartEvent, ClearCart, ItemAdded,
    ItemRemoved, RemoveProduct, UpdateAmount,
};
pub use line_item::LineItem;
