//! `shopcart-core` - domain building blocks shared by the cart workspace.
//!
//! This crate contains **pure domain** primitives (no IO, no HTTP, no storage).

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::Aggregate;
pub use error::{DomainError, DomainResult};
pub use id::ProductId;
