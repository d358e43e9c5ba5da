use serde::{Deserialize, Serialize};

use shopcart_core::ProductId;

/// Stock level as served by `GET stock/{id}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub id: ProductId,
    /// Units available. The endpoint reports a plain integer.
    pub amount: i64,
}

impl StockLevel {
    pub fn new(id: ProductId, amount: i64) -> Self {
        Self { id, amount }
    }

    /// An amount is valid iff it is at least one and does not exceed stock.
    pub fn allows(&self, requested: i64) -> bool {
        requested >= 1 && requested <= self.amount
    }
}
