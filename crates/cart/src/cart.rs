use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcart_catalog::{Product, StockLevel};
use shopcart_core::{Aggregate, DomainError, DomainResult, ProductId};

use crate::line_item::LineItem;

/// Aggregate: the shopping cart.
///
/// Holds at most one line item per product; every amount is at least one.
/// Serialized as a bare JSON array of line items (the revision counter is
/// in-memory only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
    version: u64,
}

impl PartialEq for Cart {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Cart {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a cart from persisted line items, repairing invariant violations.
    ///
    /// Items with a zero amount are dropped and duplicate product ids keep
    /// their first occurrence. Returns the cart and the number of items
    /// discarded.
    pub fn from_persisted(items: Vec<LineItem>) -> (Self, usize) {
        let total = items.len();
        let mut seen = HashSet::with_capacity(total);
        let items: Vec<LineItem> = items
            .into_iter()
            .filter(|item| item.amount >= 1 && seen.insert(item.product_id()))
            .collect();
        let dropped = total - items.len();
        (Self { items, version: 0 }, dropped)
    }

    /// Parse a persisted cart blob one element at a time.
    ///
    /// Fails only when the blob is not a JSON array. Elements that are not
    /// line items (missing fields, negative amounts) are dropped along with
    /// whatever [`Cart::from_persisted`] drops.
    pub fn from_persisted_json(raw: &str) -> serde_json::Result<(Self, usize)> {
        let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
        let total = values.len();
        let items: Vec<LineItem> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        let unparsed = total - items.len();
        let (cart, dropped) = Self::from_persisted(items);
        Ok((cart, unparsed + dropped))
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id() == product_id)
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Number of distinct line items (what a cart badge shows).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all amounts.
    pub fn total_units(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all line item subtotals.
    pub fn total_price(&self) -> f64 {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Amount in cart keyed by product, for product listings.
    pub fn amounts_by_product(&self) -> BTreeMap<ProductId, u32> {
        self.items
            .iter()
            .map(|item| (item.product_id(), item.amount))
            .collect()
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.product_id() == product_id)
    }
}

impl From<Vec<LineItem>> for Cart {
    fn from(items: Vec<LineItem>) -> Self {
        Self::from_persisted(items).0
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

/// Command: AddProduct.
///
/// `stock` is required when the product is already in the cart (the add
/// becomes an increment that must be validated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddProduct {
    pub product: Product,
    pub stock: Option<StockLevel>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveProduct {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateAmount.
///
/// `stock` may be omitted only when `amount` is already known to be invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAmount {
    pub product_id: ProductId,
    pub amount: i64,
    pub stock: Option<StockLevel>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ClearCart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCart {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CartCommand {
    AddProduct(AddProduct),
    RemoveProduct(RemoveProduct),
    UpdateAmount(UpdateAmount),
    ClearCart(ClearCart),
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub item: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AmountChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountChanged {
    pub product_id: ProductId,
    pub amount: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CartCleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCleared {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CartEvent {
    ItemAdded(ItemAdded),
    AmountChanged(AmountChanged),
    ItemRemoved(ItemRemoved),
    CartCleared(CartCleared),
}

impl CartEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CartEvent::ItemAdded(_) => "cart.item.added",
            CartEvent::AmountChanged(_) => "cart.item.amount_changed",
            CartEvent::ItemRemoved(_) => "cart.item.removed",
            CartEvent::CartCleared(_) => "cart.cleared",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CartEvent::ItemAdded(e) => e.occurred_at,
            CartEvent::AmountChanged(e) => e.occurred_at,
            CartEvent::ItemRemoved(e) => e.occurred_at,
            CartEvent::CartCleared(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Cart {
    type Command = CartCommand;
    type Event = CartEvent;
    type Error = DomainError;

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CartEvent::ItemAdded(e) => {
                // Uniqueness is decided in `handle`; replaying an add for a
                // present product replaces it rather than duplicating it.
                match self.position(e.item.product_id()) {
                    Some(idx) => self.items[idx] = e.item.clone(),
                    None => self.items.push(e.item.clone()),
                }
            }
            CartEvent::AmountChanged(e) => {
                if let Some(idx) = self.position(e.product_id) {
                    self.items[idx].amount = e.amount;
                }
            }
            CartEvent::ItemRemoved(e) => {
                self.items.retain(|item| item.product_id() != e.product_id);
            }
            CartEvent::CartCleared(_) => {
                self.items.clear();
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CartCommand::AddProduct(cmd) => self.handle_add(cmd),
            CartCommand::RemoveProduct(cmd) => Ok(self.handle_remove(cmd)),
            CartCommand::UpdateAmount(cmd) => self.handle_update(cmd),
            CartCommand::ClearCart(cmd) => Ok(self.handle_clear(cmd)),
        }
    }
}

impl Cart {
    fn ensure_stock_for(
        &self,
        product_id: ProductId,
        stock: Option<StockLevel>,
    ) -> DomainResult<StockLevel> {
        let stock = stock.ok_or_else(|| {
            DomainError::invariant(format!("stock level for product {product_id} is required"))
        })?;
        if stock.id != product_id {
            return Err(DomainError::invariant(format!(
                "stock level for product {} does not belong to product {product_id}",
                stock.id
            )));
        }
        Ok(stock)
    }

    fn checked_amount(requested: i64, stock: &StockLevel) -> DomainResult<u32> {
        if requested < 1 {
            return Err(DomainError::validation("amount must be at least 1"));
        }
        if !stock.allows(requested) {
            return Err(DomainError::out_of_stock(requested, stock.amount));
        }
        u32::try_from(requested)
            .map_err(|_| DomainError::validation(format!("amount {requested} is too large")))
    }

    fn handle_add(&self, cmd: &AddProduct) -> DomainResult<Vec<CartEvent>> {
        let product_id = cmd.product.id;

        let Some(existing) = self.get(product_id) else {
            return Ok(vec![CartEvent::ItemAdded(ItemAdded {
                item: LineItem::new(cmd.product.clone(), 1),
                occurred_at: cmd.occurred_at,
            })]);
        };

        let stock = self.ensure_stock_for(product_id, cmd.stock)?;
        let amount = Self::checked_amount(i64::from(existing.amount) + 1, &stock)?;

        Ok(vec![CartEvent::AmountChanged(AmountChanged {
            product_id,
            amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveProduct) -> Vec<CartEvent> {
        if !self.contains(cmd.product_id) {
            return Vec::new();
        }
        vec![CartEvent::ItemRemoved(ItemRemoved {
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })]
    }

    fn handle_update(&self, cmd: &UpdateAmount) -> DomainResult<Vec<CartEvent>> {
        if cmd.amount < 1 {
            return Err(DomainError::validation("amount must be at least 1"));
        }

        let existing = self.get(cmd.product_id).ok_or_else(DomainError::not_found)?;
        let stock = self.ensure_stock_for(cmd.product_id, cmd.stock)?;
        let amount = Self::checked_amount(cmd.amount, &stock)?;

        if amount == existing.amount {
            return Ok(Vec::new());
        }

        Ok(vec![CartEvent::AmountChanged(AmountChanged {
            product_id: cmd.product_id,
            amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_clear(&self, cmd: &ClearCart) -> Vec<CartEvent> {
        if self.is_empty() {
            return Vec::new();
        }
        vec![CartEvent::CartCleared(CartCleared {
            occurred_at: cmd.occurred_at,
        })]
    }
}
