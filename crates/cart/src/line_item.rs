use serde::{Deserialize, Serialize};

use shopcart_catalog::Product;
use shopcart_core::ProductId;

/// A product plus the amount of it in the cart.
///
/// Serialized flat: the catalog fields and `amount` share one JSON object,
/// which is the shape of each element of the persisted cart array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

impl LineItem {
    pub fn new(product: Product, amount: u32) -> Self {
        Self { product, amount }
    }

    pub fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// `price * amount`.
    pub fn subtotal(&self) -> f64 {
        self.product.price * f64::from(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_flat() {
        let item = LineItem::new(
            Product::new(ProductId::new(1), "Running shoe", 100.0).with_image("shoe.jpg"),
            2,
        );
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "id": 1,
                "title": "Running shoe",
                "price": 100.0,
                "image": "shoe.jpg",
                "amount": 2
            })
        );
    }

    #[test]
    fn amount_is_not_captured_as_extra_catalog_field() {
        let item: LineItem = serde_json::from_value(json!({
            "id": 5,
            "title": "Boot",
            "price": 10.0,
            "image": "",
            "color": "red",
            "amount": 3
        }))
        .unwrap();
        assert_eq!(item.amount, 3);
        assert!(!item.product.extra.contains_key("amount"));
        assert_eq!(item.product.extra.get("color"), Some(&json!("red")));
    }

    #[test]
    fn subtotal_multiplies_price_by_amount() {
        let item = LineItem::new(Product::new(ProductId::new(1), "Sock", 2.5), 4);
        assert_eq!(item.subtotal(), 10.0);
    }
}
