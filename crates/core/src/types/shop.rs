//! The shop state document: products and a cart.
//!
//! The server keeps the document as untyped JSON and replaces it wholesale on
//! every mutation. [`ShopState`] is the strict, typed reading of that document;
//! [`StateSummary`] is a lenient one that never fails, for logging.

use std::collections::HashSet;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::ProductId;
use super::price::Price;

/// A product offered by the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
}

/// A cart line: a product reference and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Reference to [`Product::id`]. Not guaranteed to resolve.
    pub product: ProductId,
    pub count: NonZeroU32,
}

/// The whole persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopState {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub cart: Vec<LineItem>,
}

impl ShopState {
    /// Parse a state document strictly.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not match the typed shape.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Look up a product by id.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Line items whose product id is not in the product set.
    #[must_use]
    pub fn dangling_line_items(&self) -> Vec<&LineItem> {
        let known: HashSet<ProductId> = self.products.iter().map(|p| p.id).collect();
        self.cart
            .iter()
            .filter(|item| !known.contains(&item.product))
            .collect()
    }

    /// Sum of price times count over all resolvable line items.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.cart
            .iter()
            .filter_map(|item| {
                self.product(item.product)
                    .map(|p| p.price * item.count.get())
            })
            .sum()
    }
}

/// Counts describing a state document, computed without strict parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSummary {
    pub products: usize,
    pub line_items: usize,
    pub units: u64,
    pub dangling: usize,
}

impl StateSummary {
    /// Summarize any JSON value. Missing or oddly shaped fields count as empty.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        let products = value
            .get("products")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice);
        let cart = value
            .get("cart")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice);

        let known: HashSet<&str> = products
            .iter()
            .filter_map(|p| p.get("id").and_then(Value::as_str))
            .collect();

        let units = cart
            .iter()
            .filter_map(|item| item.get("count").and_then(Value::as_u64))
            .fold(0u64, u64::saturating_add);
        let dangling = cart
            .iter()
            .filter(|item| {
                item.get("product")
                    .and_then(Value::as_str)
                    .is_none_or(|id| !known.contains(id))
            })
            .count();

        Self {
            products: products.len(),
            line_items: cart.len(),
            units,
            dangling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHIRT: &str = "6f1c1d5e-3b7a-4d2c-9a55-0e4f8d2b7c11";
    const MUG: &str = "0b9f3a2e-1c4d-4e5f-8a6b-7c8d9e0f1a2b";

    fn sample() -> Value {
        json!({
            "products": [
                { "id": SHIRT, "name": "Shirt", "price": 19.99, "description": "Cotton" },
                { "id": MUG, "name": "Mug", "price": "7.50", "description": "Ceramic" }
            ],
            "cart": [
                { "product": SHIRT, "count": 2 },
                { "product": MUG, "count": 1 }
            ]
        })
    }

    #[test]
    fn test_shop_state_parses_and_totals() {
        let state = ShopState::from_value(&sample()).expect("valid state");
        assert_eq!(state.products.len(), 2);
        assert_eq!(state.cart_total().to_string(), "$47.48");
        assert!(state.dangling_line_items().is_empty());
    }

    #[test]
    fn test_shop_state_rejects_zero_count() {
        let doc = json!({ "products": [], "cart": [{ "product": SHIRT, "count": 0 }] });
        assert!(ShopState::from_value(&doc).is_err());
    }

    #[test]
    fn test_shop_state_rejects_non_uuid_reference() {
        let doc = json!({ "products": [], "cart": [{ "product": "P1", "count": 1 }] });
        assert!(ShopState::from_value(&doc).is_err());
    }

    #[test]
    fn test_dangling_line_items() {
        let doc = json!({ "products": [], "cart": [{ "product": SHIRT, "count": 1 }] });
        let state = ShopState::from_value(&doc).expect("valid state");
        assert_eq!(state.dangling_line_items().len(), 1);
        assert_eq!(state.cart_total(), Price::ZERO);
    }

    #[test]
    fn test_summary_is_lenient() {
        let doc = json!({ "products": [], "cart": [{ "product": "P1", "count": 3 }] });
        let summary = StateSummary::of(&doc);
        assert_eq!(
            summary,
            StateSummary {
                products: 0,
                line_items: 1,
                units: 3,
                dangling: 1,
            }
        );

        assert_eq!(StateSummary::of(&json!("not an object")), StateSummary::default());
    }

    #[test]
    fn test_summary_units_saturate() {
        let doc = json!({
            "products": [],
            "cart": [
                { "product": "A", "count": u64::MAX },
                { "product": "B", "count": 1 }
            ]
        });
        let summary = StateSummary::of(&doc);
        assert_eq!(summary.units, u64::MAX);
        assert_eq!(summary.line_items, 2);
    }

    #[test]
    fn test_summary_of_sample() {
        let summary = StateSummary::of(&sample());
        assert_eq!(summary.products, 2);
        assert_eq!(summary.line_items, 2);
        assert_eq!(summary.units, 3);
        assert_eq!(summary.dangling, 0);
    }
}
