//! Cart Aggregate
//!
//! The backend owns the cart; every mutation endpoint answers with the full
//! resulting cart, which replaces the local copy wholesale.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Money, DEFAULT_CURRENCY};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(alias = "id", alias = "product_id")]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(rename = "originalPrice", alias = "original_price", default, skip_serializing_if = "Option::is_none")]
    pub original_unit_price: Option<Decimal>,
    pub quantity: u32,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CartLine {
    pub fn line_total(&self) -> Money { Money::inr(self.unit_price).multiply(self.quantity) }

    /// Original price when known, otherwise the selling price.
    pub fn effective_original_price(&self) -> Decimal { self.original_unit_price.unwrap_or(self.unit_price) }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Builds a cart from backend lines, dropping any with a zero quantity.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines: lines.into_iter().filter(|l| l.quantity > 0).collect() }
    }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn line(&self, product_id: &str) -> Option<&CartLine> { self.lines.iter().find(|l| l.product_id == product_id) }
    pub fn item_count(&self) -> usize { self.lines.len() }
    pub fn unit_count(&self) -> u32 { self.lines.iter().map(|l| l.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Sum of unit price × quantity. Delivery is free, so this is also the amount charged.
    pub fn total(&self) -> Money {
        self.lines.iter().fold(Money::zero(DEFAULT_CURRENCY), |acc, l| acc.add(&l.line_total()).unwrap_or(acc))
    }

    pub fn original_total(&self) -> Money {
        let sum: Decimal = self.lines.iter().map(|l| l.effective_original_price() * Decimal::from(l.quantity)).sum();
        Money::inr(sum)
    }

    pub fn savings(&self) -> Money { Money::inr(self.original_total().amount() - self.total().amount()) }

    /// Sets a line's quantity; zero or negative removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), CartError> {
        let line = self.lines.iter_mut().find(|l| l.product_id == product_id).ok_or(CartError::ItemNotFound)?;
        match u32::try_from(quantity) {
            Ok(q) if q > 0 => line.quantity = q,
            _ => self.lines.retain(|l| l.product_id != product_id),
        }
        Ok(())
    }

    pub fn clear(&mut self) { self.lines.clear(); }
}

#[derive(Debug, Clone)] pub enum CartError { ItemNotFound }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Item not found") }
}

impl From<CartError> for crate::StorefrontError {
    fn from(_: CartError) -> Self { crate::StorefrontError::CartItemNotFound }
}

#[cfg(test)]
pub(crate) fn line(product_id: &str, price: Decimal, quantity: u32) -> CartLine {
    CartLine { product_id: product_id.into(), name: format!("Item {product_id}"), unit_price: price, original_unit_price: None, quantity, images: vec![] }
}
