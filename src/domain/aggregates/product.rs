//! Product Aggregate
//!
//! Catalog entries as served by `/products`, the client-side browse query,
//! and the admin product form.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};
use super::address::required;
use crate::domain::value_objects::{discount_percent, Money};
use crate::FieldErrors;

pub const MAX_PRODUCT_IMAGES: usize = 4;
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    #[serde(alias = "original_price", default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(alias = "stock", default)]
    pub quantity: u32,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub reviews: Option<u32>,
    #[serde(alias = "created_at", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn price(&self) -> Money { Money::inr(self.price) }
    pub fn is_in_stock(&self) -> bool { self.quantity > 0 }
    pub fn discount_percent(&self) -> Option<u32> { self.original_price.and_then(|o| discount_percent(self.price, o)) }

    /// Header search: name or category, case-insensitive.
    pub fn matches_header_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.name.to_lowercase().contains(&term) || self.category.to_lowercase().contains(&term)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Availability { #[default] All, InStock, OutOfStock }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Keeps the backend's order.
    #[default]
    Popularity,
    PriceLowHigh,
    PriceHighLow,
    Newest,
}

/// Catalog page filters. Price bounds are inclusive; `None` means unbounded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductQuery {
    pub search: String,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub availability: Availability,
    pub sort: SortOrder,
}

impl ProductQuery {
    pub fn is_filtered(&self) -> bool {
        !self.search.trim().is_empty() || self.min_price.is_some() || self.max_price.is_some() || self.availability != Availability::All
    }

    /// Resets filters; the sort order is kept.
    pub fn clear_filters(&mut self) {
        *self = Self { sort: self.sort, ..Self::default() };
    }

    pub fn matches(&self, p: &Product) -> bool {
        let term = self.search.trim().to_lowercase();
        let search = term.is_empty() || p.name.to_lowercase().contains(&term) || p.description.to_lowercase().contains(&term);
        let price = self.min_price.map_or(true, |min| p.price >= min) && self.max_price.map_or(true, |max| p.price <= max);
        let availability = match self.availability {
            Availability::All => true,
            Availability::InStock => p.quantity > 0,
            Availability::OutOfStock => p.quantity == 0,
        };
        search && price && availability
    }

    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut out: Vec<&Product> = products.iter().filter(|p| self.matches(p)).collect();
        match self.sort {
            SortOrder::Popularity => {}
            SortOrder::PriceLowHigh => out.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::PriceHighLow => out.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOrder::Newest => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        out
    }
}

/// An image selected for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Admin add/edit product form.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
#[validate(schema(function = "original_price_rule", skip_on_field_errors = false))]
#[validate(schema(function = "image_rule", skip_on_field_errors = false))]
pub struct ProductDraft {
    #[validate(custom(function = "required", message = "Product name is required"))]
    pub name: String,
    #[validate(custom(function = "required", message = "Product description is required"))]
    pub description: String,
    #[validate(custom(function = "required", message = "Product category is required"))]
    pub category: String,
    #[validate(required(message = "Enter a valid price"), custom(function = "positive", message = "Enter a valid price"))]
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    #[validate(required(message = "Enter a valid quantity"), range(min = 1, message = "Enter a valid quantity"))]
    pub quantity: Option<i64>,
    pub new_images: Vec<ImageUpload>,
    /// Image URLs kept from the product being edited when no new images are chosen.
    /// A draft with retained images counts as an edit.
    pub retained_images: Vec<String>,
}

impl ProductDraft {
    pub fn check(&self) -> Result<(), FieldErrors> {
        self.validate().map_err(FieldErrors::from)
    }
}

fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO { Err(ValidationError::new("positive")) } else { Ok(()) }
}

fn field_error(field: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(field);
    err.message = Some(message.into());
    err
}

fn original_price_rule(draft: &ProductDraft) -> Result<(), ValidationError> {
    match draft.original_price {
        Some(original) if original <= Decimal::ZERO => Err(field_error("originalPrice", "Enter a valid original price")),
        Some(original) if draft.price.is_some_and(|p| p > Decimal::ZERO && original < p) => {
            Err(field_error("originalPrice", "Original price must not be lower than the price"))
        }
        _ => Ok(()),
    }
}

fn image_rule(draft: &ProductDraft) -> Result<(), ValidationError> {
    if draft.new_images.len() > MAX_PRODUCT_IMAGES {
        return Err(field_error("productImage", format!("You can upload at most {MAX_PRODUCT_IMAGES} images")));
    }
    if let Some(big) = draft.new_images.iter().find(|i| i.bytes.len() > MAX_IMAGE_BYTES) {
        return Err(field_error("productImage", format!("{} is larger than 2MB", big.file_name)));
    }
    if draft.new_images.is_empty() && draft.retained_images.is_empty() {
        return Err(field_error("productImage", "At least one product image is required"));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_product(id: &str, name: &str, price: Decimal, quantity: u32) -> Product {
    Product {
        id: id.into(), name: name.into(), description: format!("{name} description"), category: "Home".into(),
        price, original_price: None, images: vec![], quantity, rating: None, reviews: None, created_at: None,
    }
}
