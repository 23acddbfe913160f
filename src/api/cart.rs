//! Server-side cart. Every mutation answers with the full resulting cart.

use reqwest::Method;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::ApiClient;
use crate::domain::aggregates::{Cart, CartLine, Product};
use crate::Result;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub original_price: Decimal,
    pub images: Vec<String>,
}

impl From<&Product> for AddToCart {
    fn from(p: &Product) -> Self {
        Self { id: p.id.clone(), name: p.name.clone(), price: p.price, original_price: p.original_price.unwrap_or(p.price), images: p.images.clone() }
    }
}

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self, user_id: &str) -> Result<Cart> {
        let lines: Vec<CartLine> = self.send(self.authed(Method::GET, &format!("/cart/{user_id}"))?).await?;
        Ok(Cart::from_lines(lines))
    }

    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub async fn add_to_cart(&self, user_id: &str, item: &AddToCart) -> Result<Cart> {
        let lines: Vec<CartLine> = self.send(self.authed(Method::POST, &format!("/cart/{user_id}/add"))?.json(item)).await?;
        Ok(Cart::from_lines(lines))
    }

    #[instrument(skip(self))]
    pub async fn update_cart_quantity(&self, user_id: &str, product_id: &str, quantity: u32) -> Result<Cart> {
        let body = serde_json::json!({ "quantity": quantity });
        let lines: Vec<CartLine> = self
            .send(self.authed(Method::PUT, &format!("/cart/{user_id}/update/{product_id}"))?.json(&body))
            .await?;
        Ok(Cart::from_lines(lines))
    }

    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, user_id: &str, product_id: &str) -> Result<Cart> {
        let lines: Vec<CartLine> = self.send(self.authed(Method::DELETE, &format!("/cart/{user_id}/remove/{product_id}"))?).await?;
        Ok(Cart::from_lines(lines))
    }
}
