//! Inventory endpoints (admin).

use reqwest::Method;
use tracing::instrument;

use super::ApiClient;
use crate::domain::aggregates::StockItem;
use crate::Result;

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn fetch_stock(&self) -> Result<Vec<StockItem>> {
        self.send(self.authed(Method::GET, "/stock")?).await
    }

    #[instrument(skip(self))]
    pub async fn add_stock(&self, product_id: &str, product_name: &str, quantity: u32) -> Result<Option<String>> {
        let body = serde_json::json!({ "productId": product_id, "productName": product_name, "quantity": quantity });
        let response: serde_json::Value = self.send(self.authed(Method::POST, "/stock")?.json(&body)).await?;
        Ok(response.get("message").and_then(|m| m.as_str()).map(str::to_string))
    }

    #[instrument(skip(self))]
    pub async fn update_stock(&self, product_id: &str, quantity: u32, product_name: Option<&str>) -> Result<()> {
        let body = serde_json::json!({ "quantity": quantity, "productName": product_name });
        self.send_unit(self.authed(Method::PUT, &format!("/stock/{product_id}"))?.json(&body)).await
    }
}
