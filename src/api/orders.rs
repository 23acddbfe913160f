//! Order history, cancellation and admin status changes.

use reqwest::Method;
use tracing::instrument;

use super::ApiClient;
use crate::domain::aggregates::{Order, OrderStatus};
use crate::Result;

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn fetch_my_orders(&self) -> Result<Vec<Order>> {
        self.send(self.authed(Method::GET, "/orders/my-orders")?).await
    }

    /// All orders; admin only.
    #[instrument(skip(self))]
    pub async fn fetch_all_orders(&self) -> Result<Vec<Order>> {
        self.send(self.authed(Method::GET, "/orders")?).await
    }

    #[instrument(skip(self))]
    pub async fn fetch_order(&self, user_id: &str, order_id: &str) -> Result<Order> {
        self.send(self.authed(Method::GET, &format!("/orders/{user_id}/{order_id}"))?).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(&self, user_id: &str, order_id: &str) -> Result<()> {
        self.send_unit(self.authed(Method::PUT, &format!("/orders/{user_id}/{order_id}/cancel"))?).await
    }

    #[instrument(skip(self))]
    pub async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<()> {
        let body = serde_json::json!({ "status": status });
        self.send_unit(self.authed(Method::PUT, &format!("/orders/{order_id}/status"))?.json(&body)).await
    }
}
