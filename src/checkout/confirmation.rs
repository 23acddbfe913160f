//! Confirmation Presenter: loads the authoritative order after payment.

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use super::CheckoutBackend;
use crate::domain::aggregates::{Order, OrderStatus, ShippingDetails};

/// Where the host should navigate next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Catalog,
    OrderDetail { order_id: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub order_id: String,
    /// Formatted for display, e.g. `₹1,250.00`.
    pub total: String,
    pub payment_method: String,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub order_date_label: String,
    pub shipping: Option<ShippingDetails>,
    pub item_count: usize,
}

impl OrderConfirmation {
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            total: order.total().to_string(),
            payment_method: order.payment_method_label(),
            status: order.status,
            order_date: order.order_date,
            order_date_label: order.order_date.format("%-d %B %Y, %-I:%M %p").to_string(),
            shipping: order.shipping_details.clone(),
            item_count: order.items.len(),
        }
    }

    pub fn view_order(&self) -> Route { Route::OrderDetail { order_id: self.order_id.clone() } }
    pub fn continue_shopping(&self) -> Route { Route::Catalog }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmationView {
    Confirmed(OrderConfirmation),
    NotFound { message: String, route: Route },
}

impl ConfirmationView {
    fn not_found() -> Self {
        Self::NotFound { message: "Order not found".to_string(), route: Route::Catalog }
    }
}

pub struct ConfirmationPresenter;

impl ConfirmationPresenter {
    /// Missing ids and failed lookups both render the not-found view.
    #[instrument(skip(backend))]
    pub async fn load(backend: &dyn CheckoutBackend, user_id: Option<&str>, order_id: Option<&str>) -> ConfirmationView {
        let (Some(user_id), Some(order_id)) = (user_id, order_id) else {
            return ConfirmationView::not_found();
        };
        match backend.fetch_order(user_id, order_id).await {
            Ok(order) => ConfirmationView::Confirmed(OrderConfirmation::from_order(&order)),
            Err(e) => {
                warn!("Could not load confirmed order: {}", e);
                ConfirmationView::not_found()
            }
        }
    }
}
