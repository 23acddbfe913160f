//! Order Aggregate
//!
//! Orders are created server-side once a payment is verified; the client only
//! reads them, asks for cancellation, and (for admins) moves their status.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::value_objects::Money;

/// Orders may be cancelled by the customer for this long after being placed.
pub const CANCELLATION_WINDOW_HOURS: i64 = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id", alias = "orderId")]
    pub id: String,
    #[serde(alias = "total_amount", alias = "total")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(alias = "payment_status", default)]
    pub payment_status: String,
    #[serde(alias = "payment_method", default)]
    pub payment_method: Option<String>,
    #[serde(alias = "shipping_details", alias = "shippingAddress", default)]
    pub shipping_details: Option<ShippingDetails>,
    #[serde(alias = "items_details", default)]
    pub items: Vec<OrderItem>,
    #[serde(alias = "order_date", alias = "createdAt")]
    pub order_date: DateTime<Utc>,
}

/// Address snapshot captured when the order was placed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    #[serde(default)] pub name: String,
    #[serde(default)] pub mobile: String,
    #[serde(default, alias = "street")] pub address: String,
    #[serde(default)] pub locality: String,
    #[serde(default)] pub city: String,
    #[serde(default)] pub state: String,
    #[serde(default)] pub pincode: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "product_id", alias = "id")]
    pub product_id: String,
    #[serde(alias = "name", alias = "product_name", default)]
    pub product_name: String,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(alias = "original_price", default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::Pending, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Lenient parse: statuses arrive with stray whitespace and mixed case.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|s| s.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn is_final(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw).unwrap_or_default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentKind { Online, CashOnDelivery }

impl Order {
    pub fn total(&self) -> Money { Money::inr(self.total_amount) }

    pub fn payment_kind(&self) -> PaymentKind {
        if self.payment_status.contains("COD") { PaymentKind::CashOnDelivery } else { PaymentKind::Online }
    }

    /// Human label for the payment method, falling back to what the payment status implies.
    pub fn payment_method_label(&self) -> String {
        match (&self.payment_method, self.payment_kind()) {
            (Some(m), _) if !m.trim().is_empty() => m.trim().to_string(),
            (_, PaymentKind::CashOnDelivery) => "Cash on Delivery".to_string(),
            (_, PaymentKind::Online) => "Online Payment".to_string(),
        }
    }

    pub fn cancellation_deadline(&self) -> DateTime<Utc> { self.order_date + Duration::hours(CANCELLATION_WINDOW_HOURS) }

    pub fn is_cancellable_at(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_final() && now < self.cancellation_deadline()
    }

    pub fn ensure_cancellable(&self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.is_cancellable_at(now) { Ok(()) } else { Err(OrderError::CannotCancel) }
    }
}

/// Admin order list filters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaymentFilter { #[default] All, Upi, Cod }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub payment: PaymentFilter,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        let payment = match self.payment {
            PaymentFilter::All => true,
            PaymentFilter::Upi => order.payment_kind() == PaymentKind::Online,
            PaymentFilter::Cod => order.payment_kind() == PaymentKind::CashOnDelivery,
        };
        payment && self.status.map_or(true, |s| s == order.status)
    }

    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        orders.iter().filter(|o| self.matches(o)).collect()
    }
}

#[derive(Debug, Clone)] pub enum OrderError { CannotCancel }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Cannot cancel") }
}

impl From<OrderError> for crate::StorefrontError {
    fn from(_: OrderError) -> Self { crate::StorefrontError::NotCancellable }
}

#[cfg(test)]
pub(crate) fn sample_order(id: &str, status: OrderStatus, placed: DateTime<Utc>) -> Order {
    Order {
        id: id.into(), total_amount: Decimal::from(250), status, payment_status: "Paid".into(),
        payment_method: Some("Razorpay".into()), shipping_details: None, items: vec![], order_date: placed,
    }
}
