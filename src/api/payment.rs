//! Payment order creation, verification, UPI status polling and cash-on-delivery placement.

use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::ApiClient;
use crate::domain::aggregates::CartLine;
use crate::Result;

/// Body of `POST /payment/create-order` (and of `POST /orders/cod`).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentOrder {
    pub amount: Decimal,
    pub receipt: String,
    pub delivery_address_id: String,
    pub cart: Vec<CartSnapshotLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Cart line as sent to the backend for reconciliation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshotLine {
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
    pub original_price: Decimal,
    pub images: Vec<String>,
}

impl From<&CartLine> for CartSnapshotLine {
    fn from(l: &CartLine) -> Self {
        Self {
            product_id: l.product_id.clone(),
            quantity: l.quantity,
            price: l.unit_price,
            original_price: l.effective_original_price(),
            images: l.images.clone(),
        }
    }
}

/// Raw answer to create-order; presence of id and amount is checked by the caller.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderResponse {
    #[serde(default, alias = "orderId", alias = "intentId")]
    pub id: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default, alias = "key_id", alias = "key")]
    pub key_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "order_id")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// UPI collect status as reported by `GET /payment/status/:intentId`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub status: String,
    #[serde(default, alias = "razorpay_payment_id")]
    pub payment_id: Option<String>,
    #[serde(default, alias = "razorpay_order_id")]
    pub order_id: Option<String>,
    #[serde(default, alias = "razorpay_signature")]
    pub signature: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodOrderResponse {
    #[serde(default, alias = "id", alias = "_id")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiClient {
    #[instrument(skip(self, request), fields(amount = %request.amount, address = %request.delivery_address_id))]
    pub async fn create_payment_order(&self, request: &CreatePaymentOrder) -> Result<PaymentOrderResponse> {
        let response: PaymentOrderResponse = self.send(self.authed(Method::POST, "/payment/create-order")?.json(request)).await?;
        info!(intent_id = ?response.id, "Payment order created");
        Ok(response)
    }

    #[instrument(skip(self, request), fields(payment_id = %request.razorpay_payment_id))]
    pub async fn verify_payment(&self, request: &VerifyPaymentRequest) -> Result<VerifyPaymentResponse> {
        self.send(self.authed(Method::POST, "/payment/verify-payment")?.json(request)).await
    }

    #[instrument(skip(self))]
    pub async fn payment_status(&self, intent_id: &str) -> Result<PaymentStatusResponse> {
        self.send(self.authed(Method::GET, &format!("/payment/status/{intent_id}"))?).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_payment(&self, intent_id: &str) -> Result<()> {
        self.send_unit(self.authed(Method::POST, &format!("/payment/cancel/{intent_id}"))?).await
    }

    #[instrument(skip(self, request), fields(amount = %request.amount))]
    pub async fn place_cod_order(&self, request: &CreatePaymentOrder) -> Result<CodOrderResponse> {
        self.send(self.authed(Method::POST, "/orders/cod")?.json(request)).await
    }
}
