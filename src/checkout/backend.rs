//! The slice of the REST API the checkout flow depends on.

use async_trait::async_trait;

use crate::api::{ApiClient, CodOrderResponse, CreatePaymentOrder, NewAddressResponse, PaymentOrderResponse, PaymentStatusResponse, VerifyPaymentRequest, VerifyPaymentResponse};
use crate::domain::aggregates::{NewAddress, Order};
use crate::Result;

#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    async fn add_address(&self, user_id: &str, form: &NewAddress) -> Result<NewAddressResponse>;
    async fn create_payment_order(&self, request: &CreatePaymentOrder) -> Result<PaymentOrderResponse>;
    async fn verify_payment(&self, request: &VerifyPaymentRequest) -> Result<VerifyPaymentResponse>;
    async fn payment_status(&self, intent_id: &str) -> Result<PaymentStatusResponse>;
    async fn cancel_payment(&self, intent_id: &str) -> Result<()>;
    async fn place_cod_order(&self, request: &CreatePaymentOrder) -> Result<CodOrderResponse>;
    async fn fetch_order(&self, user_id: &str, order_id: &str) -> Result<Order>;
}

#[async_trait]
impl CheckoutBackend for ApiClient {
    async fn add_address(&self, user_id: &str, form: &NewAddress) -> Result<NewAddressResponse> {
        ApiClient::add_address(self, user_id, form).await
    }

    async fn create_payment_order(&self, request: &CreatePaymentOrder) -> Result<PaymentOrderResponse> {
        ApiClient::create_payment_order(self, request).await
    }

    async fn verify_payment(&self, request: &VerifyPaymentRequest) -> Result<VerifyPaymentResponse> {
        ApiClient::verify_payment(self, request).await
    }

    async fn payment_status(&self, intent_id: &str) -> Result<PaymentStatusResponse> {
        ApiClient::payment_status(self, intent_id).await
    }

    async fn cancel_payment(&self, intent_id: &str) -> Result<()> {
        ApiClient::cancel_payment(self, intent_id).await
    }

    async fn place_cod_order(&self, request: &CreatePaymentOrder) -> Result<CodOrderResponse> {
        ApiClient::place_cod_order(self, request).await
    }

    async fn fetch_order(&self, user_id: &str, order_id: &str) -> Result<Order> {
        ApiClient::fetch_order(self, user_id, order_id).await
    }
}
