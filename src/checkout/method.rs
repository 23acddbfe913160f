//! Payment methods. Each variant drives the same three steps: create the
//! intent, wait for the payer, and confirm the payment with the backend.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use super::gateway::{PaymentWidget, Prefill, VerificationResult, WidgetOutcome, WidgetRequest};
use super::intent::{intent_request, PaymentIntent};
use super::verifier::{verify_payment, VerifiedOrder};
use super::CheckoutBackend;
use crate::config::{Config, UpiConfig};
use crate::domain::aggregates::{Address, Cart, User};
use crate::{Result, StorefrontError};

const MERCHANT_NAME: &str = "ShopKart";
const MIN_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(250);

/// What became of the payer once the intent existed.
#[derive(Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid(VerificationResult),
    Failed { reason: String },
    Dismissed,
    TimedOut,
}

/// Session data a payment method needs to start a payment.
#[derive(Clone, Copy, Debug)]
pub struct PaymentContext<'a> {
    pub address: &'a Address,
    pub cart: &'a Cart,
    pub user: Option<&'a User>,
}

#[async_trait]
pub trait PaymentDriver: Send + Sync {
    async fn initiate(&self, backend: &dyn CheckoutBackend, ctx: PaymentContext<'_>) -> Result<PaymentIntent>;
    async fn await_payment(&self, backend: &dyn CheckoutBackend, intent: &PaymentIntent, ctx: PaymentContext<'_>) -> PaymentOutcome;
    async fn verify(&self, backend: &dyn CheckoutBackend, proof: VerificationResult) -> Result<VerifiedOrder>;
}

#[derive(Clone, Debug)]
pub enum PaymentMethod {
    GatewayHosted(GatewayHosted),
    UpiDeepLink(UpiDeepLink),
    CashOnDelivery(CashOnDelivery),
}

impl PaymentMethod {
    pub fn gateway(widget: Arc<dyn PaymentWidget>, config: &Config) -> Self {
        Self::GatewayHosted(GatewayHosted { widget, fallback_key_id: config.gateway_key_id.clone() })
    }

    pub fn upi(config: &UpiConfig) -> Self { Self::UpiDeepLink(UpiDeepLink { config: config.clone() }) }
    pub fn cash_on_delivery() -> Self { Self::CashOnDelivery(CashOnDelivery) }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GatewayHosted(_) => "gateway",
            Self::UpiDeepLink(_) => "upi",
            Self::CashOnDelivery(_) => "cod",
        }
    }

    pub fn driver(&self) -> &dyn PaymentDriver {
        match self {
            Self::GatewayHosted(d) => d,
            Self::UpiDeepLink(d) => d,
            Self::CashOnDelivery(d) => d,
        }
    }
}

async fn create_intent(backend: &dyn CheckoutBackend, ctx: PaymentContext<'_>, method: &str, fallback_key_id: Option<&str>) -> Result<PaymentIntent> {
    let mut request = intent_request(ctx.address, ctx.cart)?;
    request.method = Some(method.to_string());
    let response = backend.create_payment_order(&request).await?;
    PaymentIntent::from_response(response, &request.receipt, fallback_key_id)
}

// ============================================================================
// Hosted gateway widget
// ============================================================================

/// Card/netbanking/wallet payment through the gateway's hosted widget. No timeout.
#[derive(Clone)]
pub struct GatewayHosted {
    widget: Arc<dyn PaymentWidget>,
    fallback_key_id: Option<String>,
}

impl std::fmt::Debug for GatewayHosted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayHosted").field("fallback_key_id", &self.fallback_key_id).finish_non_exhaustive()
    }
}

impl GatewayHosted {
    fn widget_request(intent: &PaymentIntent, ctx: PaymentContext<'_>) -> WidgetRequest {
        let prefill = ctx.user.map(|u| Prefill { name: u.name.clone(), contact: u.mobile_number.clone() }).unwrap_or_default();
        WidgetRequest {
            intent_id: intent.intent_id.clone(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            key_id: intent.gateway_key_id.clone(),
            merchant_name: MERCHANT_NAME.to_string(),
            description: format!("Payment for {}", intent.receipt),
            prefill,
            address_note: ctx.address.one_line(),
        }
    }
}

#[async_trait]
impl PaymentDriver for GatewayHosted {
    async fn initiate(&self, backend: &dyn CheckoutBackend, ctx: PaymentContext<'_>) -> Result<PaymentIntent> {
        create_intent(backend, ctx, "gateway", self.fallback_key_id.as_deref()).await
    }

    #[instrument(skip_all, fields(intent_id = %intent.intent_id))]
    async fn await_payment(&self, _backend: &dyn CheckoutBackend, intent: &PaymentIntent, ctx: PaymentContext<'_>) -> PaymentOutcome {
        match self.widget.open(Self::widget_request(intent, ctx)).await {
            WidgetOutcome::Success(proof) => PaymentOutcome::Paid(proof),
            WidgetOutcome::Failed { reason } => PaymentOutcome::Failed { reason },
            WidgetOutcome::Dismissed => PaymentOutcome::Dismissed,
        }
    }

    async fn verify(&self, backend: &dyn CheckoutBackend, proof: VerificationResult) -> Result<VerifiedOrder> {
        verify_payment(backend, proof).await
    }
}

// ============================================================================
// UPI deep link
// ============================================================================

/// UPI collect through a `upi://pay` link. The backend is polled until the
/// payment settles; past the configured timeout the intent is cancelled.
#[derive(Clone, Debug)]
pub struct UpiDeepLink {
    config: UpiConfig,
}

impl UpiDeepLink {
    pub fn deep_link(&self, intent: &PaymentIntent) -> Result<String> {
        let amount = format!("{:.2}", intent.amount);
        let note = format!("Order {}", intent.receipt);
        let url = Url::parse_with_params(
            "upi://pay",
            &[
                ("pa", self.config.payee_vpa.as_str()),
                ("pn", self.config.payee_name.as_str()),
                ("am", amount.as_str()),
                ("cu", intent.currency.as_str()),
                ("tn", note.as_str()),
                ("tr", intent.intent_id.as_str()),
            ],
        )
        .map_err(|e| StorefrontError::Config(format!("invalid UPI link: {e}")))?;
        Ok(url.to_string())
    }

    async fn poll(&self, backend: &dyn CheckoutBackend, intent_id: &str) -> PaymentOutcome {
        let mut ticker = time::interval(self.config.poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let status = match backend.payment_status(intent_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("UPI status check failed: {}", e);
                    continue;
                }
            };
            match status.status.trim().to_ascii_lowercase().as_str() {
                "paid" | "success" | "captured" => {
                    return PaymentOutcome::Paid(VerificationResult::new(
                        status.payment_id.unwrap_or_default(),
                        status.order_id.unwrap_or_else(|| intent_id.to_string()),
                        status.signature.unwrap_or_default(),
                    ));
                }
                "failed" => {
                    return PaymentOutcome::Failed { reason: status.message.unwrap_or_else(|| "UPI payment failed".to_string()) };
                }
                "cancelled" | "canceled" => return PaymentOutcome::Dismissed,
                other => debug!(status = other, "UPI payment pending"),
            }
        }
    }
}

#[async_trait]
impl PaymentDriver for UpiDeepLink {
    async fn initiate(&self, backend: &dyn CheckoutBackend, ctx: PaymentContext<'_>) -> Result<PaymentIntent> {
        let mut intent = create_intent(backend, ctx, "upi", None).await?;
        intent.deep_link = Some(self.deep_link(&intent)?);
        Ok(intent)
    }

    #[instrument(skip_all, fields(intent_id = %intent.intent_id))]
    async fn await_payment(&self, backend: &dyn CheckoutBackend, intent: &PaymentIntent, _ctx: PaymentContext<'_>) -> PaymentOutcome {
        match time::timeout(self.config.timeout, self.poll(backend, &intent.intent_id)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(timeout_secs = self.config.timeout.as_secs(), "UPI payment timed out, cancelling");
                if let Err(e) = backend.cancel_payment(&intent.intent_id).await {
                    warn!("UPI cancellation failed: {}", e);
                }
                PaymentOutcome::TimedOut
            }
        }
    }

    async fn verify(&self, backend: &dyn CheckoutBackend, proof: VerificationResult) -> Result<VerifiedOrder> {
        verify_payment(backend, proof).await
    }
}

// ============================================================================
// Cash on delivery
// ============================================================================

/// The order is placed up front; there is nothing to pay or verify online.
#[derive(Clone, Copy, Debug, Default)]
pub struct CashOnDelivery;

#[async_trait]
impl PaymentDriver for CashOnDelivery {
    async fn initiate(&self, backend: &dyn CheckoutBackend, ctx: PaymentContext<'_>) -> Result<PaymentIntent> {
        let mut request = intent_request(ctx.address, ctx.cart)?;
        request.method = Some("cod".to_string());
        let placed = backend.place_cod_order(&request).await?;
        let order_id = placed.order_id.filter(|id| !id.trim().is_empty()).ok_or(StorefrontError::MalformedIntent("order id"))?;
        info!(%order_id, "Cash on delivery order placed");
        Ok(PaymentIntent {
            intent_id: order_id,
            amount: request.amount,
            currency: crate::domain::value_objects::DEFAULT_CURRENCY.to_string(),
            receipt: request.receipt,
            gateway_key_id: None,
            deep_link: None,
        })
    }

    async fn await_payment(&self, _backend: &dyn CheckoutBackend, intent: &PaymentIntent, _ctx: PaymentContext<'_>) -> PaymentOutcome {
        PaymentOutcome::Paid(VerificationResult::cash_on_delivery(intent.intent_id.clone()))
    }

    async fn verify(&self, _backend: &dyn CheckoutBackend, proof: VerificationResult) -> Result<VerifiedOrder> {
        Ok(VerifiedOrder { order_id: Some(proof.order_id) })
    }
}
