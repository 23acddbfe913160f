//! Payment Redirector: the hosted gateway widget as an awaitable.
//!
//! The widget itself lives outside the crate. A host opens it when
//! [`PaymentWidget::open`] is called and reports back exactly one of its
//! three callbacks. [`CallbackWidget`] bridges such hosts over a channel.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::api::VerifyPaymentRequest;

/// Proof of payment returned by the gateway. Consumed exactly once by the verifier.
#[derive(Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
}

impl VerificationResult {
    pub fn new(payment_id: impl Into<String>, order_id: impl Into<String>, signature: impl Into<String>) -> Self {
        Self { payment_id: payment_id.into(), order_id: order_id.into(), signature: signature.into() }
    }

    /// Proof for an order placed as cash on delivery; nothing is signed.
    pub fn cash_on_delivery(order_id: impl Into<String>) -> Self {
        let order_id = order_id.into();
        Self { payment_id: format!("cod_{order_id}"), order_id, signature: String::new() }
    }

    pub fn into_request(self) -> VerifyPaymentRequest {
        VerifyPaymentRequest {
            razorpay_order_id: self.order_id,
            razorpay_payment_id: self.payment_id,
            razorpay_signature: self.signature,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prefill {
    pub name: String,
    pub contact: String,
}

/// Everything the hosted widget needs to take one payment.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetRequest {
    pub intent_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub key_id: Option<String>,
    pub merchant_name: String,
    pub description: String,
    pub prefill: Prefill,
    /// Destination address, shown to the payer as a note.
    pub address_note: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum WidgetOutcome {
    Success(VerificationResult),
    Failed { reason: String },
    Dismissed,
}

#[async_trait]
pub trait PaymentWidget: Send + Sync {
    async fn open(&self, request: WidgetRequest) -> WidgetOutcome;
}

/// A widget invocation waiting for the host to answer.
#[derive(Debug)]
pub struct PendingPayment {
    request: WidgetRequest,
    responder: oneshot::Sender<WidgetOutcome>,
}

impl PendingPayment {
    pub fn request(&self) -> &WidgetRequest { &self.request }

    pub fn succeed(self, payment_id: impl Into<String>, order_id: impl Into<String>, signature: impl Into<String>) {
        self.respond(WidgetOutcome::Success(VerificationResult::new(payment_id, order_id, signature)));
    }

    pub fn fail(self, reason: impl Into<String>) {
        self.respond(WidgetOutcome::Failed { reason: reason.into() });
    }

    pub fn dismiss(self) { self.respond(WidgetOutcome::Dismissed); }

    fn respond(self, outcome: WidgetOutcome) {
        if self.responder.send(outcome).is_err() {
            debug!(intent_id = %self.request.intent_id, "Checkout no longer waiting for widget outcome");
        }
    }
}

/// Channel-backed widget. Each `open` is delivered to the host as a [`PendingPayment`];
/// a host that goes away, or drops the pending payment unanswered, dismisses it.
#[derive(Clone, Debug)]
pub struct CallbackWidget {
    tx: mpsc::Sender<PendingPayment>,
}

impl CallbackWidget {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PendingPayment>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl PaymentWidget for CallbackWidget {
    async fn open(&self, request: WidgetRequest) -> WidgetOutcome {
        let (responder, outcome) = oneshot::channel();
        let intent_id = request.intent_id.clone();
        if self.tx.send(PendingPayment { request, responder }).await.is_err() {
            warn!(%intent_id, "No widget host listening");
            return WidgetOutcome::Dismissed;
        }
        outcome.await.unwrap_or(WidgetOutcome::Dismissed)
    }
}

#[cfg(test)]
pub(crate) fn widget_request(intent_id: &str) -> WidgetRequest {
    WidgetRequest {
        intent_id: intent_id.into(),
        amount: Decimal::from(250),
        currency: "INR".into(),
        key_id: Some("rzp_test".into()),
        merchant_name: "ShopKart".into(),
        description: "Order payment".into(),
        prefill: Prefill { name: "Asha Rao".into(), contact: "9876543210".into() },
        address_note: "Asha Rao, 12 MG Road".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_host_callbacks_resolve_open() {
        let (widget, mut host) = CallbackWidget::new(1);
        let host_task = tokio::spawn(async move {
            let pending = host.recv().await.unwrap();
            assert_eq!(pending.request().intent_id, "order_1");
            pending.succeed("pay_1", "order_1", "sig");
        });
        let outcome = widget.open(widget_request("order_1")).await;
        host_task.await.unwrap();
        assert_eq!(outcome, WidgetOutcome::Success(VerificationResult::new("pay_1", "order_1", "sig")));
    }

    #[tokio::test]
    async fn test_dropped_handle_is_dismissal() {
        let (widget, mut host) = CallbackWidget::new(1);
        tokio::spawn(async move {
            let pending = host.recv().await.unwrap();
            drop(pending);
        });
        assert_eq!(widget.open(widget_request("order_1")).await, WidgetOutcome::Dismissed);

        let (widget, host) = CallbackWidget::new(1);
        drop(host);
        assert_eq!(widget.open(widget_request("order_2")).await, WidgetOutcome::Dismissed);
    }

    #[test]
    fn test_proof_maps_to_gateway_field_names() {
        let request = VerificationResult::new("pay_1", "order_1", "sig").into_request();
        assert_eq!(request.razorpay_payment_id, "pay_1");
        assert_eq!(request.razorpay_order_id, "order_1");
    }
}
