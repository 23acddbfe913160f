//! Checkout events, recorded by the flow and drained by the host.
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutEvent {
    AddressSelected { address_id: String },
    AddressCreated { address_id: String },
    IntentCreated { intent_id: String, amount: Decimal },
    IntentRejected { reason: String },
    PaymentDismissed { intent_id: String },
    PaymentFailed { intent_id: String, reason: String },
    PaymentTimedOut { intent_id: String },
    PaymentCaptured { intent_id: String, payment_id: String },
    VerificationFailed { payment_id: String, reason: String },
    /// `None` when the backend confirmed payment without returning an order id.
    Confirmed { order_id: Option<String> },
}
