//! Order Intent Initiator: turns the cart and the chosen address into a payment intent.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::api::{CartSnapshotLine, CreatePaymentOrder, PaymentOrderResponse};
use crate::domain::aggregates::{Address, Cart};
use crate::domain::value_objects::DEFAULT_CURRENCY;
use crate::{Result, StorefrontError};

/// A pending payment for one checkout attempt. Never reused across attempts.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub receipt: String,
    pub gateway_key_id: Option<String>,
    /// `upi://pay` link for UPI payments.
    pub deep_link: Option<String>,
}

impl PaymentIntent {
    /// Both the intent id and the amount must be present.
    pub fn from_response(response: PaymentOrderResponse, receipt: &str, fallback_key_id: Option<&str>) -> Result<Self> {
        let intent_id = response.id.filter(|id| !id.trim().is_empty()).ok_or(StorefrontError::MalformedIntent("order id"))?;
        let amount = response.amount.ok_or(StorefrontError::MalformedIntent("amount"))?;
        Ok(Self {
            intent_id,
            amount,
            currency: response.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            receipt: response.receipt.unwrap_or_else(|| receipt.to_string()),
            gateway_key_id: response.key_id.or_else(|| fallback_key_id.map(str::to_string)),
            deep_link: None,
        })
    }
}

pub fn new_receipt() -> String {
    format!("receipt_order_{}", Utc::now().timestamp_millis())
}

/// Request for the current cart total (no shipping) delivered to `address`.
pub fn intent_request(address: &Address, cart: &Cart) -> Result<CreatePaymentOrder> {
    if cart.is_empty() {
        return Err(StorefrontError::EmptyCart);
    }
    Ok(CreatePaymentOrder {
        amount: cart.total().amount(),
        receipt: new_receipt(),
        delivery_address_id: address.id.clone(),
        cart: cart.lines().iter().map(CartSnapshotLine::from).collect(),
        method: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::address::sample_address;
    use crate::domain::aggregates::cart::line;
    use rust_decimal_macros::dec;

    #[test]
    fn test_request_carries_total_and_snapshot() {
        let cart = Cart::from_lines(vec![line("A", dec!(100), 2), line("B", dec!(50), 1)]);
        let request = intent_request(&sample_address("a1"), &cart).unwrap();
        assert_eq!(request.amount, dec!(250));
        assert_eq!(request.delivery_address_id, "a1");
        assert_eq!(request.cart.len(), 2);
        assert!(request.receipt.starts_with("receipt_order_"));
        assert!(matches!(intent_request(&sample_address("a1"), &Cart::new()), Err(StorefrontError::EmptyCart)));
    }

    #[test]
    fn test_response_must_have_id_and_amount() {
        let full = PaymentOrderResponse { id: Some("order_1".into()), amount: Some(dec!(250)), ..Default::default() };
        let intent = PaymentIntent::from_response(full, "r1", Some("rzp_key")).unwrap();
        assert_eq!(intent.currency, "INR");
        assert_eq!(intent.gateway_key_id.as_deref(), Some("rzp_key"));

        let no_amount = PaymentOrderResponse { id: Some("order_1".into()), ..Default::default() };
        assert!(matches!(PaymentIntent::from_response(no_amount, "r1", None), Err(StorefrontError::MalformedIntent("amount"))));
        let no_id = PaymentOrderResponse { amount: Some(dec!(250)), ..Default::default() };
        assert!(matches!(PaymentIntent::from_response(no_id, "r1", None), Err(StorefrontError::MalformedIntent("order id"))));
    }
}
