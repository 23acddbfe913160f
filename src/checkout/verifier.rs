//! Payment Verifier: hands the gateway's proof to the backend, once.

use tracing::{info, instrument, warn};

use super::gateway::VerificationResult;
use super::CheckoutBackend;
use crate::{Result, StorefrontError};

/// The backend's acknowledgement of a paid order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifiedOrder {
    /// Absent when the backend confirmed without naming the order.
    pub order_id: Option<String>,
}

/// One verification attempt. Any rejection or network error is a `VerificationFailed`;
/// there is no retry and no refund.
#[instrument(skip_all, fields(payment_id = %proof.payment_id))]
pub async fn verify_payment(backend: &dyn CheckoutBackend, proof: VerificationResult) -> Result<VerifiedOrder> {
    match backend.verify_payment(&proof.into_request()).await {
        Ok(response) if response.success != Some(false) => {
            info!(order_id = ?response.order_id, "Payment verified");
            Ok(VerifiedOrder { order_id: response.order_id })
        }
        Ok(response) => {
            let reason = response.message.unwrap_or_else(|| "payment could not be confirmed".to_string());
            warn!(%reason, "Backend rejected payment proof");
            Err(StorefrontError::VerificationFailed(reason))
        }
        Err(e) => {
            warn!("Verification request failed: {}", e);
            Err(StorefrontError::VerificationFailed(e.to_string()))
        }
    }
}
