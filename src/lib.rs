//! ShopKart Storefront
//!
//! Client side of the ShopKart store: everything a UI host needs to talk to
//! the ShopKart REST API and the payment gateway, without the rendering.
//!
//! ## Features
//! - Catalog browsing with client-side filtering and sorting
//! - Cart synchronised with the backend
//! - Checkout orchestration (address → intent → payment → verification → confirmation)
//! - Gateway, UPI deep-link and cash-on-delivery payment methods
//! - Authentication with OTP and password reset
//! - Order history and cancellation
//! - Admin back-office for products, stock and order status

pub mod api;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod session;
pub mod storefront;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub use api::ApiClient;
pub use checkout::{CheckoutFlow, CheckoutState};
pub use config::Config;
pub use session::{Action, AppState};
pub use storefront::Storefront;

// =============================================================================
// Error Types
// =============================================================================

/// Per-field validation messages, keyed by the field's wire name (`address`,
/// `confirmPassword`, `productImage`), which is what a form host renders against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> { self.0.get(field).map(String::as_str) }
    pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }

    /// `Ok(())` when nothing was collected, otherwise a validation error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() { Ok(()) } else { Err(StorefrontError::Validation(self)) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first { write!(f, "; ")?; }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                // Struct-level checks land under `__all__`; their code names the field.
                let key: &str = if field == "__all__" { &err.code } else { field };
                let message = err.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| format!("{key} is invalid"));
                out.insert(key, message);
            }
        }
        out
    }
}

/// Coarse classification used by hosts to decide how to present a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caught locally, never sent to the backend.
    Validation,
    /// The request never produced a usable response.
    Transport,
    /// The backend rejected the request with a message.
    Business,
    /// The payment gateway reported a failure.
    Gateway,
    /// Payment went through at the gateway but the backend did not confirm it.
    Verification,
    /// Missing login, token or role.
    Session,
}

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Payment failed: {0}")]
    Gateway(String),

    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),

    #[error("Payment was not completed in time")]
    PaymentTimedOut,

    #[error("Please log in to continue")]
    LoginRequired,

    #[error("Admin access required")]
    AdminRequired,

    #[error("Please select a delivery address")]
    AddressRequired,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Invalid payment order: missing {0}")]
    MalformedIntent(&'static str),

    #[error("Order not found")]
    OrderNotFound,

    #[error("Order can no longer be cancelled")]
    NotCancellable,

    #[error("Cart item not found")]
    CartItemNotFound,

    #[error("Cannot {action} while {state}")]
    InvalidCheckoutStep { action: &'static str, state: &'static str },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorefrontError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::AddressRequired | Self::EmptyCart | Self::NotCancellable | Self::CartItemNotFound | Self::InvalidCheckoutStep { .. } => ErrorKind::Validation,
            Self::Transport(_) | Self::Decode(_) | Self::Storage(_) | Self::Config(_) => ErrorKind::Transport,
            Self::Api { .. } | Self::MalformedIntent(_) | Self::OrderNotFound => ErrorKind::Business,
            Self::Gateway(_) | Self::PaymentTimedOut => ErrorKind::Gateway,
            Self::VerificationFailed(_) => ErrorKind::Verification,
            Self::LoginRequired | Self::AdminRequired => ErrorKind::Session,
        }
    }

    /// Field errors when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub(crate) fn business(message: impl Into<String>) -> Self {
        Self::Api { status: 400, message: message.into() }
    }
}

impl From<reqwest::Error> for StorefrontError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() { Self::Decode(e.to_string()) } else { Self::Transport(e.to_string()) }
    }
}

impl From<serde_json::Error> for StorefrontError {
    fn from(e: serde_json::Error) -> Self { Self::Decode(e.to_string()) }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.into()) }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.insert("mobile", "Mobile must be 10 digits");
        errors.insert("mobile", "ignored");
        errors.insert("city", "City is required");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("mobile"), Some("Mobile must be 10 digits"));
        assert_eq!(errors.to_string(), "city: City is required; mobile: Mobile must be 10 digits");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(StorefrontError::Transport("refused".into()).kind(), ErrorKind::Transport);
        assert_eq!(StorefrontError::business("Out of stock").kind(), ErrorKind::Business);
        assert_eq!(StorefrontError::business("Out of stock").to_string(), "Out of stock");
        assert_eq!(StorefrontError::VerificationFailed("bad signature".into()).kind(), ErrorKind::Verification);
        assert_eq!(StorefrontError::AddressRequired.kind(), ErrorKind::Validation);
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
