//! Shipping addresses and the new-address form.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::FieldErrors;

static MOBILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").unwrap());
static PINCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").unwrap());

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressType {
    #[default]
    Home,
    Work,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub pincode: String,
    pub locality: String,
    #[serde(alias = "address")]
    pub street: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "type", alias = "addressType", default)]
    pub address_type: AddressType,
}

impl Address {
    /// Single-line rendering used for payment notes and order summaries.
    pub fn one_line(&self) -> String {
        format!("{}, {}, {}, {}, {} - {}", self.name, self.street, self.locality, self.city, self.state, self.pincode)
    }
}

/// Address form as submitted by the user. Every field error is reported, not just the first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewAddress {
    #[validate(custom = "required")]
    pub name: String,
    #[validate(regex(path = "MOBILE_RE", message = "Mobile number must be exactly 10 digits"))]
    pub mobile: String,
    #[validate(regex(path = "PINCODE_RE", message = "Pincode must be exactly 6 digits"))]
    pub pincode: String,
    #[validate(custom = "required")]
    pub locality: String,
    #[serde(rename = "address")]
    #[validate(custom = "required")]
    pub street: String,
    #[validate(custom = "required")]
    pub city: String,
    #[validate(custom = "required")]
    pub state: String,
    #[serde(rename = "type")]
    pub address_type: AddressType,
}

impl NewAddress {
    /// Validates locally; the backend is only contacted when this passes.
    pub fn check(&self) -> Result<(), FieldErrors> {
        self.validate().map_err(FieldErrors::from)
    }
}

pub(crate) fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("This field is required"));
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_address(id: &str) -> Address {
    Address {
        id: id.into(), name: "Asha Rao".into(), mobile: "9876543210".into(), pincode: "560001".into(),
        locality: "MG Road".into(), street: "12 Residency Rd".into(), city: "Bengaluru".into(),
        state: "Karnataka".into(), address_type: AddressType::Home,
    }
}

#[cfg(test)]
pub(crate) fn sample_form() -> NewAddress {
    NewAddress {
        name: "Asha Rao".into(), mobile: "9876543210".into(), pincode: "560001".into(),
        locality: "MG Road".into(), street: "12 Residency Rd".into(), city: "Bengaluru".into(),
        state: "Karnataka".into(), address_type: AddressType::Work,
    }
}
