//! Signed-in user.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::FieldErrors;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[serde(alias = "user")]
    Customer,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "mobile", default)]
    pub mobile_number: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    /// Overlays the fields a profile update returned.
    pub fn merge_profile(&mut self, update: &serde_json::Value) {
        if let Some(name) = update.get("name").and_then(|v| v.as_str()) { self.name = name.to_string(); }
        if let Some(mobile) = update.get("mobileNumber").and_then(|v| v.as_str()) { self.mobile_number = mobile.to_string(); }
    }
}

/// Password reset form, checked before the reset is sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ResetPasswordForm {
    #[serde(rename = "newPassword")]
    #[validate(length(min = 1, message = "Password is required"))]
    pub new_password: String,
    #[serde(rename = "confirmPassword")]
    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn new(new_password: &str, confirm_password: &str) -> Self {
        Self { new_password: new_password.to_string(), confirm_password: confirm_password.to_string() }
    }

    pub fn check(&self) -> Result<(), FieldErrors> {
        self.validate().map_err(FieldErrors::from)
    }
}
