//! Identity, OTP and password reset.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::ApiClient;
use crate::domain::aggregates::{Role, User};
use crate::Result;

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub mobile_number: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("mobile_number", &self.mobile_number).finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub mobile_number: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").field("mobile_number", &self.mobile_number).finish_non_exhaustive()
    }
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub role: Role,
    pub token: String,
}

impl LoginResponse {
    pub fn user(&self) -> User {
        User { id: self.id.clone(), name: self.name.clone(), mobile_number: self.mobile_number.clone(), role: self.role }
    }
}

/// Answer shape shared by the OTP endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,
}

impl ApiClient {
    #[instrument(skip(self, credentials), fields(mobile = %credentials.mobile_number))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let response: LoginResponse = self.send(self.request(Method::POST, "/auth/login").json(credentials)).await?;
        info!(user_id = %response.id, "Logged in");
        Ok(response)
    }

    #[instrument(skip(self, registration), fields(mobile = %registration.mobile_number))]
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        self.send_unit(self.request(Method::POST, "/auth/register").json(registration)).await
    }

    #[instrument(skip(self))]
    pub async fn send_otp(&self, mobile_number: &str) -> Result<OtpResponse> {
        let body = serde_json::json!({ "mobileNumber": mobile_number });
        self.send(self.request(Method::POST, "/auth/send-otp").json(&body)).await
    }

    #[instrument(skip(self, otp))]
    pub async fn verify_otp(&self, mobile_number: &str, otp: &str, session_id: &str) -> Result<OtpResponse> {
        let body = serde_json::json!({ "mobileNumber": mobile_number, "otp": otp, "sessionId": session_id });
        self.send(self.request(Method::POST, "/auth/verify-otp").json(&body)).await
    }

    #[instrument(skip(self))]
    pub async fn send_reset_otp(&self, mobile_number: &str) -> Result<OtpResponse> {
        let body = serde_json::json!({ "mobileNumber": mobile_number });
        self.send(self.request(Method::POST, "/auth/send-reset-otp").json(&body)).await
    }

    #[instrument(skip(self, new_password))]
    pub async fn reset_password(&self, mobile_number: &str, new_password: &str, session_id: &str) -> Result<OtpResponse> {
        let body = serde_json::json!({ "mobileNumber": mobile_number, "newPassword": new_password, "sessionId": session_id });
        self.send(self.request(Method::POST, "/auth/reset-password").json(&body)).await
    }
}
