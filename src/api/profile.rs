//! Profile and saved addresses.

use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;

use super::ApiClient;
use crate::domain::aggregates::{Address, NewAddress};
use crate::Result;

#[derive(Clone, Debug, Deserialize)]
pub struct NewAddressResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub address: Address,
}

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn fetch_addresses(&self, user_id: &str) -> Result<Vec<Address>> {
        self.send(self.authed(Method::GET, &format!("/profile/{user_id}/addresses"))?).await
    }

    #[instrument(skip(self, form))]
    pub async fn add_address(&self, user_id: &str, form: &NewAddress) -> Result<NewAddressResponse> {
        self.send(self.authed(Method::POST, &format!("/profile/{user_id}/addresses"))?.json(form)).await
    }

    /// Returns the backend's view of the updated fields (plus an optional `message`).
    #[instrument(skip(self, fields))]
    pub async fn update_profile(&self, user_id: &str, fields: &serde_json::Value) -> Result<serde_json::Value> {
        self.send(self.authed(Method::PUT, &format!("/profile/{user_id}"))?.json(fields)).await
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::aggregates::address::sample_form;
    use crate::test_support::{client_for, spawn_backend};
    use axum::{extract::Path, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_add_address_returns_created() {
        let app = Router::new().route(
            "/profile/:user/addresses",
            post(|Path(user): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(user, "u1");
                let mut address = body.clone();
                address["_id"] = json!("a9");
                Json(json!({"message": "Address added", "address": address}))
            }),
        );
        let client = client_for(&spawn_backend(app).await, Some("t"));
        let created = client.add_address("u1", &sample_form()).await.unwrap();
        assert_eq!(created.address.id, "a9");
        assert_eq!(created.address.city, "Bengaluru");
        assert_eq!(created.message.as_deref(), Some("Address added"));
    }
}
