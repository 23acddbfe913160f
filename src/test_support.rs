//! Shared test fixtures: an in-process fake backend and a scripted checkout backend.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;

use crate::api::{ApiClient, CodOrderResponse, CreatePaymentOrder, NewAddressResponse, PaymentOrderResponse, PaymentStatusResponse, VerifyPaymentRequest, VerifyPaymentResponse};
use crate::checkout::CheckoutBackend;
use crate::domain::aggregates::{NewAddress, Order};
use crate::{Result, StorefrontError};

/// Serves `router` on an ephemeral localhost port and returns its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn client_for(base_url: &str, token: Option<&str>) -> ApiClient {
    let mut client = ApiClient::with_http(reqwest::Client::new(), base_url);
    client.set_token(token.map(str::to_string));
    client
}

/// Scripted [`CheckoutBackend`]: each call pops the next queued answer and is recorded.
#[derive(Default)]
pub struct FakeCheckoutBackend {
    pub calls: Mutex<Vec<String>>,
    pub addresses: Mutex<VecDeque<Result<NewAddressResponse>>>,
    pub intents: Mutex<VecDeque<Result<PaymentOrderResponse>>>,
    pub verifications: Mutex<VecDeque<Result<VerifyPaymentResponse>>>,
    pub statuses: Mutex<VecDeque<Result<PaymentStatusResponse>>>,
    pub cod_orders: Mutex<VecDeque<Result<CodOrderResponse>>>,
    pub orders: Mutex<VecDeque<Result<Order>>>,
    pub intent_requests: Mutex<Vec<CreatePaymentOrder>>,
}

impl FakeCheckoutBackend {
    pub fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }
    pub fn count(&self, name: &str) -> usize { self.calls().iter().filter(|c| c.as_str() == name).count() }

    fn record(&self, name: &str) { self.calls.lock().unwrap().push(name.to_string()); }

    fn next<T>(queue: &Mutex<VecDeque<Result<T>>>, name: &str) -> Result<T> {
        queue.lock().unwrap().pop_front().unwrap_or_else(|| Err(StorefrontError::Transport(format!("no scripted answer for {name}"))))
    }
}

#[async_trait]
impl CheckoutBackend for FakeCheckoutBackend {
    async fn add_address(&self, _user_id: &str, _form: &NewAddress) -> Result<NewAddressResponse> {
        self.record("add_address");
        Self::next(&self.addresses, "add_address")
    }

    async fn create_payment_order(&self, request: &CreatePaymentOrder) -> Result<PaymentOrderResponse> {
        self.record("create_payment_order");
        self.intent_requests.lock().unwrap().push(request.clone());
        Self::next(&self.intents, "create_payment_order")
    }

    async fn verify_payment(&self, _request: &VerifyPaymentRequest) -> Result<VerifyPaymentResponse> {
        self.record("verify_payment");
        Self::next(&self.verifications, "verify_payment")
    }

    async fn payment_status(&self, _intent_id: &str) -> Result<PaymentStatusResponse> {
        self.record("payment_status");
        let mut queue = self.statuses.lock().unwrap();
        // The last scripted status repeats, so "pending forever" needs one entry.
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            match queue.front() {
                Some(Ok(status)) => Ok(status.clone()),
                _ => Err(StorefrontError::Transport("no scripted status".into())),
            }
        }
    }

    async fn cancel_payment(&self, _intent_id: &str) -> Result<()> {
        self.record("cancel_payment");
        Ok(())
    }

    async fn place_cod_order(&self, request: &CreatePaymentOrder) -> Result<CodOrderResponse> {
        self.record("place_cod_order");
        self.intent_requests.lock().unwrap().push(request.clone());
        Self::next(&self.cod_orders, "place_cod_order")
    }

    async fn fetch_order(&self, _user_id: &str, _order_id: &str) -> Result<Order> {
        self.record("fetch_order");
        Self::next(&self.orders, "fetch_order")
    }
}

pub fn push<T>(queue: &Mutex<VecDeque<Result<T>>>, answer: Result<T>) {
    queue.lock().unwrap().push_back(answer);
}
