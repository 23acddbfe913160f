//! Storefront service: the operations a UI host calls.
//!
//! Every operation talks to the API through [`ApiClient`], folds the answer
//! into [`AppState`] and leaves a [`Notification`] for the user. Errors are
//! returned as well as notified, and never leave the session unusable.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::api::{AddToCart, ApiClient, Credentials, OtpResponse, Registration};
use crate::checkout::{CheckoutFlow, PaymentMethod};
use crate::config::Config;
use crate::domain::aggregates::{NewAddress, Order, OrderFilter, OrderStatus, Product, ProductDraft, ProductQuery, ResetPasswordForm, StockSummary, User};
use crate::session::token_store::{clear_login, load_login, save_login, save_user};
use crate::session::{Action, AppState, Notification, TokenStore};
use crate::{FieldErrors, Result, StorefrontError};

pub struct Storefront {
    client: ApiClient,
    state: AppState,
    store: Arc<dyn TokenStore>,
    config: Config,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront").field("client", &self.client).field("logged_in", &self.state.is_logged_in()).finish_non_exhaustive()
    }
}

impl Storefront {
    pub fn new(config: Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        Ok(Self::with_client(client, store, config))
    }

    pub fn with_client(client: ApiClient, store: Arc<dyn TokenStore>, config: Config) -> Self {
        Self { client, state: AppState::new(), store, config }
    }

    pub fn state(&self) -> &AppState { &self.state }
    /// Session access for the checkout flow, which applies its own actions.
    pub fn state_mut(&mut self) -> &mut AppState { &mut self.state }
    pub fn client(&self) -> &ApiClient { &self.client }
    pub fn config(&self) -> &Config { &self.config }

    fn notify_ok(&mut self, message: impl Into<String>) {
        self.state.apply(Action::Notify(Notification::success(message)));
    }

    /// Notifies the failure and hands it back.
    fn report(&mut self, error: StorefrontError) -> StorefrontError {
        warn!(kind = ?error.kind(), "Storefront operation failed: {}", error);
        self.state.apply(Action::Notify(Notification::error(error.to_string())));
        error
    }

    fn reported<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|e| self.report(e))
    }

    fn user_id(&mut self) -> Result<String> {
        let user_id = self.state.user().filter(|_| self.client.is_authenticated()).map(|u| u.id.clone());
        match user_id {
            Some(id) => Ok(id),
            None => Err(self.report(StorefrontError::LoginRequired)),
        }
    }

    fn ensure_admin(&mut self) -> Result<()> {
        self.user_id()?;
        if self.state.is_admin() { Ok(()) } else { Err(self.report(StorefrontError::AdminRequired)) }
    }

    pub fn prune_notifications(&mut self) {
        self.state.apply(Action::PruneNotifications(Utc::now()));
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Picks up a persisted login. Returns whether a user was restored.
    #[instrument(skip(self))]
    pub async fn restore(&mut self) -> Result<bool> {
        let Some((user, token)) = load_login(self.store.as_ref())? else {
            return Ok(false);
        };
        info!(user_id = %user.id, "Restoring session");
        self.client.set_token(Some(token.clone()));
        self.state.apply(Action::LoggedIn { user, token });
        self.load_user_data().await;
        Ok(true)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&mut self, mobile_number: &str, password: &str) -> Result<User> {
        let credentials = Credentials { mobile_number: mobile_number.to_string(), password: password.to_string() };
        let response = self.client.login(&credentials).await;
        let response = self.reported(response)?;
        let user = response.user();
        save_login(self.store.as_ref(), &user, &response.token)?;
        self.client.set_token(Some(response.token.clone()));
        self.state.apply(Action::LoggedIn { user: user.clone(), token: response.token });
        self.notify_ok(format!("Welcome back, {}", user.name));
        self.load_user_data().await;
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn register(&mut self, name: Option<&str>, mobile_number: &str, password: &str) -> Result<User> {
        let registration = Registration { name: name.map(str::to_string), mobile_number: mobile_number.to_string(), password: password.to_string() };
        let registered = self.client.register(&registration).await;
        self.reported(registered)?;
        self.login(mobile_number, password).await
    }

    pub fn logout(&mut self) -> Result<()> {
        clear_login(self.store.as_ref())?;
        self.client.set_token(None);
        self.state.apply(Action::LoggedOut);
        info!("Logged out");
        Ok(())
    }

    // Loads what a fresh login needs. Failures are notified but do not undo the login.
    async fn load_user_data(&mut self) {
        let Some(user) = self.state.user().cloned() else { return };
        match self.client.fetch_cart(&user.id).await {
            Ok(cart) => self.state.apply(Action::CartReplaced(cart)),
            Err(e) => { self.report(e); }
        }
        match self.client.fetch_addresses(&user.id).await {
            Ok(addresses) => self.state.apply(Action::AddressesLoaded(addresses)),
            Err(e) => { self.report(e); }
        }
        let orders = if user.is_admin() { self.client.fetch_all_orders().await } else { self.client.fetch_my_orders().await };
        match orders {
            Ok(orders) => self.state.apply(Action::OrdersLoaded(orders)),
            Err(e) => { self.report(e); }
        }
        if user.is_admin() {
            match self.client.fetch_stock().await {
                Ok(stock) => self.state.apply(Action::StockLoaded(stock)),
                Err(e) => { self.report(e); }
            }
        }
    }

    pub async fn send_otp(&mut self, mobile_number: &str) -> Result<OtpResponse> {
        let sent = self.client.send_otp(mobile_number).await;
        let sent = self.reported(sent)?;
        self.otp_notice(&sent, "OTP sent");
        Ok(sent)
    }

    pub async fn verify_otp(&mut self, mobile_number: &str, otp: &str, session_id: &str) -> Result<OtpResponse> {
        let verified = self.client.verify_otp(mobile_number, otp, session_id).await;
        let verified = self.reported(verified)?;
        if !verified.success {
            let message = verified.message.clone().unwrap_or_else(|| "Invalid OTP".to_string());
            return Err(self.report(StorefrontError::business(message)));
        }
        self.otp_notice(&verified, "OTP verified");
        Ok(verified)
    }

    pub async fn send_reset_otp(&mut self, mobile_number: &str) -> Result<OtpResponse> {
        let sent = self.client.send_reset_otp(mobile_number).await;
        let sent = self.reported(sent)?;
        self.otp_notice(&sent, "OTP sent");
        Ok(sent)
    }

    /// The confirmation must match before anything is sent.
    pub async fn reset_password(&mut self, mobile_number: &str, new_password: &str, confirm_password: &str, session_id: &str) -> Result<()> {
        if let Err(errors) = ResetPasswordForm::new(new_password, confirm_password).check() {
            return Err(self.report(StorefrontError::Validation(errors)));
        }
        let reset = self.client.reset_password(mobile_number, new_password, session_id).await;
        let reset = self.reported(reset)?;
        self.otp_notice(&reset, "Password reset successfully");
        Ok(())
    }

    fn otp_notice(&mut self, response: &OtpResponse, fallback: &str) {
        let message = response.message.clone().unwrap_or_else(|| fallback.to_string());
        self.notify_ok(message);
    }

    // =========================================================================
    // Catalog & cart
    // =========================================================================

    pub async fn load_products(&mut self) -> Result<()> {
        let products = self.client.fetch_products().await;
        let products = self.reported(products)?;
        info!(count = products.len(), "Catalog loaded");
        self.state.apply(Action::ProductsLoaded(products));
        Ok(())
    }

    pub fn set_search(&mut self, term: &str) { self.state.apply(Action::SearchChanged(term.to_string())); }

    pub fn query_products(&self, query: &ProductQuery) -> Vec<&Product> { query.apply(self.state.products()) }

    pub async fn add_to_cart(&mut self, product: &Product) -> Result<()> {
        let user_id = self.user_id()?;
        let cart = self.client.add_to_cart(&user_id, &AddToCart::from(product)).await;
        let cart = self.reported(cart)?;
        self.state.apply(Action::CartReplaced(cart));
        self.notify_ok(format!("{} added to cart", product.name));
        Ok(())
    }

    /// A quantity of zero or less removes the line.
    pub async fn update_cart_quantity(&mut self, product_id: &str, quantity: i64) -> Result<()> {
        let user_id = self.user_id()?;
        let mut preview = self.state.cart().clone();
        if let Err(e) = preview.update_quantity(product_id, quantity) {
            return Err(self.report(e.into()));
        }
        let Some(quantity) = preview.line(product_id).map(|l| l.quantity) else {
            return self.remove_from_cart(product_id).await;
        };
        let cart = self.client.update_cart_quantity(&user_id, product_id, quantity).await;
        let cart = self.reported(cart)?;
        self.state.apply(Action::CartReplaced(cart));
        self.notify_ok("Cart updated");
        Ok(())
    }

    pub async fn remove_from_cart(&mut self, product_id: &str) -> Result<()> {
        let user_id = self.user_id()?;
        let cart = self.client.remove_from_cart(&user_id, product_id).await;
        let cart = self.reported(cart)?;
        self.state.apply(Action::CartReplaced(cart));
        self.notify_ok("Item removed from cart");
        Ok(())
    }

    // =========================================================================
    // Profile & orders
    // =========================================================================

    pub async fn update_profile(&mut self, fields: Value) -> Result<User> {
        let user_id = self.user_id()?;
        let updated = self.client.update_profile(&user_id, &fields).await;
        let updated = self.reported(updated)?;
        let Some(mut user) = self.state.user().cloned() else {
            return Err(self.report(StorefrontError::LoginRequired));
        };
        user.merge_profile(&fields);
        user.merge_profile(&updated);
        save_user(self.store.as_ref(), &user)?;
        self.state.apply(Action::UserUpdated(user.clone()));
        self.notify_ok("Profile updated");
        Ok(user)
    }

    pub async fn load_addresses(&mut self) -> Result<()> {
        let user_id = self.user_id()?;
        let addresses = self.client.fetch_addresses(&user_id).await;
        let addresses = self.reported(addresses)?;
        self.state.apply(Action::AddressesLoaded(addresses));
        Ok(())
    }

    /// Saves an address outside checkout. The form is validated locally first.
    pub async fn add_address(&mut self, form: &NewAddress) -> Result<()> {
        let user_id = self.user_id()?;
        if let Err(errors) = form.check() {
            return Err(self.report(StorefrontError::Validation(errors)));
        }
        let created = self.client.add_address(&user_id, form).await;
        let created = self.reported(created)?;
        self.state.apply(Action::AddressAdded(created.address));
        self.notify_ok(created.message.unwrap_or_else(|| "Address added".to_string()));
        Ok(())
    }

    pub async fn load_my_orders(&mut self) -> Result<()> {
        self.user_id()?;
        let orders = self.client.fetch_my_orders().await;
        let orders = self.reported(orders)?;
        self.state.apply(Action::OrdersLoaded(orders));
        Ok(())
    }

    pub async fn fetch_order(&mut self, order_id: &str) -> Result<Order> {
        let user_id = self.user_id()?;
        let order = self.client.fetch_order(&user_id, order_id).await;
        let order = self.reported(order)?;
        self.state.apply(Action::OrderReplaced(order.clone()));
        Ok(order)
    }

    /// Cancels within the cancellation window; outside it nothing is sent.
    #[instrument(skip(self))]
    pub async fn cancel_order(&mut self, order_id: &str) -> Result<()> {
        let user_id = self.user_id()?;
        let Some(order) = self.state.orders().iter().find(|o| o.id == order_id).cloned() else {
            return Err(self.report(StorefrontError::OrderNotFound));
        };
        if let Err(e) = order.ensure_cancellable(Utc::now()) {
            return Err(self.report(e.into()));
        }
        let cancelled = self.client.cancel_order(&user_id, order_id).await;
        self.reported(cancelled)?;
        self.state.apply(Action::OrderReplaced(Order { status: OrderStatus::Cancelled, ..order }));
        self.notify_ok("Order cancelled");
        Ok(())
    }

    // =========================================================================
    // Admin
    // =========================================================================

    pub async fn load_all_orders(&mut self) -> Result<()> {
        self.ensure_admin()?;
        let orders = self.client.fetch_all_orders().await;
        let orders = self.reported(orders)?;
        self.state.apply(Action::OrdersLoaded(orders));
        Ok(())
    }

    pub fn filter_orders(&self, filter: &OrderFilter) -> Vec<&Order> { filter.apply(self.state.orders()) }

    /// No request is made when the order already has `status`.
    pub async fn update_order_status(&mut self, order_id: &str, status: OrderStatus) -> Result<()> {
        self.ensure_admin()?;
        let Some(order) = self.state.orders().iter().find(|o| o.id == order_id).cloned() else {
            return Err(self.report(StorefrontError::OrderNotFound));
        };
        if order.status == status {
            return Ok(());
        }
        let updated = self.client.update_order_status(order_id, status).await;
        self.reported(updated)?;
        self.state.apply(Action::OrderReplaced(Order { status, ..order }));
        self.notify_ok(format!("Order status updated to {status}"));
        Ok(())
    }

    pub async fn add_product(&mut self, draft: &ProductDraft) -> Result<()> {
        self.save_product(None, draft).await
    }

    pub async fn update_product(&mut self, product_id: &str, draft: &ProductDraft) -> Result<()> {
        self.save_product(Some(product_id), draft).await
    }

    async fn save_product(&mut self, product_id: Option<&str>, draft: &ProductDraft) -> Result<()> {
        self.ensure_admin()?;
        if let Err(errors) = draft.check() {
            return Err(self.report(StorefrontError::Validation(errors)));
        }
        let saved = match product_id {
            Some(id) => self.client.update_product(id, draft).await,
            None => self.client.add_product(draft).await,
        };
        self.reported(saved)?;
        self.notify_ok(if product_id.is_some() { "Product updated" } else { "Product added" });
        self.load_products().await
    }

    pub async fn delete_product(&mut self, product_id: &str) -> Result<()> {
        self.ensure_admin()?;
        let deleted = self.client.delete_product(product_id).await;
        self.reported(deleted)?;
        let remaining = self.state.products().iter().filter(|p| p.id != product_id).cloned().collect();
        self.state.apply(Action::ProductsLoaded(remaining));
        self.notify_ok("Product deleted");
        Ok(())
    }

    pub async fn load_stock(&mut self) -> Result<StockSummary> {
        self.ensure_admin()?;
        let stock = self.client.fetch_stock().await;
        let stock = self.reported(stock)?;
        let summary = StockSummary::of(&stock);
        self.state.apply(Action::StockLoaded(stock));
        Ok(summary)
    }

    pub async fn add_stock(&mut self, product_id: &str, product_name: &str, quantity: u32) -> Result<()> {
        self.ensure_admin()?;
        let added = self.client.add_stock(product_id, product_name, quantity).await;
        let message = self.reported(added)?;
        self.notify_ok(message.unwrap_or_else(|| "Stock added".to_string()));
        self.load_stock().await.map(|_| ())
    }

    pub async fn update_stock(&mut self, product_id: &str, quantity: i64) -> Result<()> {
        self.ensure_admin()?;
        let Ok(quantity) = u32::try_from(quantity) else {
            let mut errors = FieldErrors::new();
            errors.insert("quantity", "Quantity cannot be negative");
            return Err(self.report(StorefrontError::Validation(errors)));
        };
        let name = self.state.stock().iter().find(|s| s.product_id == product_id).and_then(|s| s.product_name.clone());
        let updated = self.client.update_stock(product_id, quantity, name.as_deref()).await;
        self.reported(updated)?;
        self.notify_ok("Stock updated");
        self.load_stock().await.map(|_| ())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Starts a checkout over the current session. The flow is driven with [`Self::state_mut`].
    pub fn checkout(&self, method: PaymentMethod) -> CheckoutFlow {
        CheckoutFlow::new(Arc::new(self.client.clone()), method, &self.state)
    }

    pub fn upi_checkout(&self) -> CheckoutFlow { self.checkout(PaymentMethod::upi(&self.config.upi)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::sample_order;
    use crate::domain::aggregates::product::sample_product;
    use crate::session::{MemoryTokenStore, NotificationLevel};
    use crate::test_support::{client_for, spawn_backend};
    use axum::{extract::Path, routing::{delete, get, post, put}, Json, Router};
    use chrono::Duration;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn storefront(base_url: &str) -> Storefront {
        Storefront::with_client(client_for(base_url, None), Arc::new(MemoryTokenStore::new()), Config::default())
    }

    fn logged_in(base_url: &str, role: &str) -> Storefront {
        let mut shop = storefront(base_url);
        let user: User = serde_json::from_value(json!({"id": "u1", "name": "Asha", "mobileNumber": "9876543210", "role": role})).unwrap();
        shop.client.set_token(Some("jwt".into()));
        shop.state.apply(Action::LoggedIn { user, token: "jwt".into() });
        shop
    }

    fn cart_line(id: &str, qty: u32) -> Value {
        json!({"productId": id, "name": "Kurta", "price": 100, "originalPrice": 150, "quantity": qty, "images": []})
    }

    #[tokio::test]
    async fn test_login_loads_session_and_persists() {
        let app = Router::new()
            .route("/auth/login", post(|| async { Json(json!({"id": "u1", "name": "Asha", "mobileNumber": "9876543210", "role": "user", "token": "jwt"})) }))
            .route("/cart/:user", get(|| async { Json(json!([cart_line("p1", 2)])) }))
            .route("/profile/:user/addresses", get(|| async { Json(json!([{"_id": "a1", "name": "Asha", "mobile": "9876543210", "pincode": "560001", "locality": "MG Road", "address": "12 Residency Rd", "city": "Bengaluru", "state": "Karnataka", "type": "Home"}])) }))
            .route("/orders/my-orders", get(|| async { Json(json!([])) }));
        let base = spawn_backend(app).await;
        let store = Arc::new(MemoryTokenStore::new());
        let mut shop = Storefront::with_client(client_for(&base, None), store.clone(), Config::default());

        shop.login("9876543210", "secret").await.unwrap();
        assert_eq!(shop.state().cart().unit_count(), 2);
        assert_eq!(shop.state().addresses()[0].id, "a1");
        assert!(shop.client().is_authenticated());

        let mut restored = Storefront::with_client(client_for(&base, None), store.clone(), Config::default());
        assert!(restored.restore().await.unwrap());
        assert_eq!(restored.state().user().unwrap().name, "Asha");

        restored.logout().unwrap();
        assert!(!restored.state().is_logged_in());
        assert!(load_login(store.as_ref()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guest_cart_requires_login() {
        let mut shop = storefront("http://127.0.0.1:9");
        let err = shop.add_to_cart(&sample_product("p1", "Kurta", rust_decimal::Decimal::from(100), 5)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::LoginRequired));
        assert_eq!(shop.state().notifications()[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line() {
        let removed = Arc::new(AtomicUsize::new(0));
        let hits = removed.clone();
        let app = Router::new().route(
            "/cart/:user/remove/:product",
            delete(move |Path((_user, product)): Path<(String, String)>| {
                let hits = hits.clone();
                async move {
                    assert_eq!(product, "p1");
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!([]))
                }
            }),
        );
        let mut shop = logged_in(&spawn_backend(app).await, "user");
        let cart = serde_json::from_value(json!([cart_line("p1", 1)])).unwrap();
        shop.state.apply(Action::CartReplaced(cart));

        shop.update_cart_quantity("p1", 0).await.unwrap();
        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert!(shop.state().cart().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_window_checked_locally() {
        let mut shop = logged_in("http://127.0.0.1:9", "user");
        let old = sample_order("o1", OrderStatus::Processing, Utc::now() - Duration::hours(5));
        shop.state.apply(Action::OrdersLoaded(vec![old]));

        let err = shop.cancel_order("o1").await.unwrap_err();
        assert!(matches!(err, StorefrontError::NotCancellable));
    }

    #[tokio::test]
    async fn test_cancel_marks_order_cancelled() {
        let app = Router::new().route("/orders/:user/:order/cancel", put(|| async { Json(json!({"message": "Order cancelled"})) }));
        let mut shop = logged_in(&spawn_backend(app).await, "user");
        shop.state.apply(Action::OrdersLoaded(vec![sample_order("o1", OrderStatus::Processing, Utc::now())]));

        shop.cancel_order("o1").await.unwrap();
        assert_eq!(shop.state().orders()[0].status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_admin_guard_and_unchanged_status() {
        let mut customer = logged_in("http://127.0.0.1:9", "user");
        assert!(matches!(customer.load_stock().await, Err(StorefrontError::AdminRequired)));

        let mut admin = logged_in("http://127.0.0.1:9", "admin");
        admin.state.apply(Action::OrdersLoaded(vec![sample_order("o1", OrderStatus::Shipped, Utc::now())]));
        // Unreachable backend: only succeeds because nothing is sent.
        admin.update_order_status("o1", OrderStatus::Shipped).await.unwrap();
        assert!(admin.update_order_status("o1", OrderStatus::Delivered).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_password_mismatch_is_local() {
        let mut shop = storefront("http://127.0.0.1:9");
        let err = shop.reset_password("9876543210", "secret1", "secret2", "s-1").await.unwrap_err();
        assert!(err.field_errors().unwrap().contains("confirmPassword"));
    }

    #[tokio::test]
    async fn test_negative_stock_rejected() {
        let mut admin = logged_in("http://127.0.0.1:9", "admin");
        let err = admin.update_stock("p1", -1).await.unwrap_err();
        assert!(err.field_errors().unwrap().contains("quantity"));
    }

    #[tokio::test]
    async fn test_quantity_change_and_unknown_line() {
        let app = Router::new().route(
            "/cart/:user/update/:product",
            put(|Path((_user, product)): Path<(String, String)>, Json(body): Json<Value>| async move {
                assert_eq!(body["quantity"], 3);
                Json(json!([cart_line(&product, 3)]))
            }),
        );
        let mut shop = logged_in(&spawn_backend(app).await, "user");
        shop.state.apply(Action::CartReplaced(serde_json::from_value(json!([cart_line("p1", 1)])).unwrap()));

        shop.update_cart_quantity("p1", 3).await.unwrap();
        assert_eq!(shop.state().cart().line("p1").unwrap().quantity, 3);

        let err = shop.update_cart_quantity("p9", 2).await.unwrap_err();
        assert!(matches!(err, StorefrontError::CartItemNotFound));
    }

    #[tokio::test]
    async fn test_update_profile_merges_and_persists() {
        let app = Router::new().route(
            "/profile/:user",
            put(|Json(body): Json<Value>| async move {
                assert_eq!(body["name"], "Asha Rao");
                Json(json!({"message": "Profile updated", "mobileNumber": "9123456780"}))
            }),
        );
        let base = spawn_backend(app).await;
        let store = Arc::new(MemoryTokenStore::new());
        let mut shop = logged_in(&base, "user");
        shop.store = store.clone() as Arc<dyn TokenStore>;

        let user = shop.update_profile(json!({"name": "Asha Rao"})).await.unwrap();
        assert_eq!(user.name, "Asha Rao");
        assert_eq!(user.mobile_number, "9123456780");
        assert_eq!(shop.state().user().unwrap(), &user);

        let saved: User = serde_json::from_str(&store.get(crate::session::token_store::USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(saved, user);
    }

    #[tokio::test]
    async fn test_add_product_reloads_catalog() {
        let app = Router::new()
            .route("/products/add", post(|| async { Json(json!({"message": "Product added"})) }))
            .route("/products", get(|| async { Json(json!([{"_id": "p7", "name": "Mug", "price": 199, "quantity": 10}])) }));
        let mut admin = logged_in(&spawn_backend(app).await, "admin");
        let draft = ProductDraft {
            name: "Mug".into(), description: "Ceramic".into(), category: "Kitchen".into(),
            price: Some(rust_decimal::Decimal::from(199)), original_price: None, quantity: Some(10),
            new_images: vec![crate::domain::aggregates::ImageUpload { file_name: "mug.png".into(), content_type: "image/png".into(), bytes: vec![1, 2, 3] }],
            retained_images: vec![],
        };

        admin.add_product(&draft).await.unwrap();
        assert_eq!(admin.state().products()[0].id, "p7");

        // Rejected locally: the unreachable update route is never hit.
        let err = admin.update_product("p7", &ProductDraft { price: None, ..draft }).await.unwrap_err();
        assert_eq!(err.field_errors().unwrap().get("price"), Some("Enter a valid price"));
    }

    #[tokio::test]
    async fn test_restore_from_corrupt_file_is_guest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{\"shopkartToken\": \"jw").unwrap();
        let store = Arc::new(crate::session::FileTokenStore::new(&path));
        let mut shop = Storefront::with_client(client_for("http://127.0.0.1:9", None), store, Config::default());

        assert!(!shop.restore().await.unwrap());
        assert!(!shop.state().is_logged_in());
    }
}
