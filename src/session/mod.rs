//! Session state.
//!
//! `AppState` is the single in-memory store for a storefront session. It is
//! only changed through [`AppState::apply`], so every mutation is one of the
//! [`Action`]s below.

pub mod notification;
pub mod token_store;

pub use notification::{Notification, NotificationLevel};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::{Address, Cart, Order, Product, StockItem, User};

#[derive(Clone, Debug)]
pub enum Action {
    LoggedIn { user: User, token: String },
    LoggedOut,
    UserUpdated(User),
    ProductsLoaded(Vec<Product>),
    CartReplaced(Cart),
    CartCleared,
    AddressesLoaded(Vec<Address>),
    AddressAdded(Address),
    OrdersLoaded(Vec<Order>),
    OrderReplaced(Order),
    StockLoaded(Vec<StockItem>),
    SearchChanged(String),
    Notify(Notification),
    Dismiss(Uuid),
    PruneNotifications(DateTime<Utc>),
}

#[derive(Clone, Debug, Default)]
pub struct AppState {
    user: Option<User>,
    token: Option<String>,
    products: Vec<Product>,
    cart: Cart,
    addresses: Vec<Address>,
    orders: Vec<Order>,
    stock: Vec<StockItem>,
    search: String,
    notifications: Vec<Notification>,
}

impl AppState {
    pub fn new() -> Self { Self::default() }

    pub fn user(&self) -> Option<&User> { self.user.as_ref() }
    pub fn token(&self) -> Option<&str> { self.token.as_deref() }
    pub fn is_logged_in(&self) -> bool { self.user.is_some() && self.token.is_some() }
    pub fn is_admin(&self) -> bool { self.user.as_ref().is_some_and(User::is_admin) }
    pub fn products(&self) -> &[Product] { &self.products }
    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn addresses(&self) -> &[Address] { &self.addresses }
    pub fn orders(&self) -> &[Order] { &self.orders }
    pub fn stock(&self) -> &[StockItem] { &self.stock }
    pub fn search(&self) -> &str { &self.search }
    pub fn notifications(&self) -> &[Notification] { &self.notifications }

    /// Products matching the header search box.
    pub fn searched_products(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.matches_header_search(&self.search)).collect()
    }

    pub fn apply(&mut self, action: Action) {
        debug!(action = action_name(&action), "Applying session action");
        match action {
            Action::LoggedIn { user, token } => {
                self.user = Some(user);
                self.token = Some(token);
            }
            Action::LoggedOut => {
                self.user = None;
                self.token = None;
                self.cart.clear();
                self.addresses.clear();
                self.orders.clear();
                self.stock.clear();
            }
            Action::UserUpdated(user) => self.user = Some(user),
            Action::ProductsLoaded(products) => self.products = products,
            Action::CartReplaced(cart) => self.cart = cart,
            Action::CartCleared => self.cart.clear(),
            Action::AddressesLoaded(addresses) => self.addresses = addresses,
            Action::AddressAdded(address) => self.addresses.push(address),
            Action::OrdersLoaded(orders) => self.orders = orders,
            Action::OrderReplaced(order) => match self.orders.iter_mut().find(|o| o.id == order.id) {
                Some(existing) => *existing = order,
                None => self.orders.push(order),
            },
            Action::StockLoaded(stock) => self.stock = stock,
            Action::SearchChanged(term) => self.search = term,
            Action::Notify(notification) => self.notifications.push(notification),
            Action::Dismiss(id) => self.notifications.retain(|n| n.id != id),
            Action::PruneNotifications(now) => self.notifications.retain(|n| !n.is_expired_at(now)),
        }
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::LoggedIn { .. } => "logged_in",
        Action::LoggedOut => "logged_out",
        Action::UserUpdated(_) => "user_updated",
        Action::ProductsLoaded(_) => "products_loaded",
        Action::CartReplaced(_) => "cart_replaced",
        Action::CartCleared => "cart_cleared",
        Action::AddressesLoaded(_) => "addresses_loaded",
        Action::AddressAdded(_) => "address_added",
        Action::OrdersLoaded(_) => "orders_loaded",
        Action::OrderReplaced(_) => "order_replaced",
        Action::StockLoaded(_) => "stock_loaded",
        Action::SearchChanged(_) => "search_changed",
        Action::Notify(_) => "notify",
        Action::Dismiss(_) => "dismiss",
        Action::PruneNotifications(_) => "prune_notifications",
    }
}

#[cfg(test)]
pub(crate) fn logged_in_state(cart: Cart, addresses: Vec<Address>) -> AppState {
    let mut state = AppState::new();
    let user = User { id: "u1".into(), name: "Asha Rao".into(), mobile_number: "9876543210".into(), role: Default::default() };
    state.apply(Action::LoggedIn { user, token: "jwt".into() });
    state.apply(Action::CartReplaced(cart));
    state.apply(Action::AddressesLoaded(addresses));
    state
}
