//! Aggregates module
pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod stock;
pub mod user;

pub use address::{Address, AddressType, NewAddress};
pub use cart::{Cart, CartError, CartLine};
pub use order::{Order, OrderError, OrderFilter, OrderItem, OrderStatus, PaymentFilter, PaymentKind, ShippingDetails};
pub use product::{Availability, ImageUpload, Product, ProductDraft, ProductQuery, SortOrder};
pub use stock::{StockItem, StockSummary};
pub use user::{ResetPasswordForm, Role, User};
