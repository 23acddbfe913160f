//! ShopKart storefront CLI: restores the saved session and prints the catalog.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopkart_storefront::domain::value_objects::format_inr;
use shopkart_storefront::session::FileTokenStore;
use shopkart_storefront::{Config, Storefront};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(api = %config.api_base_url, env = ?config.environment, "Starting ShopKart storefront");
    let store = Arc::new(FileTokenStore::new(config.session_file.clone()));
    let mut shop = Storefront::new(config, store)?;

    if shop.restore().await? {
        if let Some(user) = shop.state().user() {
            println!("Signed in as {} ({})", user.name, user.mobile_number);
        }
    }

    shop.load_products().await?;
    if let Some(term) = std::env::args().nth(1) {
        shop.set_search(&term);
    }

    let products = shop.state().searched_products();
    println!("{} product(s)", products.len());
    for p in products {
        let stock = if p.is_in_stock() { String::new() } else { " [out of stock]".to_string() };
        let discount = p.discount_percent().map(|d| format!(" ({d}% off)")).unwrap_or_default();
        println!("  {:<28} {:>12}{}{}  {}", p.name, p.price().to_string(), discount, stock, p.category);
    }

    if shop.state().is_logged_in() {
        let cart = shop.state().cart();
        println!(
            "Cart: {} item(s), total {}, you save {}",
            cart.unit_count(),
            cart.total(),
            format_inr(cart.savings().amount()),
        );
    }
    Ok(())
}
