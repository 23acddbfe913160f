//! Inventory levels as managed from the admin back-office.

use serde::{Deserialize, Serialize};

/// Items below this quantity count as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    #[serde(alias = "productId")]
    pub product_id: String,
    #[serde(alias = "productName", default)]
    pub product_name: Option<String>,
    pub quantity: u32,
}

impl StockItem {
    pub fn is_low(&self) -> bool { self.quantity < LOW_STOCK_THRESHOLD }
    pub fn is_out(&self) -> bool { self.quantity == 0 }
}

/// Dashboard counters over a stock listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StockSummary {
    pub total: usize,
    pub low: usize,
    pub out: usize,
}

impl StockSummary {
    pub fn of(items: &[StockItem]) -> Self {
        Self {
            total: items.len(),
            low: items.iter().filter(|i| i.is_low()).count(),
            out: items.iter().filter(|i| i.is_out()).count(),
        }
    }
}
