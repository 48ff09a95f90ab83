use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use super::StockItem;
use crate::ledger::serial;
use crate::types::new_id;
use crate::types::StockKind;

/// A batch of units pulled out of circulation for repair.
///
/// Carries a snapshot of the source item so that it can be restored even when the original record is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceItem {
    pub id:                  String,
    #[serde(default, alias = "original_product_id")]
    pub original_product_id: Option<String>,
    #[serde(default)]
    pub kind:                StockKind,
    pub name:                String,
    #[serde(default)]
    pub description:         String,
    #[serde(default)]
    pub price:               Decimal,
    #[serde(default)]
    pub category:            String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand:               Option<String>,
    #[serde(default)]
    pub stock:               u32,
    #[serde(default, alias = "serial_numbers", deserialize_with = "serial::deserialize")]
    pub serial_numbers:      Vec<String>,
    #[serde(default, alias = "company_id")]
    pub company_id:          Option<String>,
    #[serde(default = "Utc::now", alias = "created_at")]
    pub created_at:          DateTime<Utc>,
}

impl MaintenanceItem {
    /// Start a batch from the snapshot of `item`. The batch holds no units yet.
    pub fn snapshot_of(item: &StockItem, company_id: Option<String>) -> Self {
        Self {
            id: new_id(),
            original_product_id: Some(item.id.clone()),
            kind: item.kind,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            category: item.category.clone(),
            brand: item.brand.clone(),
            stock: 0,
            serial_numbers: Vec::new(),
            company_id,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a stock item from the snapshot. Used when the original record no longer exists.
    pub fn to_stock_item(&self) -> StockItem {
        StockItem {
            id:             self.original_product_id.clone().unwrap_or_else(new_id),
            kind:           self.kind,
            name:           self.name.clone(),
            description:    self.description.clone(),
            price:          self.price,
            stock:          self.stock,
            category:       self.category.clone(),
            brand:          self.brand.clone(),
            serial_numbers: self.serial_numbers.clone(),
            created_at:     Utc::now(),
        }
    }

    pub fn holds_serial(&self, serial: &str) -> bool {
        self.serial_numbers.iter().any(|s| s == serial)
    }
}
