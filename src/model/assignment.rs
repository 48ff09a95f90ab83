use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::ledger::serial;
use crate::types::new_id;

/// Units of a stock item held by a customer. There is at most one per (customer, item) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id:             String,
    #[serde(alias = "customer_id")]
    pub customer_id:    String,
    #[serde(alias = "productId", alias = "accessoryId", alias = "product_id", alias = "accessory_id", alias = "item_id")]
    pub item_id:        String,
    pub quantity:       u32,
    #[serde(default, alias = "serial_numbers", deserialize_with = "serial::deserialize")]
    pub serial_numbers: Vec<String>,
    #[serde(default = "Utc::now", alias = "assigned_at")]
    pub assigned_at:    DateTime<Utc>,
}

impl Assignment {
    pub fn new(customer_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            id:             new_id(),
            customer_id:    customer_id.into(),
            item_id:        item_id.into(),
            quantity:       0,
            serial_numbers: Vec::new(),
            assigned_at:    Utc::now(),
        }
    }

    /// Assigned units that carry no serial number.
    pub fn anonymous_units(&self) -> u32 {
        self.quantity.saturating_sub(self.serial_numbers.len() as u32)
    }

    pub fn holds_serial(&self, serial: &str) -> bool {
        self.serial_numbers.iter().any(|s| s == serial)
    }

    pub fn is_for(&self, customer_id: &str, item_id: &str) -> bool {
        self.customer_id == customer_id && self.item_id == item_id
    }
}
