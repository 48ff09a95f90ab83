use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use crate::error::InvariantViolation;
use crate::error::Result;
use crate::ledger::serial;
use crate::types::new_id;
use crate::types::StockKind;

/// A product or an accessory together with its on-shelf stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id:             String,
    #[serde(default)]
    pub kind:           StockKind,
    pub name:           String,
    #[serde(default)]
    pub description:    String,
    #[serde(default)]
    pub price:          Decimal,
    #[serde(default)]
    pub stock:          u32,
    #[serde(default)]
    pub category:       String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand:          Option<String>,
    #[serde(default, alias = "serial_numbers", deserialize_with = "serial::deserialize")]
    pub serial_numbers: Vec<String>,
    #[serde(default = "Utc::now", alias = "created_at")]
    pub created_at:     DateTime<Utc>,
}

impl StockItem {
    /// Serialized items track every unit by its serial number.
    pub fn is_serialized(&self) -> bool {
        !self.serial_numbers.is_empty()
    }

    /// Units on the shelf that have no serial number.
    pub fn anonymous_units(&self) -> u32 {
        self.stock.saturating_sub(self.serial_numbers.len() as u32)
    }

    pub fn holds_serial(&self, serial: &str) -> bool {
        self.serial_numbers.iter().any(|s| s == serial)
    }

    /// Price of the whole shelf. `None` when it doesn't fit a decimal.
    pub fn value(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.stock))
    }

    pub fn check_consistency(&self) -> Result<(), InvariantViolation> {
        if self.is_serialized() && self.stock as usize != self.serial_numbers.len() {
            return Err(InvariantViolation::StockMismatch {
                item_id: self.id.clone(),
                stock:   self.stock,
                serials: self.serial_numbers.len(),
            });
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: StockItemPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(brand) = patch.brand {
            self.brand = Some(brand).filter(|b| !b.is_empty());
        }
        match (patch.stock, patch.serial_numbers) {
            (stock, Some(serials)) => {
                self.stock = stock.unwrap_or(serials.len() as u32);
                self.serial_numbers = serials;
            }
            (Some(stock), None) => self.stock = stock,
            (None, None) => (),
        }
    }
}

/// Input for creating a stock item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStockItem {
    pub name:           String,
    pub description:    String,
    pub price:          Decimal,
    /// Defaults to the number of serials when omitted.
    pub stock:          Option<u32>,
    pub category:       String,
    pub brand:          Option<String>,
    #[serde(alias = "serial_numbers", deserialize_with = "serial::deserialize")]
    pub serial_numbers: Vec<String>,
}

impl NewStockItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_serials<S: Into<String>>(mut self, serials: impl IntoIterator<Item = S>) -> Self {
        self.serial_numbers = serials.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the input and turn it into a record of the given kind.
    pub fn into_item(self, kind: StockKind) -> Result<StockItem> {
        let serial_numbers = serial::normalize(self.serial_numbers)?;
        let stock = self.stock.unwrap_or(serial_numbers.len() as u32);

        let item = StockItem {
            id: new_id(),
            kind,
            name: self.name,
            description: self.description,
            price: self.price,
            stock,
            category: self.category,
            brand: self.brand.filter(|b| !b.is_empty()),
            serial_numbers,
            created_at: Utc::now(),
        };
        item.check_consistency()?;
        Ok(item)
    }
}

/// Partial update of a stock item. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockItemPatch {
    pub name:           Option<String>,
    pub description:    Option<String>,
    pub price:          Option<Decimal>,
    pub stock:          Option<u32>,
    pub category:       Option<String>,
    /// An empty string clears the brand.
    pub brand:          Option<String>,
    pub serial_numbers: Option<Vec<String>>,
}

impl StockItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
