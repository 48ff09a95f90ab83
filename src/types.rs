use std::fmt::Display;

use sea_orm::DeriveActiveEnum;
use sea_orm::EnumIter;
use serde::Deserialize;
use serde::Serialize;

/// Display category of a stock-holding record. Products and accessories share one shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum StockKind {
    #[default]
    #[sea_orm(string_value = "product")]
    Product,
    #[sea_orm(string_value = "accessory")]
    Accessory,
}

impl Display for StockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockKind::Product => write!(f, "product"),
            StockKind::Accessory => write!(f, "accessory"),
        }
    }
}

/// The three mutually exclusive places a unit of stock can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pool {
    Available,
    Assigned,
    InMaintenance,
}

impl Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pool::Available => write!(f, "available"),
            Pool::Assigned => write!(f, "assigned"),
            Pool::InMaintenance => write!(f, "in maintenance"),
        }
    }
}

/// Record types known to the store. Used in error messages and lock keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Item,
    Customer,
    Company,
    Assignment,
    Maintenance,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Item => write!(f, "item"),
            EntityKind::Customer => write!(f, "customer"),
            EntityKind::Company => write!(f, "company"),
            EntityKind::Assignment => write!(f, "assignment"),
            EntityKind::Maintenance => write!(f, "maintenance item"),
        }
    }
}

/// Where a serial number was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialLocation {
    pub serial: String,
    pub pool: Pool,
    /// Item ID for [`Pool::Available`], assignment ID for [`Pool::Assigned`], maintenance ID for
    /// [`Pool::InMaintenance`].
    pub holder_id: String,
    /// The stock item the serial belongs to, when known.
    pub item_id: Option<String>,
    /// Set for [`Pool::Assigned`] only.
    pub customer_id: Option<String>,
}

impl Display for SerialLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.pool {
            Pool::Available => write!(f, "{} on the shelf of item '{}'", self.serial, self.holder_id),
            Pool::Assigned => write!(
                f,
                "{} assigned to customer '{}' ({})",
                self.serial,
                self.customer_id.as_deref().unwrap_or("?"),
                self.holder_id
            ),
            Pool::InMaintenance => write!(f, "{} in maintenance batch '{}'", self.serial, self.holder_id),
        }
    }
}

/// Generate a fresh opaque record ID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
