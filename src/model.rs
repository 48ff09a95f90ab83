//! Domain records.
//!
//! Every record serializes to the camelCase wire shape used by the web front-end and accepts the snake_case
//! variant written by the SQL-backed servers. Serial numbers are accepted either as an array or as a legacy
//! `;`-delimited string.
pub mod assignment;
pub mod company;
pub mod contact;
pub mod customer;
pub mod maintenance_item;
pub mod stock_item;

pub use assignment::Assignment;
pub use company::Company;
pub use contact::Contact;
pub use contact::ContactPatch;
pub use customer::Customer;
pub use maintenance_item::MaintenanceItem;
pub use stock_item::NewStockItem;
pub use stock_item::StockItem;
pub use stock_item::StockItemPatch;

use crate::types::EntityKind;

/// A record with an opaque string ID.
pub trait Record: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

macro_rules! record {
    ($ty:ty, $kind:ident) => {
        impl Record for $ty {
            const KIND: EntityKind = EntityKind::$kind;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

record!(StockItem, Item);
record!(Customer, Customer);
record!(Company, Company);
record!(Assignment, Assignment);
record!(MaintenanceItem, Maintenance);
