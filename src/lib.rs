//! # click-store
//!
//! Inventory ledger for a small shop that sells serialized goods: phones, laptops, their accessories.
//!
//! Every unit of stock is in exactly one of three places:
//!
//! - **Available**: on the shelf, counted by the item's `stock` and listed in its serial numbers.
//! - **Assigned**: held by a customer through an [`Assignment`](model::Assignment).
//! - **In maintenance**: sent to a repair company as a [`MaintenanceItem`](model::MaintenanceItem).
//!
//! Units move between these places only through the operations of [`Inventory`]. Each operation reads the records it
//! needs, computes the new state with the pure functions of the [`ledger`] module and hands the result to the
//! [`Store`](store::Store) as a single [`ChangeSet`](changes::ChangeSet). A store applies a change set all at once or
//! not at all, so a failed operation never leaves stock, serials and assignments out of step.
//!
//! # Stores
//!
//! - [`MemoryStore`](store::MemoryStore) keeps everything in memory; good for tests.
//! - [`JsonFileStore`](store::JsonFileStore) keeps everything in one JSON file which is atomically replaced on every
//!   write.
//! - [`SqlStore`](db::SqlStore) maps records onto SQL tables with SeaORM. Enable the `sqlite` or `pg` feature to get a
//!   driver for it.
//!
//! # Example
//!
//! ```
//! use click_store::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> click_store::error::Result<()> {
//! let inventory = Inventory::new(MemoryStore::new());
//!
//! let phone = inventory
//!     .create_item(StockKind::Product, NewStockItem::new("Phone").with_serials(["A", "B", "C"]))
//!     .await?;
//! let ann = inventory.create_customer(Contact::new("Ann")).await?;
//!
//! let assignment = inventory.assign_by_serials(&ann.id, &phone.id, vec!["B".into()]).await?;
//! assert_eq!(assignment.quantity, 1);
//! assert_eq!(inventory.item(&phone.id).await?.serial_numbers, ["A", "C"]);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod changes;
pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod locks;
pub mod model;
pub mod store;
pub mod types;

#[doc(inline)]
pub use inventory::Inventory;
#[doc(inline)]
pub use store::Store;

pub mod prelude {
    pub use crate::config::InventoryConfig;
    pub use crate::config::OverdrawPolicy;
    pub use crate::config::WholeTransferPolicy;
    pub use crate::error::InventoryError;
    pub use crate::error::InvariantViolation;
    pub use crate::inventory::Inventory;
    pub use crate::model::*;
    pub use crate::store::JsonFileStore;
    pub use crate::store::MemoryStore;
    pub use crate::store::Store;
    pub use crate::types::*;
}
