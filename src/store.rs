//! The persistence collaborator.
//!
//! A store only loads records and applies [`ChangeSet`]s. It knows nothing about stock rules: those live in
//! [`Inventory`](crate::inventory::Inventory).
pub mod json;
pub mod memory;

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::changes::ChangeSet;
use crate::changes::Update;
use crate::changes::UpdateQueue;
use crate::error::PersistenceError;
use crate::error::Result;
use crate::model::Assignment;
use crate::model::Company;
use crate::model::Customer;
use crate::model::MaintenanceItem;
use crate::model::Record;
use crate::model::StockItem;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait Store: Debug + Send + Sync + 'static {
    /// Short backend name for logs and error messages.
    fn name(&self) -> &'static str;

    async fn items(&self) -> Result<Vec<StockItem>>;
    async fn item(&self, id: &str) -> Result<Option<StockItem>>;
    async fn customers(&self) -> Result<Vec<Customer>>;
    async fn customer(&self, id: &str) -> Result<Option<Customer>>;
    async fn companies(&self) -> Result<Vec<Company>>;
    async fn company(&self, id: &str) -> Result<Option<Company>>;
    async fn assignments(&self) -> Result<Vec<Assignment>>;
    async fn assignment(&self, id: &str) -> Result<Option<Assignment>>;
    async fn maintenance_items(&self) -> Result<Vec<MaintenanceItem>>;
    async fn maintenance_item(&self, id: &str) -> Result<Option<MaintenanceItem>>;

    async fn assignments_for_customer(&self, customer_id: &str) -> Result<Vec<Assignment>> {
        Ok(self
            .assignments()
            .await?
            .into_iter()
            .filter(|a| a.customer_id == customer_id)
            .collect())
    }

    async fn assignments_for_item(&self, item_id: &str) -> Result<Vec<Assignment>> {
        Ok(self
            .assignments()
            .await?
            .into_iter()
            .filter(|a| a.item_id == item_id)
            .collect())
    }

    async fn maintenance_for_company(&self, company_id: &str) -> Result<Vec<MaintenanceItem>> {
        Ok(self
            .maintenance_items()
            .await?
            .into_iter()
            .filter(|m| m.company_id.as_deref() == Some(company_id))
            .collect())
    }

    /// Apply all changes atomically.
    async fn write_back(&self, changes: ChangeSet) -> Result<()>;
}

/// A complete image of the stored data. Used by the in-memory and the JSON file stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub items:       Vec<StockItem>,
    pub customers:   Vec<Customer>,
    pub companies:   Vec<Company>,
    pub assignments: Vec<Assignment>,
    pub maintenance: Vec<MaintenanceItem>,
}

impl Snapshot {
    /// Apply changes to a copy of this snapshot. `self` stays untouched if any change can't be applied.
    pub fn applied(&self, store: &'static str, changes: ChangeSet) -> Result<Snapshot, PersistenceError> {
        let mut next = self.clone();
        apply_queue(store, &mut next.items, changes.items)?;
        apply_queue(store, &mut next.customers, changes.customers)?;
        apply_queue(store, &mut next.companies, changes.companies)?;
        apply_queue(store, &mut next.assignments, changes.assignments)?;
        apply_queue(store, &mut next.maintenance, changes.maintenance)?;
        Ok(next)
    }

    pub(crate) fn find<'a, T: Record>(records: &'a [T], id: &str) -> Option<&'a T> {
        records.iter().find(|r| r.id() == id)
    }
}

fn apply_queue<T: Record>(
    store: &'static str,
    records: &mut Vec<T>,
    queue: UpdateQueue<T>,
) -> Result<(), PersistenceError> {
    for (id, update) in queue {
        let pos = records.iter().position(|r| r.id() == id);
        match (update, pos) {
            (Update::Insert(_), Some(_)) => {
                return Err(PersistenceError::DuplicateKey {
                    store,
                    kind: T::KIND,
                    id,
                })
            }
            (Update::Insert(record), None) => records.push(record),
            (Update::Update(record), Some(pos)) => records[pos] = record,
            (Update::Update(_), None) => {
                return Err(PersistenceError::MissingRow {
                    store,
                    kind: T::KIND,
                    id,
                })
            }
            (Update::Delete, Some(pos)) => {
                records.remove(pos);
            }
            // Deleting what isn't there is not an error, same as in SQL.
            (Update::Delete, None) => (),
        }
    }
    Ok(())
}
