use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::instrument;

use super::Snapshot;
use super::Store;
use crate::changes::ChangeSet;
use crate::error::Result;
use crate::model::Assignment;
use crate::model::Company;
use crate::model::Customer;
use crate::model::MaintenanceItem;
use crate::model::StockItem;

/// Volatile store. Mostly useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.data.read().clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn items(&self) -> Result<Vec<StockItem>> {
        Ok(self.data.read().items.clone())
    }

    async fn item(&self, id: &str) -> Result<Option<StockItem>> {
        Ok(Snapshot::find(&self.data.read().items, id).cloned())
    }

    async fn customers(&self) -> Result<Vec<Customer>> {
        Ok(self.data.read().customers.clone())
    }

    async fn customer(&self, id: &str) -> Result<Option<Customer>> {
        Ok(Snapshot::find(&self.data.read().customers, id).cloned())
    }

    async fn companies(&self) -> Result<Vec<Company>> {
        Ok(self.data.read().companies.clone())
    }

    async fn company(&self, id: &str) -> Result<Option<Company>> {
        Ok(Snapshot::find(&self.data.read().companies, id).cloned())
    }

    async fn assignments(&self) -> Result<Vec<Assignment>> {
        Ok(self.data.read().assignments.clone())
    }

    async fn assignment(&self, id: &str) -> Result<Option<Assignment>> {
        Ok(Snapshot::find(&self.data.read().assignments, id).cloned())
    }

    async fn maintenance_items(&self) -> Result<Vec<MaintenanceItem>> {
        Ok(self.data.read().maintenance.clone())
    }

    async fn maintenance_item(&self, id: &str) -> Result<Option<MaintenanceItem>> {
        Ok(Snapshot::find(&self.data.read().maintenance, id).cloned())
    }

    #[instrument(level = "trace", skip(changes), fields(changes = changes.len()))]
    async fn write_back(&self, changes: ChangeSet) -> Result<()> {
        let mut data = self.data.write();
        let next = data.applied(self.name(), changes)?;
        *data = next;
        Ok(())
    }
}
