//! The lifecycle orchestrator.
//!
//! [`Inventory`] owns the rules of how units move between the three pools: the shelf of a stock item (Available), a
//! customer assignment (Assigned) and a maintenance batch (In-Maintenance). Every operation:
//!
//! 1. locks the records it is about to touch,
//! 2. verifies that the records it was given IDs of exist,
//! 3. computes the new state with the pure [`ledger`](crate::ledger) functions,
//! 4. hands a single [`ChangeSet`] to the store.
//!
//! Nothing is written when any step fails.
pub mod catalog;
pub mod lifecycle;
pub mod reports;

use std::sync::Arc;

use fieldx::fxstruct;
use tracing::debug;

use crate::changes::ChangeSet;
use crate::config::InventoryConfig;
use crate::config::OverdrawPolicy;
use crate::error::InventoryError;
use crate::error::Result;
use crate::locks::LockKey;
use crate::locks::LockSet;
use crate::locks::LockTable;
use crate::model::Assignment;
use crate::model::Company;
use crate::model::Customer;
use crate::model::MaintenanceItem;
use crate::model::StockItem;
use crate::store::Store;
use crate::types::EntityKind;

pub use reports::Inconsistency;
pub use reports::InventoryStats;
pub use reports::LowStock;

/// Records whose lock keys can only be learned by looking at stored data.
#[derive(Debug, Clone)]
enum Scope<'a> {
    /// A customer and every item it holds units of.
    CustomerItems(&'a str),
    /// An item and every customer holding its units.
    ItemCustomers(&'a str),
    /// A company and all batches it is responsible for.
    CompanyBatches(&'a str),
    /// Customer and item of an assignment.
    Assignment(&'a str),
    /// A maintenance batch and the item it came from.
    Batch(&'a str),
}

#[derive(Debug)]
#[fxstruct(sync, no_new)]
pub struct Inventory<S: Store> {
    #[fieldx(get(clone))]
    store:  Arc<S>,
    #[fieldx(get(copy))]
    config: InventoryConfig,
    locks:  LockTable,
}

impl<S: Store> Inventory<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, InventoryConfig::default())
    }

    pub fn with_config(store: S, config: InventoryConfig) -> Self {
        Self::shared(Arc::new(store), config)
    }

    /// Build an orchestrator over a store the caller keeps a handle of.
    pub fn shared(store: Arc<S>, config: InventoryConfig) -> Self {
        Self {
            store,
            config,
            locks: LockTable::new(),
        }
    }

    fn policy(&self) -> OverdrawPolicy {
        self.config.overdraw
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        debug!("writing {} change(s) to {}", changes.len(), self.store.name());
        self.store.write_back(changes).await
    }

    async fn discover(&self, scope: &Scope<'_>) -> Result<Vec<LockKey>> {
        Ok(match *scope {
            Scope::CustomerItems(id) => std::iter::once(LockKey::Customer(id.to_string()))
                .chain(
                    self.store
                        .assignments_for_customer(id)
                        .await?
                        .into_iter()
                        .map(|a| LockKey::Item(a.item_id)),
                )
                .collect(),
            Scope::ItemCustomers(id) => std::iter::once(LockKey::Item(id.to_string()))
                .chain(
                    self.store
                        .assignments_for_item(id)
                        .await?
                        .into_iter()
                        .map(|a| LockKey::Customer(a.customer_id)),
                )
                .collect(),
            Scope::CompanyBatches(id) => std::iter::once(LockKey::Company(id.to_string()))
                .chain(
                    self.store
                        .maintenance_for_company(id)
                        .await?
                        .into_iter()
                        .map(|m| LockKey::Maintenance(m.id)),
                )
                .collect(),
            Scope::Assignment(id) => match self.store.assignment(id).await? {
                Some(a) => vec![LockKey::Customer(a.customer_id), LockKey::Item(a.item_id)],
                None => vec![],
            },
            Scope::Batch(id) => {
                let mut keys = vec![LockKey::Maintenance(id.to_string())];
                if let Some(original) = self.store.maintenance_item(id).await?.and_then(|m| m.original_product_id) {
                    keys.push(LockKey::Item(original));
                }
                keys
            }
        })
    }

    /// Lock `keys` plus whatever `scope` currently refers to.
    ///
    /// The scope is looked at again once the locks are held. If it grew in the meantime, the locks are released and
    /// the bigger set is acquired.
    async fn lock(&self, keys: Vec<LockKey>, scope: Option<Scope<'_>>) -> Result<LockSet> {
        let Some(scope) = scope
        else {
            return Ok(self.locks.acquire(keys).await);
        };

        let mut wanted = keys;
        wanted.extend(self.discover(&scope).await?);
        loop {
            let set = self.locks.acquire(wanted.clone()).await;
            let current = self.discover(&scope).await?;
            if set.covers_all(&current) {
                return Ok(set);
            }
            debug!("lock scope {scope:?} changed while waiting, retrying");
            drop(set);
            wanted.extend(current);
        }
    }

    async fn require_item(&self, id: &str) -> Result<StockItem> {
        self.store
            .item(id)
            .await?
            .ok_or_else(|| InventoryError::not_found(EntityKind::Item, id))
    }

    async fn require_customer(&self, id: &str) -> Result<Customer> {
        self.store
            .customer(id)
            .await?
            .ok_or_else(|| InventoryError::not_found(EntityKind::Customer, id))
    }

    async fn require_company(&self, id: &str) -> Result<Company> {
        self.store
            .company(id)
            .await?
            .ok_or_else(|| InventoryError::not_found(EntityKind::Company, id))
    }

    async fn require_assignment(&self, id: &str) -> Result<Assignment> {
        self.store
            .assignment(id)
            .await?
            .ok_or_else(|| InventoryError::not_found(EntityKind::Assignment, id))
    }

    async fn require_batch(&self, id: &str) -> Result<MaintenanceItem> {
        self.store
            .maintenance_item(id)
            .await?
            .ok_or_else(|| InventoryError::not_found(EntityKind::Maintenance, id))
    }

    /// The assignment of `item_id` to `customer_id`, if any.
    async fn pair(&self, customer_id: &str, item_id: &str) -> Result<Option<Assignment>> {
        let held = self.store.assignments_for_customer(customer_id).await?;
        Ok(crate::ledger::assignment::find_pair(&held, customer_id, item_id).cloned())
    }

    /// Serialized items must keep stock and serials in step. Legacy data is tolerated when clamping.
    fn check_item(&self, item: &StockItem) -> Result<()> {
        if self.policy() == OverdrawPolicy::Reject {
            item.check_consistency()?;
        }
        Ok(())
    }
}
