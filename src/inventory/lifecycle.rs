//! Transfers of units between the Available, Assigned and In-Maintenance pools.
use tracing::info;
use tracing::instrument;
use tracing::warn;

use super::Inventory;
use super::Scope;
use crate::changes::ChangeSet;
use crate::config::OverdrawPolicy;
use crate::config::WholeTransferPolicy;
use crate::error::InvariantViolation;
use crate::error::InventoryError;
use crate::error::Result;
use crate::ledger::assignment;
use crate::ledger::maintenance;
use crate::ledger::serial;
use crate::ledger::SerialHolder;
use crate::ledger::Taken;
use crate::locks::LockKey;
use crate::model::Assignment;
use crate::model::MaintenanceItem;
use crate::model::StockItem;
use crate::store::Store;
use crate::types::EntityKind;

fn require_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(InventoryError::invalid("quantity must be positive"));
    }
    Ok(())
}

fn require_serials(serials: Vec<String>) -> Result<Vec<String>> {
    let serials = serial::normalize(serials)?;
    if serials.is_empty() {
        return Err(InventoryError::invalid("no serial numbers given"));
    }
    Ok(serials)
}

/// With clamping, a transfer that found none of the requested serials still has to fail.
fn nothing_moved(holder: &impl SerialHolder, serials: Vec<String>) -> InventoryError {
    InvariantViolation::MissingSerials {
        holder: holder.holder(),
        serials,
    }
    .into()
}

impl<S: Store> Inventory<S> {
    /// Assign `quantity` units of an item to a customer. Serials are picked in stored order.
    #[instrument(level = "trace", skip(self))]
    pub async fn assign_by_quantity(&self, customer_id: &str, item_id: &str, quantity: u32) -> Result<Assignment> {
        require_quantity(quantity)?;
        let _locks = self
            .lock(
                vec![
                    LockKey::Customer(customer_id.to_string()),
                    LockKey::Item(item_id.to_string()),
                ],
                None,
            )
            .await?;

        self.require_customer(customer_id).await?;
        let mut item = self.require_item(item_id).await?;
        let existing = self.pair(customer_id, item_id).await?;

        let taken = serial::take_units(&mut item, quantity, self.policy())?;
        if taken.units() < quantity {
            warn!("only {} of {quantity} unit(s) of {} available, clamped", taken.units(), item.holder());
        }
        let is_new = existing.is_none();
        let assigned = assignment::assign(existing, customer_id, item_id, taken);

        let mut changes = ChangeSet::new();
        changes.items.update(item)?;
        changes.assignments.upsert(assigned.clone(), is_new)?;
        self.commit(changes).await?;

        info!("assigned {quantity} unit(s) of item '{item_id}' to customer '{customer_id}'");
        Ok(assigned)
    }

    /// Assign the named serials of an item to a customer.
    #[instrument(level = "trace", skip(self))]
    pub async fn assign_by_serials(&self, customer_id: &str, item_id: &str, serials: Vec<String>) -> Result<Assignment> {
        let serials = require_serials(serials)?;
        let _locks = self
            .lock(
                vec![
                    LockKey::Customer(customer_id.to_string()),
                    LockKey::Item(item_id.to_string()),
                ],
                None,
            )
            .await?;

        self.require_customer(customer_id).await?;
        let mut item = self.require_item(item_id).await?;
        let existing = self.pair(customer_id, item_id).await?;

        let moved = serial::remove_serials(&mut item, &serials, self.policy())?;
        if moved.is_empty() {
            return Err(nothing_moved(&item, serials));
        }
        let count = moved.len();
        let is_new = existing.is_none();
        let assigned = assignment::assign(
            existing,
            customer_id,
            item_id,
            Taken {
                serials:   moved,
                anonymous: 0,
            },
        );

        let mut changes = ChangeSet::new();
        changes.items.update(item)?;
        changes.assignments.upsert(assigned.clone(), is_new)?;
        self.commit(changes).await?;

        info!("assigned {count} serial(s) of item '{item_id}' to customer '{customer_id}'");
        Ok(assigned)
    }

    /// Take the named serials back from a customer and put them on the item's shelf.
    ///
    /// Returns the remaining assignment, or `None` if it was emptied and deleted.
    #[instrument(level = "trace", skip(self))]
    pub async fn return_to_stock(
        &self,
        customer_id: &str,
        item_id: &str,
        serials: Vec<String>,
    ) -> Result<Option<Assignment>> {
        let serials = require_serials(serials)?;
        let _locks = self
            .lock(
                vec![
                    LockKey::Customer(customer_id.to_string()),
                    LockKey::Item(item_id.to_string()),
                ],
                None,
            )
            .await?;

        self.require_customer(customer_id).await?;
        let mut item = self.require_item(item_id).await?;
        let mut held = self
            .pair(customer_id, item_id)
            .await?
            .ok_or_else(|| InventoryError::not_found(EntityKind::Assignment, format!("{customer_id}/{item_id}")))?;

        let back = assignment::partial_return(&mut held, &serials, self.policy())?;
        if back.is_empty() {
            return Err(nothing_moved(&held, serials));
        }
        let count = back.len();
        serial::return_serials(&mut item, back);

        info!("customer '{customer_id}' returned {count} serial(s) of item '{item_id}'");
        self.settle(item, held).await
    }

    /// Take back `quantity` units that were assigned without serial numbers.
    #[instrument(level = "trace", skip(self))]
    pub async fn return_quantity(&self, customer_id: &str, item_id: &str, quantity: u32) -> Result<Option<Assignment>> {
        require_quantity(quantity)?;
        let _locks = self
            .lock(
                vec![
                    LockKey::Customer(customer_id.to_string()),
                    LockKey::Item(item_id.to_string()),
                ],
                None,
            )
            .await?;

        self.require_customer(customer_id).await?;
        let mut item = self.require_item(item_id).await?;
        let mut held = self
            .pair(customer_id, item_id)
            .await?
            .ok_or_else(|| InventoryError::not_found(EntityKind::Assignment, format!("{customer_id}/{item_id}")))?;

        let back = assignment::return_quantity(&mut held, quantity, self.policy())?;
        serial::return_anonymous(&mut item, back);
        self.check_item(&item)?;

        info!("customer '{customer_id}' returned {back} unit(s) of item '{item_id}'");
        self.settle(item, held).await
    }

    async fn settle(&self, item: StockItem, held: Assignment) -> Result<Option<Assignment>> {
        let mut changes = ChangeSet::new();
        changes.items.update(item)?;
        let remaining = if assignment::is_settled(&held) {
            changes.assignments.delete(held.id)?;
            None
        }
        else {
            changes.assignments.update(held.clone())?;
            Some(held)
        };
        self.commit(changes).await?;
        Ok(remaining)
    }

    /// Delete an assignment and put everything it held back on the item's shelf.
    ///
    /// Returns the updated item, or `None` if the assignment referenced an item that no longer exists.
    #[instrument(level = "trace", skip(self))]
    pub async fn remove_assignment(&self, assignment_id: &str) -> Result<Option<StockItem>> {
        let _locks = self.lock(vec![], Some(Scope::Assignment(assignment_id))).await?;

        let mut held = self.require_assignment(assignment_id).await?;
        let item = self.store.item(&held.item_id).await?;
        let taken = assignment::unassign(&mut held);

        let mut changes = ChangeSet::new();
        changes.assignments.delete(held.id.clone())?;
        let item = match item {
            Some(mut item) => {
                serial::put(&mut item, taken);
                self.check_item(&item)?;
                changes.items.update(item.clone())?;
                Some(item)
            }
            None => {
                warn!(
                    "assignment '{assignment_id}' refers to missing item '{}', {} unit(s) dropped",
                    held.item_id,
                    taken.units()
                );
                None
            }
        };
        self.commit(changes).await?;

        info!("removed assignment '{assignment_id}' of customer '{}'", held.customer_id);
        Ok(item)
    }

    /// Send units of an item to maintenance.
    ///
    /// With serials, exactly those units go into a new batch. Serials may be on the shelf or held by customers; in the
    /// latter case they are taken out of the assignments first. Without serials the whole item becomes a batch and
    /// the item record is deleted; what happens to its assignments is decided by
    /// [`WholeTransferPolicy`](crate::config::WholeTransferPolicy).
    #[instrument(level = "trace", skip(self))]
    pub async fn send_to_maintenance(
        &self,
        item_id: &str,
        serials: Option<Vec<String>>,
        company_id: Option<&str>,
    ) -> Result<MaintenanceItem> {
        let serials = serials.map(require_serials).transpose()?;
        let mut keys = vec![LockKey::Item(item_id.to_string())];
        keys.extend(company_id.map(|c| LockKey::Company(c.to_string())));
        let _locks = self.lock(keys, Some(Scope::ItemCustomers(item_id))).await?;

        let mut item = self.require_item(item_id).await?;
        if let Some(company_id) = company_id {
            self.require_company(company_id).await?;
        }
        let company_id = company_id.map(String::from);
        let holders = self.store.assignments_for_item(item_id).await?;
        let mut changes = ChangeSet::new();

        let batch = match serials {
            None => {
                if !holders.is_empty() {
                    if self.config.whole_transfer == WholeTransferPolicy::RejectAssigned {
                        return Err(InvariantViolation::OutstandingAssignments {
                            kind:  EntityKind::Item,
                            id:    item_id.to_string(),
                            count: holders.len(),
                        }
                        .into());
                    }
                    warn!(
                        "whole transfer of item '{item_id}' drops {} customer assignment(s)",
                        holders.len()
                    );
                }
                for held in holders {
                    changes.assignments.delete(held.id)?;
                }
                changes.items.delete(item_id)?;
                maintenance::send_whole(item, company_id)
            }
            Some(serials) => {
                let missing = holders
                    .iter()
                    .fold(serial::missing_from(&item.serial_numbers, &serials), |missing, held| {
                        serial::missing_from(&held.serial_numbers, &missing)
                    });
                if !missing.is_empty() && self.policy() == OverdrawPolicy::Reject {
                    return Err(InvariantViolation::MissingSerials {
                        holder:  item.holder(),
                        serials: missing,
                    }
                    .into());
                }
                let moved: Vec<String> = serials.into_iter().filter(|s| !missing.contains(s)).collect();
                if moved.is_empty() {
                    return Err(nothing_moved(&item, missing));
                }

                let on_shelf: Vec<String> = moved.iter().filter(|s| item.holds_serial(s)).cloned().collect();
                serial::remove_serials(&mut item, &on_shelf, OverdrawPolicy::Reject)?;
                for mut held in holders {
                    let taken: Vec<String> = moved.iter().filter(|s| held.holds_serial(s)).cloned().collect();
                    if taken.is_empty() {
                        continue;
                    }
                    assignment::partial_return(&mut held, &taken, OverdrawPolicy::Reject)?;
                    info!(
                        "{} serial(s) of item '{item_id}' taken from customer '{}' for maintenance",
                        taken.len(),
                        held.customer_id
                    );
                    if assignment::is_settled(&held) {
                        changes.assignments.delete(held.id)?;
                    }
                    else {
                        changes.assignments.update(held)?;
                    }
                }

                let batch = maintenance::open_batch(
                    &item,
                    company_id,
                    Taken {
                        serials:   moved,
                        anonymous: 0,
                    },
                );
                changes.items.update(item)?;
                batch
            }
        };

        changes.maintenance.insert(batch.clone())?;
        self.commit(changes).await?;

        info!("sent {} unit(s) of item '{item_id}' to maintenance as '{}'", batch.stock, batch.id);
        Ok(batch)
    }

    /// Send `quantity` units from the shelf to maintenance. Serials are picked in stored order.
    #[instrument(level = "trace", skip(self))]
    pub async fn send_quantity_to_maintenance(
        &self,
        item_id: &str,
        quantity: u32,
        company_id: Option<&str>,
    ) -> Result<MaintenanceItem> {
        require_quantity(quantity)?;
        let mut keys = vec![LockKey::Item(item_id.to_string())];
        keys.extend(company_id.map(|c| LockKey::Company(c.to_string())));
        let _locks = self.lock(keys, None).await?;

        let mut item = self.require_item(item_id).await?;
        if let Some(company_id) = company_id {
            self.require_company(company_id).await?;
        }

        let taken = serial::take_units(&mut item, quantity, self.policy())?;
        let batch = maintenance::open_batch(&item, company_id.map(String::from), taken);

        let mut changes = ChangeSet::new();
        changes.items.update(item)?;
        changes.maintenance.insert(batch.clone())?;
        self.commit(changes).await?;

        info!("sent {} unit(s) of item '{item_id}' to maintenance as '{}'", batch.stock, batch.id);
        Ok(batch)
    }

    /// Put a maintenance batch back on the shelf.
    ///
    /// Units join the original item when it still exists; otherwise the item is recreated from the batch snapshot.
    #[instrument(level = "trace", skip(self))]
    pub async fn restore_from_maintenance(&self, maintenance_id: &str) -> Result<StockItem> {
        let _locks = self
            .lock(vec![LockKey::Serials], Some(Scope::Batch(maintenance_id)))
            .await?;

        let batch = self.require_batch(maintenance_id).await?;
        let original = match batch.original_product_id {
            Some(ref id) => self.store.item(id).await?,
            None => None,
        };
        let recreated = original.is_none();
        if let Some(ref item) = original {
            let dropped = maintenance::shelved_serials(&batch, item);
            if !dropped.is_empty() && self.policy() == OverdrawPolicy::Clamp {
                warn!(
                    "serial(s) {} of maintenance '{maintenance_id}' are already on the shelf of '{}', dropped",
                    dropped.join(", "),
                    item.id
                );
            }
        }
        let item = maintenance::restore(&batch, original, self.policy())?;
        self.check_item(&item)?;

        let mut changes = ChangeSet::new();
        changes.maintenance.delete(maintenance_id)?;
        changes.items.upsert(item.clone(), recreated)?;
        self.commit(changes).await?;

        info!(
            "restored {} unit(s) from maintenance '{maintenance_id}' to item '{}'{}",
            batch.stock,
            item.id,
            if recreated { " (recreated)" } else { "" }
        );
        Ok(item)
    }

    /// Write a maintenance batch off. Its units leave the inventory.
    #[instrument(level = "trace", skip(self))]
    pub async fn discard_maintenance(&self, maintenance_id: &str) -> Result<MaintenanceItem> {
        let _locks = self
            .lock(vec![LockKey::Maintenance(maintenance_id.to_string())], None)
            .await?;

        let batch = self.require_batch(maintenance_id).await?;
        let mut changes = ChangeSet::new();
        changes.maintenance.delete(maintenance_id)?;
        self.commit(changes).await?;

        info!("discarded maintenance '{maintenance_id}' with {} unit(s)", batch.stock);
        Ok(batch)
    }
}
