//! Creating, updating, deleting and listing records.
//!
//! Deletes cascade: a deleted customer gives its units back to the shelf, a deleted item takes its assignments with
//! it, and a deleted company is unlinked from the maintenance batches it was responsible for.
use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::info;
use tracing::instrument;

use super::Inventory;
use super::Scope;
use crate::changes::ChangeSet;
use crate::error::InvariantViolation;
use crate::error::InventoryError;
use crate::error::Result;
use crate::ledger::assignment;
use crate::ledger::serial;
use crate::locks::LockKey;
use crate::model::Assignment;
use crate::model::Company;
use crate::model::Contact;
use crate::model::ContactPatch;
use crate::model::Customer;
use crate::model::MaintenanceItem;
use crate::model::NewStockItem;
use crate::model::StockItem;
use crate::model::StockItemPatch;
use crate::store::Store;
use crate::types::EntityKind;
use crate::types::Pool;
use crate::types::SerialLocation;
use crate::types::StockKind;

fn check_price(price: &Decimal) -> Result<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(InventoryError::invalid(format!("price must not be negative, got {price}")));
    }
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(InventoryError::invalid("name must not be empty"));
    }
    Ok(())
}

impl<S: Store> Inventory<S> {
    /// Fail if any of `serials` is tracked anywhere except on the shelf of `except_item`.
    async fn check_serials_free(&self, serials: &[String], except_item: Option<&str>) -> Result<()> {
        if serials.is_empty() {
            return Ok(());
        }
        let wanted: HashSet<&str> = serials.iter().map(String::as_str).collect();
        let in_use: Vec<String> = self
            .serial_locations()
            .await?
            .into_iter()
            .filter(|loc| wanted.contains(loc.serial.as_str()))
            .filter(|loc| !(loc.pool == Pool::Available && Some(loc.holder_id.as_str()) == except_item))
            .map(|loc| loc.serial)
            .collect();

        if !in_use.is_empty() {
            let mut in_use = in_use;
            in_use.sort_unstable();
            in_use.dedup();
            return Err(InvariantViolation::SerialsInUse { serials: in_use }.into());
        }
        Ok(())
    }

    /// Units handed out by quantity can't come back to a serialized shelf.
    async fn check_no_anonymous_holders(&self, item_id: &str) -> Result<()> {
        let anonymous: Vec<Assignment> = self
            .store
            .assignments_for_item(item_id)
            .await?
            .into_iter()
            .filter(|a| a.anonymous_units() > 0)
            .collect();
        if !anonymous.is_empty() {
            return Err(InvariantViolation::OutstandingAssignments {
                kind:  EntityKind::Item,
                id:    item_id.to_string(),
                count: anonymous.len(),
            }
            .into());
        }
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn create_item(&self, kind: StockKind, new: NewStockItem) -> Result<StockItem> {
        check_name(&new.name)?;
        check_price(&new.price)?;
        let item = new.into_item(kind)?;
        let _locks = if item.is_serialized() {
            Some(self.lock(vec![LockKey::Serials], None).await?)
        }
        else {
            None
        };
        self.check_serials_free(&item.serial_numbers, None).await?;

        let mut changes = ChangeSet::new();
        changes.items.insert(item.clone())?;
        self.commit(changes).await?;

        info!("created {kind} '{}' ({}) with stock {}", item.name, item.id, item.stock);
        Ok(item)
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn update_item(&self, id: &str, patch: StockItemPatch) -> Result<StockItem> {
        if let Some(ref name) = patch.name {
            check_name(name)?;
        }
        if let Some(ref price) = patch.price {
            check_price(price)?;
        }
        let patch = StockItemPatch {
            serial_numbers: patch.serial_numbers.map(serial::normalize).transpose()?,
            ..patch
        };

        let _locks = match patch.serial_numbers {
            Some(_) => self.lock(vec![LockKey::Serials], Some(Scope::ItemCustomers(id))).await?,
            None => self.lock(vec![LockKey::Item(id.to_string())], None).await?,
        };
        let mut item = self.require_item(id).await?;
        if let Some(ref serials) = patch.serial_numbers {
            self.check_serials_free(serials, Some(id)).await?;
            if !serials.is_empty() {
                self.check_no_anonymous_holders(id).await?;
            }
        }
        item.apply(patch);
        item.check_consistency()?;

        let mut changes = ChangeSet::new();
        changes.items.update(item.clone())?;
        self.commit(changes).await?;
        Ok(item)
    }

    /// Delete an item together with every assignment of it.
    #[instrument(level = "trace", skip(self))]
    pub async fn delete_item(&self, id: &str) -> Result<StockItem> {
        let _locks = self.lock(vec![], Some(Scope::ItemCustomers(id))).await?;
        let item = self.require_item(id).await?;
        let holders = self.store.assignments_for_item(id).await?;

        let mut changes = ChangeSet::new();
        changes.items.delete(id)?;
        for held in &holders {
            changes.assignments.delete(held.id.clone())?;
        }
        self.commit(changes).await?;

        info!("deleted {} '{id}' and {} assignment(s)", item.kind, holders.len());
        Ok(item)
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn create_customer(&self, contact: Contact) -> Result<Customer> {
        contact.validate()?;
        let customer = Customer::from_contact(contact);

        let mut changes = ChangeSet::new();
        changes.customers.insert(customer.clone())?;
        self.commit(changes).await?;

        info!("created customer '{}' ({})", customer.name, customer.id);
        Ok(customer)
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn update_customer(&self, id: &str, patch: ContactPatch) -> Result<Customer> {
        patch.validate()?;
        let _locks = self.lock(vec![LockKey::Customer(id.to_string())], None).await?;
        let mut customer = self.require_customer(id).await?;
        customer.apply(patch);

        let mut changes = ChangeSet::new();
        changes.customers.update(customer.clone())?;
        self.commit(changes).await?;
        Ok(customer)
    }

    /// Delete a customer. Everything the customer held goes back to the shelf.
    #[instrument(level = "trace", skip(self))]
    pub async fn delete_customer(&self, id: &str) -> Result<Customer> {
        let _locks = self.lock(vec![], Some(Scope::CustomerItems(id))).await?;
        let customer = self.require_customer(id).await?;

        let mut changes = ChangeSet::new();
        let mut returned = 0;
        for mut held in self.store.assignments_for_customer(id).await? {
            changes.assignments.delete(held.id.clone())?;
            let Some(mut item) = self.store.item(&held.item_id).await?
            else {
                continue;
            };
            let taken = assignment::unassign(&mut held);
            returned += taken.units();
            serial::put(&mut item, taken);
            self.check_item(&item)?;
            changes.items.update(item)?;
        }
        changes.customers.delete(id)?;
        self.commit(changes).await?;

        info!("deleted customer '{id}', {returned} unit(s) returned to stock");
        Ok(customer)
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn create_company(&self, contact: Contact) -> Result<Company> {
        contact.validate()?;
        let company = Company::from_contact(contact);

        let mut changes = ChangeSet::new();
        changes.companies.insert(company.clone())?;
        self.commit(changes).await?;

        info!("created company '{}' ({})", company.name, company.id);
        Ok(company)
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn update_company(&self, id: &str, patch: ContactPatch) -> Result<Company> {
        patch.validate()?;
        let _locks = self.lock(vec![LockKey::Company(id.to_string())], None).await?;
        let mut company = self.require_company(id).await?;
        company.apply(patch);

        let mut changes = ChangeSet::new();
        changes.companies.update(company.clone())?;
        self.commit(changes).await?;
        Ok(company)
    }

    /// Delete a company. Maintenance batches it was responsible for stay, without a company.
    #[instrument(level = "trace", skip(self))]
    pub async fn delete_company(&self, id: &str) -> Result<Company> {
        let _locks = self.lock(vec![], Some(Scope::CompanyBatches(id))).await?;
        let company = self.require_company(id).await?;

        let mut changes = ChangeSet::new();
        for mut batch in self.store.maintenance_for_company(id).await? {
            batch.company_id = None;
            changes.maintenance.update(batch)?;
        }
        changes.companies.delete(id)?;
        let unlinked = changes.maintenance.len();
        self.commit(changes).await?;

        info!("deleted company '{id}', {unlinked} maintenance batch(es) unlinked");
        Ok(company)
    }

    /// All stock items, or only those of one kind.
    pub async fn items(&self, kind: Option<StockKind>) -> Result<Vec<StockItem>> {
        let items = self.store.items().await?;
        Ok(match kind {
            Some(kind) => items.into_iter().filter(|i| i.kind == kind).collect(),
            None => items,
        })
    }

    pub async fn item(&self, id: &str) -> Result<StockItem> {
        self.require_item(id).await
    }

    pub async fn customers(&self) -> Result<Vec<Customer>> {
        self.store.customers().await
    }

    pub async fn customer(&self, id: &str) -> Result<Customer> {
        self.require_customer(id).await
    }

    pub async fn companies(&self) -> Result<Vec<Company>> {
        self.store.companies().await
    }

    pub async fn company(&self, id: &str) -> Result<Company> {
        self.require_company(id).await
    }

    pub async fn assignments(&self) -> Result<Vec<Assignment>> {
        self.store.assignments().await
    }

    pub async fn assignment(&self, id: &str) -> Result<Assignment> {
        self.require_assignment(id).await
    }

    pub async fn assignments_for_customer(&self, customer_id: &str) -> Result<Vec<Assignment>> {
        self.require_customer(customer_id).await?;
        self.store.assignments_for_customer(customer_id).await
    }

    pub async fn assignments_for_item(&self, item_id: &str) -> Result<Vec<Assignment>> {
        self.require_item(item_id).await?;
        self.store.assignments_for_item(item_id).await
    }

    pub async fn maintenance_items(&self) -> Result<Vec<MaintenanceItem>> {
        self.store.maintenance_items().await
    }

    pub async fn maintenance_item(&self, id: &str) -> Result<MaintenanceItem> {
        self.require_batch(id).await
    }

    /// Every place the serial is found in. More than one entry means the data is inconsistent.
    pub async fn locate_serial(&self, serial: &str) -> Result<Vec<SerialLocation>> {
        Ok(self
            .serial_locations()
            .await?
            .into_iter()
            .filter(|loc| loc.serial == serial)
            .collect())
    }
}
