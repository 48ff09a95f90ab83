//! Change sets: what a single orchestrator operation wants the store to persist.
//!
//! A change set is applied as a whole or not at all. Repeated changes of the same record are merged as they are
//! queued, so the store sees at most one update per record.
use std::fmt::Debug;

use crate::error::InvariantViolation;
use crate::model::Assignment;
use crate::model::Company;
use crate::model::Customer;
use crate::model::MaintenanceItem;
use crate::model::Record;
use crate::model::StockItem;

#[derive(Debug, Clone, PartialEq)]
pub enum Update<T> {
    Insert(T),
    Update(T),
    Delete,
}

impl<T> Update<T> {
    /// Merge a newer change of the same record into this one.
    fn merge(self, newer: Update<T>) -> Result<Option<Update<T>>, Update<T>> {
        Ok(Some(match (self, newer) {
            // Inserted and deleted within the same set: the store never needs to know.
            (Update::Insert(_), Update::Delete) => return Ok(None),
            (Update::Insert(_), Update::Insert(v) | Update::Update(v)) => Update::Insert(v),
            (Update::Update(_), Update::Insert(v) | Update::Update(v)) => Update::Update(v),
            (Update::Update(_), Update::Delete) => Update::Delete,
            (Update::Delete, Update::Insert(v)) => Update::Update(v),
            (Update::Delete, Update::Delete) => Update::Delete,
            (Update::Delete, newer @ Update::Update(_)) => return Err(newer),
        }))
    }

    pub fn record(&self) -> Option<&T> {
        match self {
            Update::Insert(v) | Update::Update(v) => Some(v),
            Update::Delete => None,
        }
    }
}

/// Pending changes of one record type, in the order they were first queued.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQueue<T> {
    updates: Vec<(String, Update<T>)>,
}

impl<T> Default for UpdateQueue<T> {
    fn default() -> Self {
        Self { updates: Vec::new() }
    }
}

impl<T: Record> UpdateQueue<T> {
    pub fn insert(&mut self, record: T) -> Result<(), InvariantViolation> {
        self.push(record.id().to_string(), Update::Insert(record))
    }

    pub fn update(&mut self, record: T) -> Result<(), InvariantViolation> {
        self.push(record.id().to_string(), Update::Update(record))
    }

    pub fn delete(&mut self, id: impl Into<String>) -> Result<(), InvariantViolation> {
        self.push(id.into(), Update::Delete)
    }

    /// Queue `record` as an insert when `is_new`, otherwise as an update.
    pub fn upsert(&mut self, record: T, is_new: bool) -> Result<(), InvariantViolation> {
        if is_new {
            self.insert(record)
        }
        else {
            self.update(record)
        }
    }

    fn push(&mut self, id: String, update: Update<T>) -> Result<(), InvariantViolation> {
        let Some(pos) = self.updates.iter().position(|(k, _)| *k == id)
        else {
            self.updates.push((id, update));
            return Ok(());
        };

        let (_, prev) = self.updates.remove(pos);
        match prev.merge(update) {
            Ok(Some(merged)) => self.updates.insert(pos, (id, merged)),
            Ok(None) => (),
            Err(_) => return Err(InvariantViolation::ModifiedAfterDelete { kind: T::KIND, id }),
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Update<T>> {
        self.updates.iter().find(|(k, _)| k == id).map(|(_, u)| u)
    }

    pub fn is_deleted(&self, id: &str) -> bool {
        matches!(self.get(id), Some(Update::Delete))
    }
}

impl<T> UpdateQueue<T> {
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Update<T>)> {
        self.updates.iter().map(|(k, u)| (k.as_str(), u))
    }
}

impl<T> IntoIterator for UpdateQueue<T> {
    type IntoIter = std::vec::IntoIter<(String, Update<T>)>;
    type Item = (String, Update<T>);

    fn into_iter(self) -> Self::IntoIter {
        self.updates.into_iter()
    }
}

/// Everything one operation writes back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub items:       UpdateQueue<StockItem>,
    pub customers:   UpdateQueue<Customer>,
    pub companies:   UpdateQueue<Company>,
    pub assignments: UpdateQueue<Assignment>,
    pub maintenance: UpdateQueue<MaintenanceItem>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of queued record changes.
    pub fn len(&self) -> usize {
        self.items.len() + self.customers.len() + self.companies.len() + self.assignments.len() + self.maintenance.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Contact;

    fn customer() -> Customer {
        Customer::from_contact(Contact::new("Ann"))
    }

    #[test]
    fn insert_then_update_stays_insert() {
        let mut q = UpdateQueue::default();
        let mut c = customer();
        q.insert(c.clone()).unwrap();
        c.name = "Anna".into();
        q.update(c.clone()).unwrap();
        assert_eq!(q.len(), 1);
        assert_eq!(q.get(&c.id), Some(&Update::Insert(c)));
    }

    #[test]
    fn insert_then_delete_vanishes() {
        let mut q = UpdateQueue::default();
        let c = customer();
        q.insert(c.clone()).unwrap();
        q.delete(c.id.clone()).unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn update_after_delete_fails() {
        let mut q = UpdateQueue::default();
        let c = customer();
        q.update(c.clone()).unwrap();
        q.delete(c.id.clone()).unwrap();
        assert!(q.is_deleted(&c.id));
        let err = q.update(c.clone()).unwrap_err();
        assert!(matches!(err, InvariantViolation::ModifiedAfterDelete { .. }));
        // Re-inserting a deleted record turns into an update.
        q.insert(c.clone()).unwrap();
        assert_eq!(q.get(&c.id), Some(&Update::Update(c)));
    }

    #[test]
    fn order_is_preserved() {
        let mut q = UpdateQueue::default();
        let a = customer();
        let b = customer();
        q.update(a.clone()).unwrap();
        q.update(b.clone()).unwrap();
        q.update(a.clone()).unwrap();
        let ids: Vec<&str> = q.iter().map(|(k, _)| k).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str()]);
    }
}
