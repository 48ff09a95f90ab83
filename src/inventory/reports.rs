//! Dashboard figures and consistency checks.
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Display;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;
use tracing::warn;

use super::Inventory;
use crate::error::Result;
use crate::store::Store;
use crate::types::EntityKind;
use crate::types::Pool;
use crate::types::SerialLocation;
use crate::types::StockKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStock {
    pub id:    String,
    pub kind:  StockKind,
    pub name:  String,
    pub stock: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub products:              usize,
    pub accessories:           usize,
    pub customers:             usize,
    pub companies:             usize,
    /// Units on the shelves.
    pub available_units:       u64,
    /// Items below the low stock threshold, lowest stock first.
    pub low_stock:             Vec<LowStock>,
    /// Sum of price × stock over everything on the shelves.
    pub inventory_value:       Decimal,
    pub average_product_price: Decimal,
    pub assignments:           usize,
    pub assigned_units:        u64,
    /// Assignments made or topped up within the recent window.
    pub recent_assignments:    usize,
    pub maintenance_batches:   usize,
    pub maintenance_units:     u64,
}

/// A broken rule found by [`Inventory::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum Inconsistency {
    StockMismatch {
        item_id: String,
        stock:   u32,
        serials: usize,
    },
    /// The serial is tracked in more than one place.
    SerialInManyPools {
        serial:    String,
        locations: Vec<SerialLocation>,
    },
    DuplicateAssignment {
        customer_id: String,
        item_id:     String,
        ids:         Vec<String>,
    },
    DanglingAssignment {
        assignment_id: String,
        missing:       String,
        id:            String,
    },
    SerialsExceedQuantity {
        assignment_id: String,
        quantity:      u32,
        serials:       usize,
    },
    UnknownCompany {
        maintenance_id: String,
        company_id:     String,
    },
}

impl Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inconsistency::StockMismatch { item_id, stock, serials } => {
                write!(f, "item '{item_id}' has stock {stock} but {serials} serial number(s)")
            }
            Inconsistency::SerialInManyPools { serial, locations } => write!(
                f,
                "serial {serial} is found {} times: {}",
                locations.len(),
                locations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
            ),
            Inconsistency::DuplicateAssignment {
                customer_id,
                item_id,
                ids,
            } => write!(
                f,
                "customer '{customer_id}' has {} assignments of item '{item_id}': {}",
                ids.len(),
                ids.join(", ")
            ),
            Inconsistency::DanglingAssignment {
                assignment_id,
                missing,
                id,
            } => write!(f, "assignment '{assignment_id}' refers to missing {missing} '{id}'"),
            Inconsistency::SerialsExceedQuantity {
                assignment_id,
                quantity,
                serials,
            } => write!(
                f,
                "assignment '{assignment_id}' holds {serials} serial(s) but quantity is {quantity}"
            ),
            Inconsistency::UnknownCompany {
                maintenance_id,
                company_id,
            } => write!(f, "maintenance item '{maintenance_id}' refers to missing company '{company_id}'"),
        }
    }
}

impl<S: Store> Inventory<S> {
    /// Every serial number in every pool.
    pub(crate) async fn serial_locations(&self) -> Result<Vec<SerialLocation>> {
        let mut locations = Vec::new();

        for item in self.store.items().await? {
            locations.extend(item.serial_numbers.into_iter().map(|serial| SerialLocation {
                serial,
                pool: Pool::Available,
                holder_id: item.id.clone(),
                item_id: Some(item.id.clone()),
                customer_id: None,
            }));
        }
        for held in self.store.assignments().await? {
            locations.extend(held.serial_numbers.into_iter().map(|serial| SerialLocation {
                serial,
                pool: Pool::Assigned,
                holder_id: held.id.clone(),
                item_id: Some(held.item_id.clone()),
                customer_id: Some(held.customer_id.clone()),
            }));
        }
        for batch in self.store.maintenance_items().await? {
            locations.extend(batch.serial_numbers.into_iter().map(|serial| SerialLocation {
                serial,
                pool: Pool::InMaintenance,
                holder_id: batch.id.clone(),
                item_id: batch.original_product_id.clone(),
                customer_id: None,
            }));
        }

        Ok(locations)
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn stats(&self) -> Result<InventoryStats> {
        let items = self.store.items().await?;
        let assignments = self.store.assignments().await?;
        let batches = self.store.maintenance_items().await?;
        let threshold = self.config.low_stock_threshold;
        let since = Utc::now() - self.config.recent_window();

        let products: Vec<_> = items.iter().filter(|i| i.kind == StockKind::Product).collect();
        let average_product_price = if products.is_empty() {
            Decimal::ZERO
        }
        else {
            let count = Decimal::from(products.len());
            products
                .iter()
                .fold(Decimal::ZERO, |total, p| total.saturating_add(p.price / count))
        };
        let inventory_value = items
            .iter()
            .try_fold(Decimal::ZERO, |total, i| i.value().and_then(|v| total.checked_add(v)))
            .unwrap_or_else(|| {
                warn!("inventory value doesn't fit a decimal, reported as {}", Decimal::MAX);
                Decimal::MAX
            });

        let mut low_stock: Vec<LowStock> = items
            .iter()
            .filter(|i| i.stock < threshold)
            .map(|i| LowStock {
                id:    i.id.clone(),
                kind:  i.kind,
                name:  i.name.clone(),
                stock: i.stock,
            })
            .collect();
        low_stock.sort_by_key(|l| l.stock);

        Ok(InventoryStats {
            products: products.len(),
            accessories: items.len() - products.len(),
            customers: self.store.customers().await?.len(),
            companies: self.store.companies().await?.len(),
            available_units: items.iter().map(|i| u64::from(i.stock)).sum(),
            low_stock,
            inventory_value,
            average_product_price: average_product_price.round_dp(2),
            assignments: assignments.len(),
            assigned_units: assignments.iter().map(|a| u64::from(a.quantity)).sum(),
            recent_assignments: assignments.iter().filter(|a| a.assigned_at >= since).count(),
            maintenance_batches: batches.len(),
            maintenance_units: batches.iter().map(|m| u64::from(m.stock)).sum(),
        })
    }

    /// Scan the whole store for data that breaks the inventory rules.
    ///
    /// Such data can only come from outside: legacy imports, hand edits, or another process writing the same store.
    #[instrument(level = "trace", skip(self))]
    pub async fn verify(&self) -> Result<Vec<Inconsistency>> {
        let items = self.store.items().await?;
        let customers = self.store.customers().await?;
        let companies = self.store.companies().await?;
        let assignments = self.store.assignments().await?;
        let batches = self.store.maintenance_items().await?;
        let mut found = Vec::new();

        for item in &items {
            if let Err(crate::error::InvariantViolation::StockMismatch { item_id, stock, serials }) =
                item.check_consistency()
            {
                found.push(Inconsistency::StockMismatch { item_id, stock, serials });
            }
        }

        let item_ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        let customer_ids: HashSet<&str> = customers.iter().map(|c| c.id.as_str()).collect();
        let company_ids: HashSet<&str> = companies.iter().map(|c| c.id.as_str()).collect();
        let mut pairs: HashMap<(&str, &str), Vec<String>> = HashMap::new();

        for held in &assignments {
            if !customer_ids.contains(held.customer_id.as_str()) {
                found.push(Inconsistency::DanglingAssignment {
                    assignment_id: held.id.clone(),
                    missing:       EntityKind::Customer.to_string(),
                    id:            held.customer_id.clone(),
                });
            }
            if !item_ids.contains(held.item_id.as_str()) {
                found.push(Inconsistency::DanglingAssignment {
                    assignment_id: held.id.clone(),
                    missing:       EntityKind::Item.to_string(),
                    id:            held.item_id.clone(),
                });
            }
            if held.serial_numbers.len() > held.quantity as usize {
                found.push(Inconsistency::SerialsExceedQuantity {
                    assignment_id: held.id.clone(),
                    quantity:      held.quantity,
                    serials:       held.serial_numbers.len(),
                });
            }
            pairs
                .entry((held.customer_id.as_str(), held.item_id.as_str()))
                .or_default()
                .push(held.id.clone());
        }

        let mut duplicates: Vec<_> = pairs.into_iter().filter(|(_, ids)| ids.len() > 1).collect();
        duplicates.sort();
        found.extend(
            duplicates
                .into_iter()
                .map(|((customer_id, item_id), ids)| Inconsistency::DuplicateAssignment {
                    customer_id: customer_id.to_string(),
                    item_id: item_id.to_string(),
                    ids,
                }),
        );

        for batch in &batches {
            if let Some(company_id) = batch.company_id.as_deref() {
                if !company_ids.contains(company_id) {
                    found.push(Inconsistency::UnknownCompany {
                        maintenance_id: batch.id.clone(),
                        company_id:     company_id.to_string(),
                    });
                }
            }
        }

        let mut by_serial: HashMap<String, Vec<SerialLocation>> = HashMap::new();
        for location in self.serial_locations().await? {
            by_serial.entry(location.serial.clone()).or_default().push(location);
        }
        let mut shared: Vec<_> = by_serial.into_iter().filter(|(_, l)| l.len() > 1).collect();
        shared.sort_by(|a, b| a.0.cmp(&b.0));
        found.extend(
            shared
                .into_iter()
                .map(|(serial, locations)| Inconsistency::SerialInManyPools { serial, locations }),
        );

        if !found.is_empty() {
            warn!("{} inconsistencies found in {} store", found.len(), self.store.name());
        }
        Ok(found)
    }
}
