//! Turns command results into tables or JSON on stdout.
use comfy_table::CellAlignment;
use comfy_table::Table;
use serde::Serialize;

use super::AppError;
use crate::inventory::Inconsistency;
use crate::inventory::InventoryStats;
use crate::model::Assignment;
use crate::model::Company;
use crate::model::Customer;
use crate::model::MaintenanceItem;
use crate::model::StockItem;
use crate::types::SerialLocation;

#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn table<H: ToString>(header: impl IntoIterator<Item = H>) -> Table {
        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::ASCII_FULL_CONDENSED)
            .set_header(header.into_iter().map(|h| h.to_string()).collect::<Vec<_>>());
        table
    }

    fn align_right(table: &mut Table, columns: &[usize]) {
        for col in columns {
            if let Some(column) = table.column_mut(*col) {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }
    }

    fn emit<T: Serialize + ?Sized>(&self, value: &T, table: impl FnOnce() -> Table) -> Result<(), AppError> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        else {
            println!("{}", table());
        }
        Ok(())
    }

    pub fn message(&self, msg: &str) -> Result<(), AppError> {
        if self.json {
            println!("{}", serde_json::json!({ "message": msg }));
        }
        else {
            println!("{msg}");
        }
        Ok(())
    }

    pub fn items(&self, items: &[StockItem]) -> Result<(), AppError> {
        self.emit(items, || {
            let mut table = Self::table(["ID", "Kind", "Name", "Category", "Brand", "Price", "Stock", "Serials"]);
            for item in items {
                table.add_row([
                    item.id.clone(),
                    item.kind.to_string(),
                    item.name.clone(),
                    item.category.clone(),
                    item.brand.clone().unwrap_or_default(),
                    item.price.to_string(),
                    item.stock.to_string(),
                    item.serial_numbers.join(", "),
                ]);
            }
            Self::align_right(&mut table, &[5, 6]);
            table
        })
    }

    fn contacts<'a>(rows: impl Iterator<Item = [&'a str; 5]>) -> Table {
        let mut table = Self::table(["ID", "Name", "Email", "Phone", "Address"]);
        for row in rows {
            table.add_row(row);
        }
        table
    }

    pub fn customers(&self, customers: &[Customer]) -> Result<(), AppError> {
        self.emit(customers, || {
            Self::contacts(
                customers
                    .iter()
                    .map(|c| [c.id.as_str(), c.name.as_str(), c.email.as_str(), c.phone.as_str(), c.address.as_str()]),
            )
        })
    }

    pub fn companies(&self, companies: &[Company]) -> Result<(), AppError> {
        self.emit(companies, || {
            Self::contacts(
                companies
                    .iter()
                    .map(|c| [c.id.as_str(), c.name.as_str(), c.email.as_str(), c.phone.as_str(), c.address.as_str()]),
            )
        })
    }

    pub fn assignments(&self, assignments: &[Assignment]) -> Result<(), AppError> {
        self.emit(assignments, || {
            let mut table = Self::table(["ID", "Customer", "Item", "Quantity", "Serials", "Assigned"]);
            for a in assignments {
                table.add_row([
                    a.id.clone(),
                    a.customer_id.clone(),
                    a.item_id.clone(),
                    a.quantity.to_string(),
                    a.serial_numbers.join(", "),
                    a.assigned_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }
            Self::align_right(&mut table, &[3]);
            table
        })
    }

    pub fn maintenance(&self, batches: &[MaintenanceItem]) -> Result<(), AppError> {
        self.emit(batches, || {
            let mut table = Self::table(["ID", "Item", "Name", "Company", "Units", "Serials", "Since"]);
            for m in batches {
                table.add_row([
                    m.id.clone(),
                    m.original_product_id.clone().unwrap_or_default(),
                    m.name.clone(),
                    m.company_id.clone().unwrap_or_default(),
                    m.stock.to_string(),
                    m.serial_numbers.join(", "),
                    m.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }
            Self::align_right(&mut table, &[4]);
            table
        })
    }

    pub fn locations(&self, serial: &str, locations: &[SerialLocation]) -> Result<(), AppError> {
        if locations.is_empty() && !self.json {
            return self.message(&format!("serial {serial} is not tracked"));
        }
        self.emit(locations, || {
            let mut table = Self::table(["Serial", "Pool", "Holder", "Item", "Customer"]);
            for l in locations {
                table.add_row([
                    l.serial.clone(),
                    l.pool.to_string(),
                    l.holder_id.clone(),
                    l.item_id.clone().unwrap_or_default(),
                    l.customer_id.clone().unwrap_or_default(),
                ]);
            }
            table
        })
    }

    pub fn stats(&self, stats: &InventoryStats) -> Result<(), AppError> {
        self.emit(stats, || {
            let mut table = Self::table(["", "Value"]);
            table
                .add_row(["Products".to_string(), stats.products.to_string()])
                .add_row(["Accessories".to_string(), stats.accessories.to_string()])
                .add_row(["Customers".to_string(), stats.customers.to_string()])
                .add_row(["Companies".to_string(), stats.companies.to_string()])
                .add_row(["Units in stock".to_string(), stats.available_units.to_string()])
                .add_row(["Low stock items".to_string(), stats.low_stock.len().to_string()])
                .add_row(["Inventory value".to_string(), stats.inventory_value.round_dp(2).to_string()])
                .add_row(["Average product price".to_string(), stats.average_product_price.to_string()])
                .add_row(["Assignments".to_string(), stats.assignments.to_string()])
                .add_row(["Assigned units".to_string(), stats.assigned_units.to_string()])
                .add_row(["Recent assignments".to_string(), stats.recent_assignments.to_string()])
                .add_row(["Maintenance batches".to_string(), stats.maintenance_batches.to_string()])
                .add_row(["Units in maintenance".to_string(), stats.maintenance_units.to_string()]);
            Self::align_right(&mut table, &[1]);

            if !stats.low_stock.is_empty() {
                let mut low = Self::table(["Low stock", "Kind", "Stock"]);
                for item in &stats.low_stock {
                    low.add_row([item.name.clone(), item.kind.to_string(), item.stock.to_string()]);
                }
                Self::align_right(&mut low, &[2]);
                println!("{table}");
                return low;
            }
            table
        })
    }

    pub fn inconsistencies(&self, found: &[Inconsistency]) -> Result<(), AppError> {
        if found.is_empty() && !self.json {
            return self.message("no inconsistencies found");
        }
        self.emit(found, || {
            let mut table = Self::table(["#", "Problem"]);
            for (idx, problem) in found.iter().enumerate() {
                table.add_row([(idx + 1).to_string(), problem.to_string()]);
            }
            table
        })
    }
}
