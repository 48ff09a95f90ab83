use sea_orm::entity::prelude::*;
use sea_orm::Set;

use super::count_from_db;
use super::price_from_db;
use super::price_to_db;
use super::serials_from_db;
use super::serials_to_db;
use crate::error::PersistenceError;
use crate::types::StockKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maintenance_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id:                  String,
    pub original_product_id: Option<String>,
    pub kind:                StockKind,
    pub name:                String,
    pub description:         String,
    pub price:               String,
    pub category:            String,
    pub brand:               Option<String>,
    pub stock:               i64,
    #[sea_orm(column_type = "Text")]
    pub serial_numbers:      String,
    #[sea_orm(indexed)]
    pub company_id:          Option<String>,
    pub created_at:          DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&crate::model::MaintenanceItem> for ActiveModel {
    type Error = PersistenceError;

    fn try_from(m: &crate::model::MaintenanceItem) -> Result<Self, Self::Error> {
        Ok(Self {
            id:                  Set(m.id.clone()),
            original_product_id: Set(m.original_product_id.clone()),
            kind:                Set(m.kind),
            name:                Set(m.name.clone()),
            description:         Set(m.description.clone()),
            price:               Set(price_to_db(&m.price)),
            category:            Set(m.category.clone()),
            brand:               Set(m.brand.clone()),
            stock:               Set(i64::from(m.stock)),
            serial_numbers:      Set(serials_to_db(&m.serial_numbers)?),
            company_id:          Set(m.company_id.clone()),
            created_at:          Set(m.created_at),
        })
    }
}

impl TryFrom<Model> for crate::model::MaintenanceItem {
    type Error = PersistenceError;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            price: price_from_db(&m.id, &m.price)?,
            stock: count_from_db("stock", &m.id, m.stock)?,
            serial_numbers: serials_from_db(&m.id, &m.serial_numbers)?,
            id: m.id,
            original_product_id: m.original_product_id,
            kind: m.kind,
            name: m.name,
            description: m.description,
            category: m.category,
            brand: m.brand,
            company_id: m.company_id,
            created_at: m.created_at,
        })
    }
}
