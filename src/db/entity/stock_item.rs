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
#[sea_orm(table_name = "stock_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id:             String,
    pub kind:           StockKind,
    pub name:           String,
    pub description:    String,
    pub price:          String,
    pub stock:          i64,
    pub category:       String,
    pub brand:          Option<String>,
    #[sea_orm(column_type = "Text")]
    pub serial_numbers: String,
    pub created_at:     DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&crate::model::StockItem> for ActiveModel {
    type Error = PersistenceError;

    fn try_from(item: &crate::model::StockItem) -> Result<Self, Self::Error> {
        Ok(Self {
            id:             Set(item.id.clone()),
            kind:           Set(item.kind),
            name:           Set(item.name.clone()),
            description:    Set(item.description.clone()),
            price:          Set(price_to_db(&item.price)),
            stock:          Set(i64::from(item.stock)),
            category:       Set(item.category.clone()),
            brand:          Set(item.brand.clone()),
            serial_numbers: Set(serials_to_db(&item.serial_numbers)?),
            created_at:     Set(item.created_at),
        })
    }
}

impl TryFrom<Model> for crate::model::StockItem {
    type Error = PersistenceError;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            price: price_from_db(&m.id, &m.price)?,
            stock: count_from_db("stock", &m.id, m.stock)?,
            serial_numbers: serials_from_db(&m.id, &m.serial_numbers)?,
            id: m.id,
            kind: m.kind,
            name: m.name,
            description: m.description,
            category: m.category,
            brand: m.brand,
            created_at: m.created_at,
        })
    }
}
