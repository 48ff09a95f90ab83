use sea_orm::entity::prelude::*;
use sea_orm::Set;

use super::count_from_db;
use super::serials_from_db;
use super::serials_to_db;
use crate::error::PersistenceError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id:             String,
    #[sea_orm(indexed)]
    pub customer_id:    String,
    #[sea_orm(indexed)]
    pub item_id:        String,
    pub quantity:       i64,
    #[sea_orm(column_type = "Text")]
    pub serial_numbers: String,
    pub assigned_at:    DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&crate::model::Assignment> for ActiveModel {
    type Error = PersistenceError;

    fn try_from(a: &crate::model::Assignment) -> Result<Self, Self::Error> {
        Ok(Self {
            id:             Set(a.id.clone()),
            customer_id:    Set(a.customer_id.clone()),
            item_id:        Set(a.item_id.clone()),
            quantity:       Set(i64::from(a.quantity)),
            serial_numbers: Set(serials_to_db(&a.serial_numbers)?),
            assigned_at:    Set(a.assigned_at),
        })
    }
}

impl TryFrom<Model> for crate::model::Assignment {
    type Error = PersistenceError;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            quantity: count_from_db("quantity", &m.id, m.quantity)?,
            serial_numbers: serials_from_db(&m.id, &m.serial_numbers)?,
            id: m.id,
            customer_id: m.customer_id,
            item_id: m.item_id,
            assigned_at: m.assigned_at,
        })
    }
}
