use sea_orm::entity::prelude::*;
use sea_orm::Set;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id:         String,
    pub name:       String,
    pub email:      String,
    pub phone:      String,
    pub address:    String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&crate::model::Company> for ActiveModel {
    fn from(c: &crate::model::Company) -> Self {
        Self {
            id:         Set(c.id.clone()),
            name:       Set(c.name.clone()),
            email:      Set(c.email.clone()),
            phone:      Set(c.phone.clone()),
            address:    Set(c.address.clone()),
            created_at: Set(c.created_at),
        }
    }
}

impl From<Model> for crate::model::Company {
    fn from(m: Model) -> Self {
        Self {
            id:         m.id,
            name:       m.name,
            email:      m.email,
            phone:      m.phone,
            address:    m.address,
            created_at: m.created_at,
        }
    }
}
