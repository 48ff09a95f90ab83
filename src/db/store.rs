use std::fmt::Debug;

use async_trait::async_trait;
use sea_orm::ActiveModelBehavior;
use sea_orm::ActiveModelTrait;
use sea_orm::ColumnTrait;
use sea_orm::ConnectionTrait;
use sea_orm::DbErr;
use sea_orm::EntityTrait;
use sea_orm::IntoActiveModel;
use sea_orm::QueryFilter;
use sea_orm::QueryOrder;
use sea_orm::TransactionTrait;
use sea_orm_migration::MigratorTrait;
use tracing::debug;
use tracing::instrument;

use super::driver::DatabaseDriver;
use super::entity;
use super::migrations::Migrator;
use crate::changes::ChangeSet;
use crate::changes::Update;
use crate::changes::UpdateQueue;
use crate::error::PersistenceError;
use crate::error::Result;
use crate::model::Assignment;
use crate::model::Company;
use crate::model::Customer;
use crate::model::MaintenanceItem;
use crate::model::Record;
use crate::model::StockItem;
use crate::store::Store;

type ActiveOf<R> = <<R as Persisted>::Entity as EntityTrait>::ActiveModel;
type ModelOf<R> = <<R as Persisted>::Entity as EntityTrait>::Model;
type ColumnOf<R> = <<R as Persisted>::Entity as EntityTrait>::Column;

/// A domain record backed by a table.
pub(crate) trait Persisted: Record + Sized {
    type Entity: EntityTrait;

    fn id_column() -> ColumnOf<Self>;
    fn order_column() -> ColumnOf<Self>;
    fn to_active(&self) -> Result<ActiveOf<Self>, PersistenceError>;
    fn from_model(model: ModelOf<Self>) -> Result<Self, PersistenceError>;
}

impl Persisted for StockItem {
    type Entity = entity::stock_item::Entity;

    fn id_column() -> ColumnOf<Self> {
        entity::stock_item::Column::Id
    }

    fn order_column() -> ColumnOf<Self> {
        entity::stock_item::Column::CreatedAt
    }

    fn to_active(&self) -> Result<ActiveOf<Self>, PersistenceError> {
        self.try_into()
    }

    fn from_model(model: ModelOf<Self>) -> Result<Self, PersistenceError> {
        model.try_into()
    }
}

impl Persisted for Customer {
    type Entity = entity::customer::Entity;

    fn id_column() -> ColumnOf<Self> {
        entity::customer::Column::Id
    }

    fn order_column() -> ColumnOf<Self> {
        entity::customer::Column::CreatedAt
    }

    fn to_active(&self) -> Result<ActiveOf<Self>, PersistenceError> {
        Ok(self.into())
    }

    fn from_model(model: ModelOf<Self>) -> Result<Self, PersistenceError> {
        Ok(model.into())
    }
}

impl Persisted for Company {
    type Entity = entity::company::Entity;

    fn id_column() -> ColumnOf<Self> {
        entity::company::Column::Id
    }

    fn order_column() -> ColumnOf<Self> {
        entity::company::Column::CreatedAt
    }

    fn to_active(&self) -> Result<ActiveOf<Self>, PersistenceError> {
        Ok(self.into())
    }

    fn from_model(model: ModelOf<Self>) -> Result<Self, PersistenceError> {
        Ok(model.into())
    }
}

impl Persisted for Assignment {
    type Entity = entity::assignment::Entity;

    fn id_column() -> ColumnOf<Self> {
        entity::assignment::Column::Id
    }

    fn order_column() -> ColumnOf<Self> {
        entity::assignment::Column::AssignedAt
    }

    fn to_active(&self) -> Result<ActiveOf<Self>, PersistenceError> {
        self.try_into()
    }

    fn from_model(model: ModelOf<Self>) -> Result<Self, PersistenceError> {
        model.try_into()
    }
}

impl Persisted for MaintenanceItem {
    type Entity = entity::maintenance_item::Entity;

    fn id_column() -> ColumnOf<Self> {
        entity::maintenance_item::Column::Id
    }

    fn order_column() -> ColumnOf<Self> {
        entity::maintenance_item::Column::CreatedAt
    }

    fn to_active(&self) -> Result<ActiveOf<Self>, PersistenceError> {
        self.try_into()
    }

    fn from_model(model: ModelOf<Self>) -> Result<Self, PersistenceError> {
        model.try_into()
    }
}

/// Stores records in SQL tables through any [`DatabaseDriver`].
///
/// Each [`ChangeSet`] is written in a single transaction: deletes first, then updates, then batched inserts.
#[derive(Debug)]
pub struct SqlStore<D: DatabaseDriver> {
    driver: D,
}

impl<D: DatabaseDriver> SqlStore<D> {
    /// Configure the connection and bring the schema up to date.
    pub async fn open(driver: D) -> Result<Self> {
        driver.configure().await?;
        Migrator::up(&driver.connection(), None).await?;
        debug!("{} schema is up to date", driver.name());

        Ok(Self { driver })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub async fn checkpoint(&self) -> Result<()> {
        self.driver.checkpoint().await
    }

    async fn load_where<R: Persisted>(&self, column: ColumnOf<R>, value: &str) -> Result<Vec<R>> {
        let db = self.driver.connection();
        let models = R::Entity::find()
            .filter(column.eq(value))
            .order_by_asc(R::order_column())
            .all(&db)
            .await?;
        Ok(models.into_iter().map(R::from_model).collect::<Result<_, _>>()?)
    }

    async fn load_all<R: Persisted>(&self) -> Result<Vec<R>> {
        let db = self.driver.connection();
        let models = R::Entity::find().order_by_asc(R::order_column()).all(&db).await?;
        Ok(models.into_iter().map(R::from_model).collect::<Result<_, _>>()?)
    }

    async fn load_one<R: Persisted>(&self, id: &str) -> Result<Option<R>> {
        Ok(self.load_where(R::id_column(), id).await?.into_iter().next())
    }
}

#[instrument(level = "trace", skip(conn, queue), fields(kind = %R::KIND, count = queue.len()))]
async fn write_queue<R, C>(conn: &C, store: &'static str, queue: UpdateQueue<R>) -> Result<()>
where
    R: Persisted,
    C: ConnectionTrait,
    ActiveOf<R>: ActiveModelBehavior + Send,
    ModelOf<R>: IntoActiveModel<ActiveOf<R>>,
{
    let mut inserts = Vec::new();
    let mut updates = Vec::new();
    let mut deletes = Vec::new();

    for (id, update) in queue {
        match update {
            Update::Insert(record) => inserts.push(record.to_active()?),
            Update::Update(record) => updates.push((id, record.to_active()?)),
            Update::Delete => deletes.push(id),
        }
    }

    if !deletes.is_empty() {
        R::Entity::delete_many()
            .filter(R::id_column().is_in(deletes))
            .exec(conn)
            .await?;
    }

    for (id, am) in updates {
        match am.update(conn).await {
            Ok(_) => (),
            Err(DbErr::RecordNotUpdated) => {
                return Err(PersistenceError::MissingRow {
                    store,
                    kind: R::KIND,
                    id,
                }
                .into())
            }
            Err(e) => return Err(e.into()),
        }
    }

    // SQLite limits the number of bound parameters per statement.
    for chunk in inserts.chunks(500) {
        R::Entity::insert_many(chunk.to_vec()).exec_without_returning(conn).await?;
    }

    Ok(())
}

#[async_trait]
impl<D: DatabaseDriver> Store for SqlStore<D> {
    fn name(&self) -> &'static str {
        self.driver.name()
    }

    async fn items(&self) -> Result<Vec<StockItem>> {
        self.load_all().await
    }

    async fn item(&self, id: &str) -> Result<Option<StockItem>> {
        self.load_one(id).await
    }

    async fn customers(&self) -> Result<Vec<Customer>> {
        self.load_all().await
    }

    async fn customer(&self, id: &str) -> Result<Option<Customer>> {
        self.load_one(id).await
    }

    async fn companies(&self) -> Result<Vec<Company>> {
        self.load_all().await
    }

    async fn company(&self, id: &str) -> Result<Option<Company>> {
        self.load_one(id).await
    }

    async fn assignments(&self) -> Result<Vec<Assignment>> {
        self.load_all().await
    }

    async fn assignment(&self, id: &str) -> Result<Option<Assignment>> {
        self.load_one(id).await
    }

    async fn maintenance_items(&self) -> Result<Vec<MaintenanceItem>> {
        self.load_all().await
    }

    async fn maintenance_item(&self, id: &str) -> Result<Option<MaintenanceItem>> {
        self.load_one(id).await
    }

    async fn assignments_for_customer(&self, customer_id: &str) -> Result<Vec<Assignment>> {
        self.load_where(entity::assignment::Column::CustomerId, customer_id).await
    }

    async fn assignments_for_item(&self, item_id: &str) -> Result<Vec<Assignment>> {
        self.load_where(entity::assignment::Column::ItemId, item_id).await
    }

    async fn maintenance_for_company(&self, company_id: &str) -> Result<Vec<MaintenanceItem>> {
        self.load_where(entity::maintenance_item::Column::CompanyId, company_id).await
    }

    #[instrument(level = "trace", skip(self, changes), fields(store = self.name(), changes = changes.len()))]
    async fn write_back(&self, changes: ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let store = self.name();
        let db = self.driver.connection();
        // Dropping the transaction without commit rolls everything back.
        let transaction = db.begin().await?;

        write_queue(&transaction, store, changes.items).await?;
        write_queue(&transaction, store, changes.customers).await?;
        write_queue(&transaction, store, changes.companies).await?;
        write_queue(&transaction, store, changes.assignments).await?;
        write_queue(&transaction, store, changes.maintenance).await?;

        transaction.commit().await?;
        Ok(())
    }
}
