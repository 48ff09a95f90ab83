use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StockItems::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(StockItems::Kind).string().not_null())
                    .col(ColumnDef::new(StockItems::Name).string().not_null())
                    .col(ColumnDef::new(StockItems::Description).text().not_null().default(""))
                    .col(ColumnDef::new(StockItems::Price).string().not_null().default("0"))
                    .col(ColumnDef::new(StockItems::Stock).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StockItems::Category).string().not_null().default(""))
                    .col(ColumnDef::new(StockItems::Brand).string().null())
                    .col(ColumnDef::new(StockItems::SerialNumbers).text().not_null().default("[]"))
                    .col(ColumnDef::new(StockItems::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-stock-items-kind")
                    .table(StockItems::Table)
                    .col(StockItems::Kind)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockItems::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum StockItems {
    Table,
    Id,
    Kind,
    Name,
    Description,
    Price,
    Stock,
    Category,
    Brand,
    SerialNumbers,
    CreatedAt,
}
