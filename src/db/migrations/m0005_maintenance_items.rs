use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MaintenanceItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MaintenanceItems::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(MaintenanceItems::OriginalProductId).string().null())
                    .col(ColumnDef::new(MaintenanceItems::Kind).string().not_null())
                    .col(ColumnDef::new(MaintenanceItems::Name).string().not_null())
                    .col(ColumnDef::new(MaintenanceItems::Description).text().not_null().default(""))
                    .col(ColumnDef::new(MaintenanceItems::Price).string().not_null().default("0"))
                    .col(ColumnDef::new(MaintenanceItems::Category).string().not_null().default(""))
                    .col(ColumnDef::new(MaintenanceItems::Brand).string().null())
                    .col(ColumnDef::new(MaintenanceItems::Stock).big_integer().not_null().default(0))
                    .col(ColumnDef::new(MaintenanceItems::SerialNumbers).text().not_null().default("[]"))
                    .col(ColumnDef::new(MaintenanceItems::CompanyId).string().null())
                    .col(ColumnDef::new(MaintenanceItems::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-maintenance-company")
                    .table(MaintenanceItems::Table)
                    .col(MaintenanceItems::CompanyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MaintenanceItems::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum MaintenanceItems {
    Table,
    Id,
    OriginalProductId,
    Kind,
    Name,
    Description,
    Price,
    Category,
    Brand,
    Stock,
    SerialNumbers,
    CompanyId,
    CreatedAt,
}
