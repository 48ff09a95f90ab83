use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assignments::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Assignments::CustomerId).string().not_null())
                    .col(ColumnDef::new(Assignments::ItemId).string().not_null())
                    .col(ColumnDef::new(Assignments::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(Assignments::SerialNumbers).text().not_null().default("[]"))
                    .col(ColumnDef::new(Assignments::AssignedAt).timestamp_with_time_zone().not_null())
                    // One assignment per customer and item; repeated assignments are merged.
                    .index(
                        Index::create()
                            .name("idx-unique-customer-item")
                            .col(Assignments::CustomerId)
                            .col(Assignments::ItemId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-assignments-item")
                    .table(Assignments::Table)
                    .col(Assignments::ItemId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Assignments {
    Table,
    Id,
    CustomerId,
    ItemId,
    Quantity,
    SerialNumbers,
    AssignedAt,
}
