use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `tariffs` table and its columns.
#[derive(DeriveIden)]
enum Tariffs {
    Table,
    Id,
    Name,
    OrdersLimit,
    ReactionTimeMinutes,
    CanReserveContractor,
    CanSeeContractorContacts,
    Price,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tariffs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tariffs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tariffs::Name).string().not_null())
                    .col(ColumnDef::new(Tariffs::OrdersLimit).integer().not_null())
                    .col(
                        ColumnDef::new(Tariffs::ReactionTimeMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tariffs::CanReserveContractor)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tariffs::CanSeeContractorContacts)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Tariffs::Price).double().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tariffs::Table).to_owned())
            .await
    }
}
