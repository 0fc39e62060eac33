use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `parties` table and its columns.
#[derive(DeriveIden)]
enum Parties {
    Table,
    Id,
    Nick,
    ChatId,
    Role,
    Status,
    BotState,
    TariffId,
    Paid,
    CreatedAt,
}

/// Re-declare the parent table identifiers for the foreign-key reference.
#[derive(DeriveIden)]
enum Tariffs {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Parties::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Parties::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Parties::Nick)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Parties::ChatId).big_integer())
                    .col(ColumnDef::new(Parties::Role).string().not_null())
                    .col(ColumnDef::new(Parties::Status).string().not_null())
                    .col(ColumnDef::new(Parties::BotState).text())
                    .col(ColumnDef::new(Parties::TariffId).uuid())
                    .col(ColumnDef::new(Parties::Paid).boolean())
                    .col(
                        ColumnDef::new(Parties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parties_tariff_id")
                            .from(Parties::Table, Parties::TariffId)
                            .to(Tariffs::Table, Tariffs::Id)
                            // Tariffs are non-deletable reference data.
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Parties::Table).to_owned())
            .await
    }
}
