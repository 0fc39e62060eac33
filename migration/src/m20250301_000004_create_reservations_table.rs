use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `reservations` table and its columns.
#[derive(DeriveIden)]
enum Reservations {
    Table,
    Id,
    ClientId,
    ContractorId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Parties {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::ClientId).uuid().not_null())
                    .col(ColumnDef::new(Reservations::ContractorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Reservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_client_id")
                            .from(Reservations::Table, Reservations::ClientId)
                            .to(Parties::Table, Parties::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_contractor_id")
                            .from(Reservations::Table, Reservations::ContractorId)
                            .to(Parties::Table, Parties::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One reservation per client/contractor pair; re-binding is a no-op
        // at the application level, the constraint backs it up.
        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_client_contractor")
                    .table(Reservations::Table)
                    .col(Reservations::ClientId)
                    .col(Reservations::ContractorId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}
