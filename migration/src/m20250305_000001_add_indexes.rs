use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Orders {
    Table,
    ClientId,
    ContractorId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Parties {
    Table,
    ChatId,
    Status,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Index on orders.status: every sweep filters by it
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        // Index on orders.client_id for quota and active-order checks
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_client_id")
                    .table(Orders::Table)
                    .col(Orders::ClientId)
                    .to_owned(),
            )
            .await?;

        // Index on orders.contractor_id for availability derivation
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_contractor_id")
                    .table(Orders::Table)
                    .col(Orders::ContractorId)
                    .to_owned(),
            )
            .await?;

        // Index on orders.created_at for billing-cycle counting
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_created_at")
                    .table(Orders::Table)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index on parties.chat_id for inbound event resolution
        manager
            .create_index(
                Index::create()
                    .name("idx_parties_chat_id")
                    .table(Parties::Table)
                    .col(Parties::ChatId)
                    .to_owned(),
            )
            .await?;

        // Index on parties.status for the active-party filters
        manager
            .create_index(
                Index::create()
                    .name("idx_parties_status")
                    .table(Parties::Table)
                    .col(Parties::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_orders_status").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_orders_client_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_orders_contractor_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_orders_created_at").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_parties_chat_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_parties_status").to_owned())
            .await?;

        Ok(())
    }
}
