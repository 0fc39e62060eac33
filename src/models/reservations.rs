use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `reservations` table.
///
/// Links a client to a contractor they reserved for first-look notification
/// of new orders. The pair is unique; the link owns neither side and can be
/// dropped without touching either party.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub contractor_id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parties::Entity",
        from = "Column::ClientId",
        to = "super::parties::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::parties::Entity",
        from = "Column::ContractorId",
        to = "super::parties::Column::Id"
    )]
    Contractor,
}

impl ActiveModelBehavior for ActiveModel {}
