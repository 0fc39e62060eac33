use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `system_settings` table.
///
/// Sparse override table for runtime policy values. A missing row or a value
/// that fails to parse never breaks a caller — every reader falls back to a
/// documented default (see `config::RuntimeSettings`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub parameter_name: String,
    /// May be an empty string; the reading side supplies its default then.
    #[sea_orm(column_type = "Text")]
    pub parameter_value: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSetting {
    pub parameter_name: String,
    pub parameter_value: String,
    pub description: String,
}
