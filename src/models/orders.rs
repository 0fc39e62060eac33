use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order status stored as a lowercase string in the database.
///
/// Transitions only ever move forward: created → in_work → closed or
/// cancelled (cancel is also allowed straight from created). Closed and
/// cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "in_work")]
    InWork,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Closed | Status::Cancelled)
    }
}

/// SeaORM entity for the `orders` table.
///
/// The six `*_informed` booleans are one-shot latches consumed by the sweep
/// engine: each notification is sent at most once per order regardless of how
/// many sweep ticks see the qualifying condition, and the latches survive a
/// process restart.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub task: String,
    pub client_id: Uuid,
    pub contractor_id: Option<Uuid>,
    pub status: Status,
    pub created_at: DateTimeUtc,
    pub assigned_at: Option<DateTimeUtc>,
    pub closed_at: Option<DateTimeUtc>,
    pub not_taken_manager_informed: bool,
    pub late_work_manager_informed: bool,
    pub in_work_client_informed: bool,
    pub closed_client_informed: bool,
    pub reserved_contractors_informed: bool,
    pub all_contractors_informed: bool,
    // TODO: encrypt stored credentials at rest.
    #[sea_orm(column_type = "Text", nullable)]
    pub creds: Option<String>,
    /// Contractor's own completion estimate in hours (1–24), recorded after
    /// pickup. Not applied to the late-work deadline yet.
    pub estimated_hours: Option<i32>,
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

/// Valid range for a contractor's completion estimate.
pub const ESTIMATE_HOURS_RANGE: std::ops::RangeInclusive<i32> = 1..=24;

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub task: String,
    pub creds: String,
}

/// Query string for the admin order listing.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<Status>,
}
