use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `tariffs` table.
///
/// Immutable reference data: monthly order quota, reaction-time SLA and the
/// two capability flags that gate contractor reservation and contact
/// visibility. Clients hold a non-deletable foreign key to exactly one row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tariffs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Maximum number of orders per billing cycle, at least 1.
    pub orders_limit: i32,
    /// Reaction-time SLA in minutes, at least 1.
    pub reaction_time_minutes: i32,
    pub can_reserve_contractor: bool,
    pub can_see_contractor_contacts: bool,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::parties::Entity")]
    Parties,
}

impl Related<super::parties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parties.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Full reaction window in seconds.
    pub fn reaction_time_seconds(&self) -> i64 {
        i64::from(self.reaction_time_minutes) * 60
    }
}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTariff {
    pub name: String,
    pub orders_limit: i32,
    pub reaction_time_minutes: i32,
    pub can_reserve_contractor: bool,
    pub can_see_contractor_contacts: bool,
    pub price: f64,
}

impl CreateTariff {
    /// Quota and reaction time must be at least 1, price non-negative.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty");
        }
        if self.orders_limit < 1 {
            return Err("orders_limit must be at least 1");
        }
        if self.reaction_time_minutes < 1 {
            return Err("reaction_time_minutes must be at least 1");
        }
        if self.price < 0.0 {
            return Err("price must not be negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CreateTariff {
        CreateTariff {
            name: "Standard".to_string(),
            orders_limit: 3,
            reaction_time_minutes: 60,
            can_reserve_contractor: false,
            can_see_contractor_contacts: false,
            price: 990.0,
        }
    }

    #[test]
    fn validate_accepts_sane_tariff() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_fields() {
        let mut t = base();
        t.orders_limit = 0;
        assert!(t.validate().is_err());

        let mut t = base();
        t.reaction_time_minutes = 0;
        assert!(t.validate().is_err());

        let mut t = base();
        t.price = -1.0;
        assert!(t.validate().is_err());
    }
}
