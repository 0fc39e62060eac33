use sea_orm::*;
use uuid::Uuid;

use crate::models::tariffs::{self, CreateTariff};

/// Insert a new tariff (admin operation).
pub async fn insert_tariff(
    db: &DatabaseConnection,
    input: CreateTariff,
) -> Result<tariffs::Model, DbErr> {
    let new_tariff = tariffs::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name),
        orders_limit: Set(input.orders_limit),
        reaction_time_minutes: Set(input.reaction_time_minutes),
        can_reserve_contractor: Set(input.can_reserve_contractor),
        can_see_contractor_contacts: Set(input.can_see_contractor_contacts),
        price: Set(input.price),
    };

    new_tariff.insert(db).await
}

/// Fetch all tariffs.
pub async fn get_all_tariffs(db: &DatabaseConnection) -> Result<Vec<tariffs::Model>, DbErr> {
    tariffs::Entity::find().all(db).await
}

/// Fetch a single tariff by ID.
pub async fn get_tariff_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<tariffs::Model>, DbErr> {
    tariffs::Entity::find_by_id(id).one(db).await
}
