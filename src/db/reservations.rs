use sea_orm::*;
use uuid::Uuid;

use crate::models::reservations;

/// Contractors the client has reserved, as bare IDs.
pub async fn reserved_contractor_ids(
    db: &DatabaseConnection,
    client_id: Uuid,
) -> Result<Vec<Uuid>, DbErr> {
    let ids: Vec<Uuid> = reservations::Entity::find()
        .select_only()
        .column(reservations::Column::ContractorId)
        .filter(reservations::Column::ClientId.eq(client_id))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids)
}

/// Is this contractor already reserved by the client?
pub async fn is_reserved(
    db: &DatabaseConnection,
    client_id: Uuid,
    contractor_id: Uuid,
) -> Result<bool, DbErr> {
    let count = reservations::Entity::find()
        .filter(reservations::Column::ClientId.eq(client_id))
        .filter(reservations::Column::ContractorId.eq(contractor_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Create the client ↔ contractor reservation link.
pub async fn insert_reservation(
    db: &DatabaseConnection,
    client_id: Uuid,
    contractor_id: Uuid,
) -> Result<reservations::Model, DbErr> {
    let new_reservation = reservations::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(client_id),
        contractor_id: Set(contractor_id),
        created_at: Set(chrono::Utc::now()),
    };

    new_reservation.insert(db).await
}
