use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::models::parties::{self, CreateParty, Role, Status};

/// Resolve the acting party for an inbound chat event.
///
/// Active parties are matched by external chat id first, then by nickname.
/// Whichever key matched, the other one is repaired in place when it drifted
/// (nickname changes, or the first contact fills in a missing chat id).
/// Returns `Ok(None)` when neither lookup succeeds — the caller maps that to
/// the unauthenticated flow.
pub async fn resolve_party(
    db: &DatabaseConnection,
    chat_id: i64,
    nick: &str,
) -> Result<Option<parties::Model>, DbErr> {
    let by_chat_id = parties::Entity::find()
        .filter(parties::Column::Status.eq(Status::Active))
        .filter(parties::Column::ChatId.eq(chat_id))
        .one(db)
        .await?;

    if let Some(party) = by_chat_id {
        if party.nick != nick {
            let mut active: parties::ActiveModel = party.into();
            active.nick = Set(nick.to_string());
            return active.update(db).await.map(Some);
        }
        return Ok(Some(party));
    }

    let by_nick = parties::Entity::find()
        .filter(parties::Column::Status.eq(Status::Active))
        .filter(parties::Column::Nick.eq(nick))
        .one(db)
        .await?;

    match by_nick {
        Some(party) if party.chat_id != Some(chat_id) => {
            let mut active: parties::ActiveModel = party.into();
            active.chat_id = Set(Some(chat_id));
            active.update(db).await.map(Some)
        }
        other => Ok(other),
    }
}

/// Insert a new party (admin operation).
pub async fn insert_party(
    db: &DatabaseConnection,
    input: CreateParty,
) -> Result<parties::Model, DbErr> {
    let new_party = parties::ActiveModel {
        id: Set(Uuid::new_v4()),
        nick: Set(input.nick),
        chat_id: Set(input.chat_id),
        role: Set(input.role),
        status: Set(Status::Active),
        bot_state: Set(None),
        tariff_id: Set(input.tariff_id),
        paid: Set(input.paid),
        created_at: Set(chrono::Utc::now()),
    };

    new_party.insert(db).await
}

/// Fetch a single party by ID.
pub async fn get_party_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<parties::Model>, DbErr> {
    parties::Entity::find_by_id(id).one(db).await
}

/// Fetch parties, optionally narrowed to one role.
pub async fn get_parties(
    db: &DatabaseConnection,
    role: Option<Role>,
) -> Result<Vec<parties::Model>, DbErr> {
    let mut query = parties::Entity::find();
    if let Some(role) = role {
        query = query.filter(parties::Column::Role.eq(role));
    }
    query.all(db).await
}

/// Fetch several parties by ID in one query.
pub async fn get_parties_by_ids(
    db: &DatabaseConnection,
    ids: &[Uuid],
) -> Result<Vec<parties::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    parties::Entity::find()
        .filter(parties::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await
}

/// All active managers (escalation alert recipients).
pub async fn active_managers(db: &DatabaseConnection) -> Result<Vec<parties::Model>, DbErr> {
    parties::Entity::find()
        .filter(parties::Column::Role.eq(Role::Manager))
        .filter(parties::Column::Status.eq(Status::Active))
        .all(db)
        .await
}

/// Contractors able to take a new order right now.
///
/// Availability is derived, never stored: a contractor is unavailable while
/// holding any order in `in_work` status.
pub async fn available_contractors(
    db: &DatabaseConnection,
) -> Result<Vec<parties::Model>, DbErr> {
    let busy = super::orders::busy_contractor_ids(db).await?;

    let mut query = parties::Entity::find()
        .filter(parties::Column::Role.eq(Role::Contractor))
        .filter(parties::Column::Status.eq(Status::Active));
    if !busy.is_empty() {
        query = query.filter(parties::Column::Id.is_not_in(busy));
    }
    query.all(db).await
}

/// Persist the session driver's conversation-state label.
pub async fn set_bot_state(
    db: &DatabaseConnection,
    party_id: Uuid,
    state: Option<String>,
) -> Result<(), DbErr> {
    parties::Entity::update_many()
        .col_expr(parties::Column::BotState, Expr::value(state))
        .filter(parties::Column::Id.eq(party_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Mark a party inactive. Contractor off-boarding goes through
/// `engine::lifecycle::release_contractor` instead, which also frees their
/// orders.
pub async fn deactivate_party(db: &DatabaseConnection, id: Uuid) -> Result<(), DbErr> {
    parties::Entity::update_many()
        .col_expr(parties::Column::Status, Expr::value(Status::Inactive))
        .filter(parties::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}
