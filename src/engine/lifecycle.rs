use chrono::Utc;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::config::RuntimeSettings;
use crate::db::{
    orders as order_db, parties as party_db, reservations as reservation_db,
    tariffs as tariff_db,
};
use crate::engine::billing::billing_cycle_start;
use crate::engine::error::EngineError;
use crate::models::orders::{self, CreateOrder, ESTIMATE_HOURS_RANGE, Status};
use crate::models::parties::{self, PartyKind, Role};

/// Is the move `from → to` a legal lifecycle step?
///
/// The only forward path is created → in_work → closed; cancel is allowed
/// from any non-terminal status. Closed and cancelled are terminal.
pub fn validate_transition(from: Status, to: Status) -> Result<(), EngineError> {
    let allowed = match to {
        Status::InWork => from == Status::Created,
        Status::Closed => from == Status::InWork,
        Status::Cancelled => !from.is_terminal(),
        Status::Created => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition { from, to })
    }
}

/// Pre-insert guards for a new order, in user-facing precedence: an unpaid
/// tariff blocks everything, a still-open order beats the quota message.
pub fn check_create_guards(
    paid: bool,
    has_active_order: bool,
    billable_count: u64,
    orders_limit: i32,
) -> Result<(), EngineError> {
    if !paid {
        return Err(EngineError::PaymentRequired);
    }
    if has_active_order {
        return Err(EngineError::ActiveOrderExists);
    }
    if billable_count >= u64::try_from(orders_limit).unwrap_or(0) {
        return Err(EngineError::QuotaExceeded);
    }
    Ok(())
}

/// Run the creation guards without inserting anything, so the conversation
/// flow can reject before asking the client to type out a task.
pub async fn precheck_create(
    db: &DatabaseConnection,
    settings: RuntimeSettings,
    client: &parties::Model,
) -> Result<(), EngineError> {
    let Some(PartyKind::Client { tariff_id, paid }) = client.kind() else {
        return Err(EngineError::MissingTariff);
    };
    let tariff = tariff_db::get_tariff_by_id(db, tariff_id)
        .await?
        .ok_or(EngineError::MissingTariff)?;

    let has_active = order_db::has_active_order(db, client.id).await?;
    let cycle_start = billing_cycle_start(Utc::now(), settings.billing_day);
    let billable = order_db::count_billable_since(db, client.id, cycle_start).await?;
    check_create_guards(paid, has_active, billable, tariff.orders_limit)
}

/// File a new order for a client.
pub async fn create_order(
    db: &DatabaseConnection,
    settings: RuntimeSettings,
    client: &parties::Model,
    input: CreateOrder,
) -> Result<orders::Model, EngineError> {
    precheck_create(db, settings, client).await?;
    Ok(order_db::insert_order(db, client.id, input).await?)
}

/// Contractor picks an order up: created → in_work.
///
/// The underlying write is conditioned on the order still being `created`,
/// so of two racing pickups exactly one succeeds; the loser gets
/// `InvalidTransition` and the order keeps its single contractor.
pub async fn take_in_work(
    db: &DatabaseConnection,
    order_id: Uuid,
    contractor: &parties::Model,
) -> Result<orders::Model, EngineError> {
    if contractor.role != Role::Contractor {
        return Err(EngineError::WrongRole);
    }
    let order = order_db::get_order_by_id(db, order_id)
        .await?
        .ok_or(EngineError::OrderNotFound)?;
    validate_transition(order.status, Status::InWork)?;

    let changed = order_db::take_in_work(db, order_id, contractor.id, Utc::now()).await?;
    if !changed {
        // Lost the race: someone else moved the order first.
        return Err(refreshed_transition_error(db, order_id, Status::InWork).await?);
    }
    order_db::get_order_by_id(db, order_id)
        .await?
        .ok_or(EngineError::OrderNotFound)
}

/// Finish an order: in_work → closed. Erases the stored credentials.
pub async fn close_work(
    db: &DatabaseConnection,
    order_id: Uuid,
) -> Result<orders::Model, EngineError> {
    let order = order_db::get_order_by_id(db, order_id)
        .await?
        .ok_or(EngineError::OrderNotFound)?;
    validate_transition(order.status, Status::Closed)?;

    let changed = order_db::close_work(db, order_id, Utc::now()).await?;
    if !changed {
        return Err(refreshed_transition_error(db, order_id, Status::Closed).await?);
    }
    order_db::get_order_by_id(db, order_id)
        .await?
        .ok_or(EngineError::OrderNotFound)
}

/// Abort an order from any non-terminal status. Erases the credentials.
pub async fn cancel_work(
    db: &DatabaseConnection,
    order_id: Uuid,
) -> Result<orders::Model, EngineError> {
    let order = order_db::get_order_by_id(db, order_id)
        .await?
        .ok_or(EngineError::OrderNotFound)?;
    validate_transition(order.status, Status::Cancelled)?;

    let changed = order_db::cancel_work(db, order_id, Utc::now()).await?;
    if !changed {
        return Err(refreshed_transition_error(db, order_id, Status::Cancelled).await?);
    }
    order_db::get_order_by_id(db, order_id)
        .await?
        .ok_or(EngineError::OrderNotFound)
}

/// Re-read the order after a zero-row conditional update to report the
/// transition that actually failed.
async fn refreshed_transition_error(
    db: &DatabaseConnection,
    order_id: Uuid,
    to: Status,
) -> Result<EngineError, EngineError> {
    let current = order_db::get_order_by_id(db, order_id)
        .await?
        .ok_or(EngineError::OrderNotFound)?;
    Ok(EngineError::InvalidTransition {
        from: current.status,
        to,
    })
}

/// Contractor records how many hours their in-work order should take.
pub async fn set_estimate(
    db: &DatabaseConnection,
    order_id: Uuid,
    contractor: &parties::Model,
    hours: i32,
) -> Result<(), EngineError> {
    if !ESTIMATE_HOURS_RANGE.contains(&hours) {
        return Err(EngineError::EstimateOutOfRange);
    }
    let changed = order_db::set_estimate(db, order_id, contractor.id, hours).await?;
    if !changed {
        return Err(EngineError::NotInWork);
    }
    Ok(())
}

/// Outcome of a reservation attempt, reported back to the client as chat
/// text. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved(String),
    AlreadyReserved(String),
    NoClosedOrders,
    NotPermitted,
}

/// Bind the contractor of the client's most recently closed order.
///
/// Gated by the tariff's reserve capability and requires at least one closed
/// order. Binding an already-reserved contractor is an idempotent no-op
/// reported as such.
pub async fn reserve_last_contractor(
    db: &DatabaseConnection,
    client: &parties::Model,
) -> Result<ReserveOutcome, EngineError> {
    let Some(PartyKind::Client { tariff_id, .. }) = client.kind() else {
        return Err(EngineError::MissingTariff);
    };
    let tariff = tariff_db::get_tariff_by_id(db, tariff_id)
        .await?
        .ok_or(EngineError::MissingTariff)?;
    if !tariff.can_reserve_contractor {
        return Ok(ReserveOutcome::NotPermitted);
    }

    let Some(last_closed) = order_db::last_closed_order(db, client.id).await? else {
        return Ok(ReserveOutcome::NoClosedOrders);
    };
    let Some(contractor_id) = last_closed.contractor_id else {
        return Ok(ReserveOutcome::NoClosedOrders);
    };

    let nick = party_db::get_party_by_id(db, contractor_id)
        .await?
        .map(|contractor| contractor.nick)
        .unwrap_or_else(|| "unknown".to_string());

    if reservation_db::is_reserved(db, client.id, contractor_id).await? {
        return Ok(ReserveOutcome::AlreadyReserved(nick));
    }
    reservation_db::insert_reservation(db, client.id, contractor_id).await?;
    Ok(ReserveOutcome::Reserved(nick))
}

/// Off-board a contractor: their in-work orders go back to the open pool in
/// one statement, then the contractor is marked inactive. Returns how many
/// orders were freed.
pub async fn release_contractor(
    db: &DatabaseConnection,
    contractor: &parties::Model,
) -> Result<u64, EngineError> {
    if contractor.role != Role::Contractor {
        return Err(EngineError::WrongRole);
    }
    let freed = order_db::release_contractor_orders(db, contractor.id).await?;
    party_db::deactivate_party(db, contractor.id).await?;
    Ok(freed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forward_transitions_are_allowed() {
        use Status::*;
        let legal = [
            (Created, InWork),
            (InWork, Closed),
            (Created, Cancelled),
            (InWork, Cancelled),
        ];

        for from in [Created, InWork, Closed, Cancelled] {
            for to in [Created, InWork, Closed, Cancelled] {
                let result = validate_transition(from, to);
                if legal.contains(&(from, to)) {
                    assert!(result.is_ok(), "{from:?} -> {to:?} should be legal");
                } else {
                    assert!(
                        matches!(
                            result,
                            Err(EngineError::InvalidTransition { from: f, to: t })
                                if f == from && t == to
                        ),
                        "{from:?} -> {to:?} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn terminal_statuses_allow_nothing() {
        for from in [Status::Closed, Status::Cancelled] {
            for to in [Status::Created, Status::InWork, Status::Closed, Status::Cancelled] {
                assert!(validate_transition(from, to).is_err());
            }
        }
    }

    #[test]
    fn unpaid_tariff_blocks_creation() {
        assert!(matches!(
            check_create_guards(false, false, 0, 3),
            Err(EngineError::PaymentRequired)
        ));
    }

    #[test]
    fn active_order_beats_quota_in_precedence() {
        // Quota is also exhausted here, but the still-open order is the
        // message the client should see.
        assert!(matches!(
            check_create_guards(true, true, 1, 1),
            Err(EngineError::ActiveOrderExists)
        ));
    }

    #[test]
    fn quota_boundary() {
        assert!(check_create_guards(true, false, 2, 3).is_ok());
        assert!(matches!(
            check_create_guards(true, false, 3, 3),
            Err(EngineError::QuotaExceeded)
        ));
    }
}
