use sea_orm::{DatabaseConnection, DbErr};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::config::SettingsCache;
use crate::db::{
    orders as order_db, parties as party_db, reservations as reservation_db,
    tariffs as tariff_db,
};
use crate::gateway::MessagingGateway;
use crate::models::{orders, parties, tariffs};

/// Who gets told about a still-open order on this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// No reserved contractors exist: everyone available, immediately.
    AllAvailable,
    /// Inside the reserved-contractors window, first pass: reserved only.
    ReservedOnly,
    /// Window elapsed: everyone available except the reserved ones.
    AvailableExceptReserved,
    /// Inside the window but the reserved set was already told: wait.
    Nobody,
}

/// Fan-out decision for one order.
///
/// `window` is the fraction of the reaction-time SLA during which reserved
/// contractors get exclusive first look at the order.
pub fn fanout_audience(
    has_reserved: bool,
    reserved_informed: bool,
    elapsed_seconds: i64,
    reaction_seconds: i64,
    window: f64,
) -> Audience {
    if !has_reserved {
        return Audience::AllAvailable;
    }
    let reaction_fraction = if reaction_seconds > 0 {
        elapsed_seconds as f64 / reaction_seconds as f64
    } else {
        1.0
    };
    if reaction_fraction < window {
        if reserved_informed {
            Audience::Nobody
        } else {
            Audience::ReservedOnly
        }
    } else {
        Audience::AvailableExceptReserved
    }
}

/// Plain text, no claim controls: a button on a stale message could race two
/// contractors onto one order. Taking goes through the order-listing flow.
pub fn new_order_message(task: &str) -> String {
    format!(
        "A new order is available. Open \"list\" in the bot menu and pick it there to take it.\n\nTask:\n{task}"
    )
}

/// New-order fan-out sweep: walk every order whose contractor fan-out is not
/// finished and notify the audience the policy picks. Latches record the
/// progress per order; a failed send is logged and skipped, never retried.
pub async fn fan_out_new_orders<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    settings: &SettingsCache,
) -> Result<(), DbErr> {
    let candidates = order_db::fanout_candidates(db).await?;
    if candidates.is_empty() {
        return Ok(());
    }

    let window = settings.current().await.assigned_contractors_window;
    let available = party_db::available_contractors(db).await?;
    let client_ids: Vec<Uuid> = candidates.iter().map(|order| order.client_id).collect();
    let clients: HashMap<Uuid, parties::Model> = party_db::get_parties_by_ids(db, &client_ids)
        .await?
        .into_iter()
        .map(|party| (party.id, party))
        .collect();
    let tariffs: HashMap<Uuid, tariffs::Model> = tariff_db::get_all_tariffs(db)
        .await?
        .into_iter()
        .map(|tariff| (tariff.id, tariff))
        .collect();

    for order in candidates {
        if let Err(e) = fan_out_one(db, gateway, &order, &clients, &tariffs, &available, window)
            .await
        {
            // Isolate the failure: the rest of the batch still goes out.
            warn!(order_id = %order.id, "new-order fan-out failed for order: {e}");
        }
    }
    Ok(())
}

async fn fan_out_one<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    order: &orders::Model,
    clients: &HashMap<Uuid, parties::Model>,
    tariffs: &HashMap<Uuid, tariffs::Model>,
    available: &[parties::Model],
    window: f64,
) -> Result<(), DbErr> {
    let Some(client) = clients.get(&order.client_id) else {
        warn!(order_id = %order.id, "order has no client row, skipping fan-out");
        return Ok(());
    };
    let Some(tariff) = client.tariff_id.and_then(|id| tariffs.get(&id)) else {
        warn!(order_id = %order.id, "order's client has no tariff, skipping fan-out");
        return Ok(());
    };

    let reserved = reservation_db::reserved_contractor_ids(db, client.id).await?;
    let elapsed = (chrono::Utc::now() - order.created_at).num_seconds();
    let audience = fanout_audience(
        !reserved.is_empty(),
        order.reserved_contractors_informed,
        elapsed,
        tariff.reaction_time_seconds(),
        window,
    );

    let message = new_order_message(&order.task);
    let recipients: Vec<parties::Model> = match audience {
        Audience::Nobody => return Ok(()),
        Audience::AllAvailable => available.to_vec(),
        Audience::AvailableExceptReserved => available
            .iter()
            .filter(|contractor| !reserved.contains(&contractor.id))
            .cloned()
            .collect(),
        Audience::ReservedOnly => party_db::get_parties_by_ids(db, &reserved)
            .await?
            .into_iter()
            .filter(|contractor| contractor.is_active())
            .collect(),
    };

    let all_informed = audience != Audience::ReservedOnly;
    send_and_latch(db, gateway, order, &recipients, &message, all_informed).await
}

async fn send_and_latch<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    order: &orders::Model,
    recipients: &[parties::Model],
    message: &str,
    all_informed: bool,
) -> Result<(), DbErr> {
    for contractor in recipients {
        let Some(chat_id) = contractor.chat_id else {
            continue;
        };
        if let Err(e) = gateway.send(chat_id, message).await {
            warn!(nick = %contractor.nick, "could not notify contractor: {e}");
        }
    }
    order_db::mark_fanout_informed(db, order.id, all_informed).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3600;

    #[test]
    fn no_reservations_broadcasts_immediately() {
        // Very first pass, zero elapsed time.
        assert_eq!(
            fanout_audience(false, false, 0, HOUR, 0.20),
            Audience::AllAvailable
        );
    }

    #[test]
    fn reserved_get_exclusive_first_look_inside_window() {
        assert_eq!(
            fanout_audience(true, false, 5 * 60, HOUR, 0.20),
            Audience::ReservedOnly
        );
    }

    #[test]
    fn second_pass_inside_window_waits() {
        assert_eq!(
            fanout_audience(true, true, 5 * 60, HOUR, 0.20),
            Audience::Nobody
        );
    }

    #[test]
    fn window_elapsed_notifies_the_rest() {
        assert_eq!(
            fanout_audience(true, true, 30 * 60, HOUR, 0.20),
            Audience::AvailableExceptReserved
        );
        // Same even when the reserved pass never happened (late first sweep).
        assert_eq!(
            fanout_audience(true, false, 30 * 60, HOUR, 0.20),
            Audience::AvailableExceptReserved
        );
    }

    #[test]
    fn window_boundary_is_exclusive() {
        // Exactly at the window the exclusive period is over.
        assert_eq!(
            fanout_audience(true, false, 12 * 60, HOUR, 0.20),
            Audience::AvailableExceptReserved
        );
    }

    #[test]
    fn message_carries_task_and_no_controls() {
        let text = new_order_message("fix the mail server");
        assert!(text.contains("fix the mail server"));
        assert!(text.contains("list"));
    }
}
