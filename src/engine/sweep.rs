use chrono::Utc;
use sea_orm::{DatabaseConnection, DbErr};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::SettingsCache;
use crate::db::{orders as order_db, parties as party_db, tariffs as tariff_db};
use crate::engine::fanout;
use crate::gateway::MessagingGateway;
use crate::models::{parties, tariffs};

/// All sweeps run on the same cadence; the initial offsets stagger them so
/// the ticks never pile onto the database at once.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const NOT_TAKEN_OFFSET: Duration = Duration::from_secs(10);
const NOT_CLOSED_OFFSET: Duration = Duration::from_secs(20);
const FANOUT_OFFSET: Duration = Duration::from_secs(30);
const CLIENT_STATUS_OFFSET: Duration = Duration::from_secs(40);

/// Has this order burned more than `threshold` of its SLA limit?
pub fn is_warning(elapsed_seconds: i64, limit_seconds: i64, threshold: f64) -> bool {
    limit_seconds > 0 && elapsed_seconds as f64 / limit_seconds as f64 > threshold
}

/// Batch alert for orders nobody has picked up.
pub fn not_taken_alert<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut message = String::from("Some orders have been waiting too long for a contractor\n");
    for (task, client_nick) in items {
        message.push_str(&format!("\nTask: {task}\nClient contact: @{client_nick}\n"));
    }
    message
}

/// Batch alert for orders stuck in work past the deadline.
pub fn late_work_alert<'a>(
    items: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
) -> String {
    let mut message = String::from("Some orders are taking too long to finish\n");
    for (task, contractor_nick, client_nick) in items {
        message.push_str(&format!(
            "\nTask: {task}\nContractor contact: @{contractor_nick}\nClient contact: @{client_nick}\n"
        ));
    }
    message
}

/// Notice to the client that their order went into work. The contractor's
/// contact is only revealed on tariffs that allow it.
pub fn order_taken_notice(task: &str, contractor_nick: Option<&str>) -> String {
    let mut message = format!("Your order was taken into work.\n\nTask:\n{task}");
    if let Some(nick) = contractor_nick {
        message.push_str(&format!("\n\nContractor contact: @{nick}"));
    }
    message
}

/// Notice to the client that their order is finished.
pub fn order_closed_notice(task: &str) -> String {
    format!("Your order is done. Thank you for using our support!\n\nTask:\n{task}")
}

/// Spawn the four periodic sweeps. Each runs forever; a failed iteration is
/// logged and the next tick starts clean, because every notification is
/// latched on the order itself.
pub fn spawn_sweeps<G>(db: DatabaseConnection, gateway: G, settings: SettingsCache)
where
    G: MessagingGateway + Clone + 'static,
{
    {
        let (db, gateway, settings) = (db.clone(), gateway.clone(), settings.clone());
        tokio::spawn(async move {
            tokio::time::sleep(NOT_TAKEN_OFFSET).await;
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = not_taken_sweep(&db, &gateway, &settings).await {
                    error!("not-taken sweep failed: {e}");
                }
            }
        });
    }

    {
        let (db, gateway, settings) = (db.clone(), gateway.clone(), settings.clone());
        tokio::spawn(async move {
            tokio::time::sleep(NOT_CLOSED_OFFSET).await;
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = not_closed_sweep(&db, &gateway, &settings).await {
                    error!("not-closed sweep failed: {e}");
                }
            }
        });
    }

    {
        let (db, gateway, settings) = (db.clone(), gateway.clone(), settings.clone());
        tokio::spawn(async move {
            tokio::time::sleep(FANOUT_OFFSET).await;
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = fanout::fan_out_new_orders(&db, &gateway, &settings).await {
                    error!("new-order fan-out sweep failed: {e}");
                }
            }
        });
    }

    tokio::spawn(async move {
        tokio::time::sleep(CLIENT_STATUS_OFFSET).await;
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = client_status_sweep(&db, &gateway).await {
                error!("client-status sweep failed: {e}");
            }
        }
    });
}

/// Escalate orders that nobody took within the tariff's reaction window.
/// One batch message to every active manager, then the whole batch is
/// latched so the next tick stays quiet.
pub async fn not_taken_sweep<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    settings: &SettingsCache,
) -> Result<(), DbErr> {
    let candidates = order_db::not_taken_candidates(db).await?;
    if candidates.is_empty() {
        return Ok(());
    }

    let threshold = settings.current().await.warning_threshold;
    let clients = load_parties(db, candidates.iter().map(|order| order.client_id)).await?;
    let tariffs = load_tariffs(db).await?;
    let now = Utc::now();

    let mut warned_ids = Vec::new();
    let mut entries = Vec::new();
    for order in &candidates {
        let Some(client) = clients.get(&order.client_id) else {
            continue;
        };
        let Some(tariff) = client.tariff_id.and_then(|id| tariffs.get(&id)) else {
            continue;
        };
        let elapsed = (now - order.created_at).num_seconds();
        if is_warning(elapsed, tariff.reaction_time_seconds(), threshold) {
            warned_ids.push(order.id);
            entries.push((order.task.as_str(), client.nick.as_str()));
        }
    }
    if warned_ids.is_empty() {
        return Ok(());
    }

    notify_managers(db, gateway, &not_taken_alert(entries)).await?;
    order_db::mark_not_taken_informed(db, &warned_ids).await
}

/// Escalate in-work orders past the completion deadline.
pub async fn not_closed_sweep<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    settings: &SettingsCache,
) -> Result<(), DbErr> {
    let candidates = order_db::not_closed_candidates(db).await?;
    if candidates.is_empty() {
        return Ok(());
    }

    let snapshot = settings.current().await;
    // TODO: apply the order's estimated_hours to the deadline when present.
    let limit_seconds = snapshot.work_deadline_hours * 3600;
    let threshold = snapshot.warning_threshold;
    let involved: Vec<Uuid> = candidates
        .iter()
        .flat_map(|order| [Some(order.client_id), order.contractor_id])
        .flatten()
        .collect();
    let people = load_parties(db, involved).await?;
    let now = Utc::now();

    let mut warned_ids = Vec::new();
    let mut entries = Vec::new();
    for order in &candidates {
        let Some(assigned_at) = order.assigned_at else {
            continue;
        };
        let elapsed = (now - assigned_at).num_seconds();
        if !is_warning(elapsed, limit_seconds, threshold) {
            continue;
        }
        let contractor_nick = order
            .contractor_id
            .and_then(|id| people.get(&id))
            .map_or("unknown", |party| party.nick.as_str());
        let client_nick = people
            .get(&order.client_id)
            .map_or("unknown", |party| party.nick.as_str());
        warned_ids.push(order.id);
        entries.push((order.task.as_str(), contractor_nick, client_nick));
    }
    if warned_ids.is_empty() {
        return Ok(());
    }

    notify_managers(db, gateway, &late_work_alert(entries)).await?;
    order_db::mark_late_work_informed(db, &warned_ids).await
}

/// Tell clients their order was taken or finished, once each.
pub async fn client_status_sweep<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
) -> Result<(), DbErr> {
    let taken = order_db::in_work_not_client_informed(db).await?;
    let finished = order_db::closed_not_client_informed(db).await?;
    if taken.is_empty() && finished.is_empty() {
        return Ok(());
    }

    let involved: Vec<Uuid> = taken
        .iter()
        .chain(finished.iter())
        .flat_map(|order| [Some(order.client_id), order.contractor_id])
        .flatten()
        .collect();
    let people = load_parties(db, involved).await?;
    let tariffs = load_tariffs(db).await?;

    for order in &taken {
        let Some(client) = people.get(&order.client_id) else {
            continue;
        };
        let Some(chat_id) = client.chat_id else {
            // Client never wrote to the bot yet; retry on a later tick.
            continue;
        };
        let contacts_visible = client
            .tariff_id
            .and_then(|id| tariffs.get(&id))
            .is_some_and(|tariff| tariff.can_see_contractor_contacts);
        let contractor_nick = order
            .contractor_id
            .filter(|_| contacts_visible)
            .and_then(|id| people.get(&id))
            .map(|party| party.nick.as_str());
        if let Err(e) = gateway
            .send(chat_id, &order_taken_notice(&order.task, contractor_nick))
            .await
        {
            warn!(nick = %client.nick, "could not send taken-notice: {e}");
        }
        order_db::mark_in_work_client_informed(db, order.id).await?;
    }

    for order in &finished {
        let Some(client) = people.get(&order.client_id) else {
            continue;
        };
        let Some(chat_id) = client.chat_id else {
            continue;
        };
        if let Err(e) = gateway
            .send(chat_id, &order_closed_notice(&order.task))
            .await
        {
            warn!(nick = %client.nick, "could not send closed-notice: {e}");
        }
        order_db::mark_closed_client_informed(db, order.id).await?;
    }
    Ok(())
}

/// Deliver one alert to every active manager. A transport failure for one
/// manager never blocks the others.
async fn notify_managers<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    message: &str,
) -> Result<(), DbErr> {
    for manager in party_db::active_managers(db).await? {
        let Some(chat_id) = manager.chat_id else {
            continue;
        };
        if let Err(e) = gateway.send(chat_id, message).await {
            warn!(nick = %manager.nick, "could not notify manager: {e}");
        }
    }
    Ok(())
}

async fn load_parties(
    db: &DatabaseConnection,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, parties::Model>, DbErr> {
    let mut unique: Vec<Uuid> = ids.into_iter().collect();
    unique.sort_unstable();
    unique.dedup();
    Ok(party_db::get_parties_by_ids(db, &unique)
        .await?
        .into_iter()
        .map(|party| (party.id, party))
        .collect())
}

async fn load_tariffs(db: &DatabaseConnection) -> Result<HashMap<Uuid, tariffs::Model>, DbErr> {
    Ok(tariff_db::get_all_tariffs(db)
        .await?
        .into_iter()
        .map(|tariff| (tariff.id, tariff))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_requires_crossing_the_threshold() {
        let limit = 60 * 60; // one hour
        assert!(!is_warning(0, limit, 0.95));
        assert!(!is_warning(57 * 60, limit, 0.95)); // exactly 0.95, not past it
        assert!(is_warning(57 * 60 + 1, limit, 0.95));
        assert!(is_warning(2 * limit, limit, 0.95));
    }

    #[test]
    fn warning_never_fires_on_degenerate_limits() {
        assert!(!is_warning(100, 0, 0.95));
        assert!(!is_warning(100, -60, 0.95));
    }

    #[test]
    fn not_taken_alert_lists_every_order() {
        let message = not_taken_alert([
            ("restore the backup", "client_one"),
            ("renew the certs", "client_two"),
        ]);
        assert!(message.contains("Task: restore the backup"));
        assert!(message.contains("@client_one"));
        assert!(message.contains("Task: renew the certs"));
        assert!(message.contains("@client_two"));
    }

    #[test]
    fn late_work_alert_names_both_contacts() {
        let message = late_work_alert([("migrate the wiki", "the_contractor", "the_client")]);
        assert!(message.contains("Contractor contact: @the_contractor"));
        assert!(message.contains("Client contact: @the_client"));
    }

    #[test]
    fn taken_notice_hides_contact_unless_allowed() {
        let visible = order_taken_notice("reset passwords", Some("helpful_hands"));
        assert!(visible.contains("@helpful_hands"));

        let hidden = order_taken_notice("reset passwords", None);
        assert!(!hidden.contains('@'));
        assert!(hidden.contains("reset passwords"));
    }
}
