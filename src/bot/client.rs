use sea_orm::{DatabaseConnection, DbErr};

use crate::bot::send_or_log;
use crate::config::SettingsCache;
use crate::db::{orders as order_db, parties as party_db, tariffs as tariff_db};
use crate::engine::lifecycle::{self, ReserveOutcome};
use crate::engine::EngineError;
use crate::gateway::MessagingGateway;
use crate::models::orders::{CreateOrder, Status};
use crate::models::parties::{self, PartyKind};

pub const MENU: &str = "CLIENT_MENU";
pub const AWAITING_TASK: &str = "AWAITING_TASK";
/// The pending task text rides inside the state label so it survives between
/// the two collection steps: `AWAITING_CREDS|<task>`.
const AWAITING_CREDS_PREFIX: &str = "AWAITING_CREDS|";

const BACK: &str = "back";

pub(crate) fn encode_awaiting_creds(task: &str) -> String {
    format!("{AWAITING_CREDS_PREFIX}{task}")
}

pub(crate) fn decode_awaiting_creds(state: &str) -> Option<&str> {
    state.strip_prefix(AWAITING_CREDS_PREFIX)
}

/// Client conversation flow. Returns the next state label.
pub async fn handle<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    settings: &SettingsCache,
    client: &parties::Model,
    chat_id: i64,
    state: &str,
    text: &str,
) -> Result<String, DbErr> {
    if let Some(task) = decode_awaiting_creds(state) {
        return awaiting_creds(db, gateway, settings, client, chat_id, task, text).await;
    }
    match state {
        AWAITING_TASK => awaiting_task(db, gateway, client, chat_id, text).await,
        MENU => menu_choice(db, gateway, settings, client, chat_id, text).await,
        _ => show_menu(db, gateway, client, chat_id).await,
    }
}

/// Send the menu; options 4 and 5 only exist on tariffs that include them.
async fn show_menu<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    client: &parties::Model,
    chat_id: i64,
) -> Result<String, DbErr> {
    let mut menu = String::from(
        "Hello! What would you like to do?\n\
         1. File a new order\n\
         2. My order status\n\
         3. Cancel my order",
    );
    if let Some(tariff) = client_tariff(db, client).await? {
        if tariff.can_see_contractor_contacts {
            menu.push_str("\n4. Contractors who helped me");
        }
        if tariff.can_reserve_contractor {
            menu.push_str("\n5. Reserve my last contractor");
        }
    }
    menu.push_str("\n\nReply with a number.");
    send_or_log(gateway, chat_id, &menu).await;
    Ok(MENU.to_string())
}

async fn menu_choice<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    settings: &SettingsCache,
    client: &parties::Model,
    chat_id: i64,
    text: &str,
) -> Result<String, DbErr> {
    match text {
        "1" => {
            // Reject early so the client does not type a task for nothing.
            match lifecycle::precheck_create(db, settings.current().await, client).await {
                Ok(()) => {
                    send_or_log(
                        gateway,
                        chat_id,
                        "Describe your task in one message. Reply \"back\" to return to the menu.",
                    )
                    .await;
                    Ok(AWAITING_TASK.to_string())
                }
                Err(EngineError::Db(e)) => Err(e),
                Err(rejection) => {
                    send_or_log(gateway, chat_id, &rejection_text(&rejection)).await;
                    show_menu(db, gateway, client, chat_id).await
                }
            }
        }
        "2" => {
            let message = match active_order(db, client).await? {
                Some(order) if order.status == Status::Created => {
                    "Your order is waiting for a contractor.".to_string()
                }
                Some(_) => "Your order is in work.".to_string(),
                None => "You have no active order.".to_string(),
            };
            send_or_log(gateway, chat_id, &message).await;
            show_menu(db, gateway, client, chat_id).await
        }
        "3" => {
            let message = match active_order(db, client).await? {
                Some(order) => match lifecycle::cancel_work(db, order.id).await {
                    Ok(_) => "Your order was cancelled.".to_string(),
                    Err(EngineError::Db(e)) => return Err(e),
                    Err(_) => "The order can no longer be cancelled.".to_string(),
                },
                None => "You have no active order to cancel.".to_string(),
            };
            send_or_log(gateway, chat_id, &message).await;
            show_menu(db, gateway, client, chat_id).await
        }
        "4" => {
            send_or_log(gateway, chat_id, &contractors_list(db, client).await?).await;
            show_menu(db, gateway, client, chat_id).await
        }
        "5" => {
            let message = match lifecycle::reserve_last_contractor(db, client).await {
                Ok(ReserveOutcome::Reserved(nick)) => {
                    format!("Contractor @{nick} is now reserved for you.")
                }
                Ok(ReserveOutcome::AlreadyReserved(nick)) => {
                    format!("Contractor @{nick} was already reserved for you.")
                }
                Ok(ReserveOutcome::NoClosedOrders) => {
                    "You have no finished orders yet.".to_string()
                }
                Ok(ReserveOutcome::NotPermitted) => {
                    "Your tariff does not include reserving a contractor.".to_string()
                }
                Err(EngineError::Db(e)) => return Err(e),
                Err(_) => "Something went wrong, please try again.".to_string(),
            };
            send_or_log(gateway, chat_id, &message).await;
            show_menu(db, gateway, client, chat_id).await
        }
        _ => {
            send_or_log(gateway, chat_id, "I didn't get that, pick one of the numbers.").await;
            show_menu(db, gateway, client, chat_id).await
        }
    }
}

async fn awaiting_task<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    client: &parties::Model,
    chat_id: i64,
    text: &str,
) -> Result<String, DbErr> {
    if text.eq_ignore_ascii_case(BACK) || text.is_empty() {
        return show_menu(db, gateway, client, chat_id).await;
    }
    send_or_log(
        gateway,
        chat_id,
        "Now send the access credentials in one message.\nExample:\nLogin: admin\nPassword: qwerty",
    )
    .await;
    Ok(encode_awaiting_creds(text))
}

async fn awaiting_creds<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    settings: &SettingsCache,
    client: &parties::Model,
    chat_id: i64,
    task: &str,
    text: &str,
) -> Result<String, DbErr> {
    if text.eq_ignore_ascii_case(BACK) || text.is_empty() {
        send_or_log(gateway, chat_id, "Describe your task in one message.").await;
        return Ok(AWAITING_TASK.to_string());
    }

    let input = CreateOrder {
        task: task.to_string(),
        creds: text.to_string(),
    };
    match lifecycle::create_order(db, settings.current().await, client, input).await {
        Ok(_) => {
            let window = match client_tariff(db, client).await? {
                Some(tariff) => {
                    let minutes = tariff.reaction_time_minutes;
                    format!(
                        "It should be taken within {} h {} min.",
                        minutes / 60,
                        minutes % 60
                    )
                }
                None => String::new(),
            };
            send_or_log(
                gateway,
                chat_id,
                &format!("Thank you! Your order is filed. {window}"),
            )
            .await;
        }
        Err(EngineError::Db(e)) => return Err(e),
        Err(rejection) => {
            send_or_log(gateway, chat_id, &rejection_text(&rejection)).await;
        }
    }
    show_menu(db, gateway, client, chat_id).await
}

/// User-facing text for a business rejection.
fn rejection_text(rejection: &EngineError) -> String {
    match rejection {
        EngineError::PaymentRequired => {
            "Your tariff is not paid yet, ordering is disabled.".to_string()
        }
        EngineError::ActiveOrderExists => {
            "Your previous order is still being handled, please wait.".to_string()
        }
        EngineError::QuotaExceeded => {
            "You are out of orders on your tariff this month. An upgrade lifts the limit."
                .to_string()
        }
        other => format!("Could not file the order: {other}"),
    }
}

async fn active_order(
    db: &DatabaseConnection,
    client: &parties::Model,
) -> Result<Option<crate::models::orders::Model>, DbErr> {
    order_db::active_order_of_client(db, client.id).await
}

async fn contractors_list(
    db: &DatabaseConnection,
    client: &parties::Model,
) -> Result<String, DbErr> {
    let allowed = client_tariff(db, client)
        .await?
        .is_some_and(|tariff| tariff.can_see_contractor_contacts);
    if !allowed {
        return Ok("Your tariff does not include contractor contacts.".to_string());
    }
    let ids = order_db::contractor_ids_of_closed_orders(db, client.id).await?;
    if ids.is_empty() {
        return Ok("You have no finished orders yet.".to_string());
    }
    let nicks: Vec<String> = party_db::get_parties_by_ids(db, &ids)
        .await?
        .into_iter()
        .map(|contractor| format!("@{}", contractor.nick))
        .collect();
    Ok(format!("Contractors who worked for you:\n{}", nicks.join("\n")))
}

async fn client_tariff(
    db: &DatabaseConnection,
    client: &parties::Model,
) -> Result<Option<crate::models::tariffs::Model>, DbErr> {
    let Some(PartyKind::Client { tariff_id, .. }) = client.kind() else {
        return Ok(None);
    };
    tariff_db::get_tariff_by_id(db, tariff_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_task_rides_in_the_state_label() {
        let state = encode_awaiting_creds("mail server is down");
        assert_eq!(decode_awaiting_creds(&state), Some("mail server is down"));
    }

    #[test]
    fn other_states_do_not_decode_as_pending_task() {
        assert_eq!(decode_awaiting_creds(MENU), None);
        assert_eq!(decode_awaiting_creds(AWAITING_TASK), None);
        assert_eq!(decode_awaiting_creds(crate::bot::START), None);
    }
}
