use sea_orm::{DatabaseConnection, DbErr};

use crate::bot::send_or_log;
use crate::db::{orders as order_db, parties as party_db};
use crate::engine::EngineError;
use crate::engine::lifecycle;
use crate::gateway::MessagingGateway;
use crate::models::{orders, parties};

pub const MENU: &str = "CONTRACTOR_MENU";
pub const CHOOSING_ORDER: &str = "CHOOSING_ORDER";
pub const AWAITING_ESTIMATE: &str = "AWAITING_ESTIMATE";

const BACK: &str = "back";

const MENU_TEXT: &str = "Hello! What would you like to do?\n\
    1. List open orders\n\
    2. My current order\n\
    3. Record a completion estimate\n\
    4. Close my order\n\n\
    Reply with a number.";

/// Parse a 1-based pick from a numbered listing of `count` entries.
pub(crate) fn parse_order_choice(text: &str, count: usize) -> Option<usize> {
    let number: usize = text.trim().parse().ok()?;
    (1..=count).contains(&number).then(|| number - 1)
}

/// Contractor conversation flow. Returns the next state label.
pub async fn handle<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    contractor: &parties::Model,
    chat_id: i64,
    state: &str,
    text: &str,
) -> Result<String, DbErr> {
    match state {
        MENU => menu_choice(db, gateway, contractor, chat_id, text).await,
        CHOOSING_ORDER => choose_order(db, gateway, contractor, chat_id, text).await,
        AWAITING_ESTIMATE => record_estimate(db, gateway, contractor, chat_id, text).await,
        _ => {
            send_or_log(gateway, chat_id, MENU_TEXT).await;
            Ok(MENU.to_string())
        }
    }
}

async fn menu_choice<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    contractor: &parties::Model,
    chat_id: i64,
    text: &str,
) -> Result<String, DbErr> {
    match text {
        "1" => {
            let open = order_db::available_orders(db).await?;
            if open.is_empty() {
                send_or_log(gateway, chat_id, "No open orders right now.").await;
                send_or_log(gateway, chat_id, MENU_TEXT).await;
                return Ok(MENU.to_string());
            }
            send_or_log(gateway, chat_id, &order_listing(&open)).await;
            Ok(CHOOSING_ORDER.to_string())
        }
        "2" => {
            let message = match current_order(db, contractor).await? {
                Some(order) => {
                    let estimate = order
                        .estimated_hours
                        .map(|hours| format!("\nYour estimate: {hours} h"))
                        .unwrap_or_default();
                    format!("Your current order:\n{}{estimate}", order.task)
                }
                None => "You hold no order right now.".to_string(),
            };
            send_or_log(gateway, chat_id, &message).await;
            send_or_log(gateway, chat_id, MENU_TEXT).await;
            Ok(MENU.to_string())
        }
        "3" => {
            if current_order(db, contractor).await?.is_none() {
                send_or_log(gateway, chat_id, "You hold no order right now.").await;
                send_or_log(gateway, chat_id, MENU_TEXT).await;
                return Ok(MENU.to_string());
            }
            send_or_log(gateway, chat_id, "How many hours will it take? (1-24)").await;
            Ok(AWAITING_ESTIMATE.to_string())
        }
        "4" => {
            let message = match current_order(db, contractor).await? {
                Some(order) => match lifecycle::close_work(db, order.id).await {
                    Ok(_) => "The order is closed. Thank you!".to_string(),
                    Err(EngineError::Db(e)) => return Err(e),
                    Err(_) => "The order can no longer be closed.".to_string(),
                },
                None => "You hold no order right now.".to_string(),
            };
            send_or_log(gateway, chat_id, &message).await;
            send_or_log(gateway, chat_id, MENU_TEXT).await;
            Ok(MENU.to_string())
        }
        _ => {
            send_or_log(gateway, chat_id, "I didn't get that, pick one of the numbers.").await;
            send_or_log(gateway, chat_id, MENU_TEXT).await;
            Ok(MENU.to_string())
        }
    }
}

async fn choose_order<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    contractor: &parties::Model,
    chat_id: i64,
    text: &str,
) -> Result<String, DbErr> {
    if text.eq_ignore_ascii_case(BACK) {
        send_or_log(gateway, chat_id, MENU_TEXT).await;
        return Ok(MENU.to_string());
    }

    // Re-query so the pick maps onto the same listing order the contractor
    // saw; the conditional take sorts out anything that changed in between.
    let open = order_db::available_orders(db).await?;
    let Some(index) = parse_order_choice(text, open.len()) else {
        send_or_log(
            gateway,
            chat_id,
            "Pick one of the listed numbers, or reply \"back\".",
        )
        .await;
        return Ok(CHOOSING_ORDER.to_string());
    };

    match lifecycle::take_in_work(db, open[index].id, contractor).await {
        Ok(order) => {
            let client_nick = party_db::get_party_by_id(db, order.client_id)
                .await?
                .map(|client| client.nick)
                .unwrap_or_else(|| "unknown".to_string());
            let creds = order.creds.as_deref().unwrap_or("(none)");
            send_or_log(
                gateway,
                chat_id,
                &format!(
                    "The order is yours.\n\nTask:\n{}\n\nClient: @{client_nick}\nAccess:\n{creds}",
                    order.task
                ),
            )
            .await;
            send_or_log(gateway, chat_id, MENU_TEXT).await;
            Ok(MENU.to_string())
        }
        Err(EngineError::Db(e)) => Err(e),
        Err(_) => {
            // Raced with another contractor; the order is no longer free.
            send_or_log(gateway, chat_id, "That order was just taken, pick another.").await;
            let open = order_db::available_orders(db).await?;
            if open.is_empty() {
                send_or_log(gateway, chat_id, MENU_TEXT).await;
                return Ok(MENU.to_string());
            }
            send_or_log(gateway, chat_id, &order_listing(&open)).await;
            Ok(CHOOSING_ORDER.to_string())
        }
    }
}

async fn record_estimate<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    contractor: &parties::Model,
    chat_id: i64,
    text: &str,
) -> Result<String, DbErr> {
    if text.eq_ignore_ascii_case(BACK) {
        send_or_log(gateway, chat_id, MENU_TEXT).await;
        return Ok(MENU.to_string());
    }
    let Ok(hours) = text.trim().parse::<i32>() else {
        send_or_log(gateway, chat_id, "Send a number of hours between 1 and 24.").await;
        return Ok(AWAITING_ESTIMATE.to_string());
    };

    let Some(order) = current_order(db, contractor).await? else {
        send_or_log(gateway, chat_id, "You hold no order right now.").await;
        send_or_log(gateway, chat_id, MENU_TEXT).await;
        return Ok(MENU.to_string());
    };
    match lifecycle::set_estimate(db, order.id, contractor, hours).await {
        Ok(()) => {
            send_or_log(gateway, chat_id, "Estimate recorded.").await;
            send_or_log(gateway, chat_id, MENU_TEXT).await;
            Ok(MENU.to_string())
        }
        Err(EngineError::EstimateOutOfRange) => {
            send_or_log(gateway, chat_id, "Send a number of hours between 1 and 24.").await;
            Ok(AWAITING_ESTIMATE.to_string())
        }
        Err(EngineError::Db(e)) => Err(e),
        Err(_) => {
            send_or_log(gateway, chat_id, "The order is no longer in work.").await;
            send_or_log(gateway, chat_id, MENU_TEXT).await;
            Ok(MENU.to_string())
        }
    }
}

fn order_listing(open: &[orders::Model]) -> String {
    let mut listing = String::from("Open orders:\n");
    for (position, order) in open.iter().enumerate() {
        listing.push_str(&format!("\n{}. {}\n", position + 1, order.task));
    }
    listing.push_str("\nReply with the order number to take it, or \"back\".");
    listing
}

async fn current_order(
    db: &DatabaseConnection,
    contractor: &parties::Model,
) -> Result<Option<orders::Model>, DbErr> {
    let mut in_work = order_db::contractor_orders_in_work(db, contractor.id).await?;
    Ok(in_work.pop())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_parses_within_listing_bounds() {
        assert_eq!(parse_order_choice("1", 3), Some(0));
        assert_eq!(parse_order_choice(" 3 ", 3), Some(2));
        assert_eq!(parse_order_choice("4", 3), None);
        assert_eq!(parse_order_choice("0", 3), None);
    }

    #[test]
    fn choice_rejects_garbage() {
        assert_eq!(parse_order_choice("first", 3), None);
        assert_eq!(parse_order_choice("", 3), None);
        assert_eq!(parse_order_choice("-1", 3), None);
        assert_eq!(parse_order_choice("1", 0), None);
    }
}
