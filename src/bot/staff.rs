use sea_orm::{DatabaseConnection, DbErr};

use crate::bot::{START, send_or_log};
use crate::db::orders as order_db;
use crate::gateway::MessagingGateway;
use crate::models::orders::Status;
use crate::models::parties::{self, Role};

/// Managers and owners have no interactive flow: managers receive escalation
/// alerts from the sweeps, owners get a live order census on any message.
pub async fn handle<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    staff: &parties::Model,
    chat_id: i64,
) -> Result<String, DbErr> {
    let message = match staff.role {
        Role::Owner => {
            let open = order_db::count_by_status(db, Status::Created).await?;
            let in_work = order_db::count_by_status(db, Status::InWork).await?;
            format!(
                "Current load:\nwaiting for a contractor: {open}\nin work: {in_work}"
            )
        }
        _ => "You will receive escalation alerts in this chat.".to_string(),
    };
    send_or_log(gateway, chat_id, &message).await;
    Ok(START.to_string())
}
