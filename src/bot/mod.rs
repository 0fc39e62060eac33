pub mod client;
pub mod contractor;
pub mod staff;

use sea_orm::{DatabaseConnection, DbErr};
use serde::Deserialize;
use tracing::warn;

use crate::config::SettingsCache;
use crate::db;
use crate::gateway::MessagingGateway;
use crate::models::parties::Role;

/// Normalized inbound chat event as the messaging gateway posts it. Button
/// presses arrive as their callback text, so `text` is the only payload.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub nick: String,
    pub text: String,
}

/// Initial conversation state; also what an unset `bot_state` means.
pub const START: &str = "START";

const UNKNOWN_PARTY_NOTICE: &str =
    "I don't know you yet. Ask the support team to register your nickname first.";

/// Conversation state machine entry point.
///
/// Resolves the acting party (repairing nickname / chat-id drift on the way),
/// routes the event through the party's role table keyed by the persisted
/// `bot_state` label, and stores the label the handler returns. `/start`
/// always restarts the conversation.
pub async fn handle_event<G: MessagingGateway>(
    db: &DatabaseConnection,
    gateway: &G,
    settings: &SettingsCache,
    event: InboundEvent,
) -> Result<(), DbErr> {
    let Some(party) = db::parties::resolve_party(db, event.chat_id, &event.nick).await? else {
        send_or_log(gateway, event.chat_id, UNKNOWN_PARTY_NOTICE).await;
        return Ok(());
    };

    let state = if event.text.trim() == "/start" {
        START.to_string()
    } else {
        party.bot_state.clone().unwrap_or_else(|| START.to_string())
    };

    let chat_id = event.chat_id;
    let next_state = match party.role {
        Role::Client => {
            client::handle(db, gateway, settings, &party, chat_id, &state, event.text.trim())
                .await?
        }
        Role::Contractor => {
            contractor::handle(db, gateway, &party, chat_id, &state, event.text.trim()).await?
        }
        Role::Manager | Role::Owner => staff::handle(db, gateway, &party, chat_id).await?,
    };

    db::parties::set_bot_state(db, party.id, Some(next_state)).await
}

/// Fire-and-forget send: a lost chat message is logged, never retried and
/// never fails the conversation turn.
pub(crate) async fn send_or_log<G: MessagingGateway>(gateway: &G, chat_id: i64, text: &str) {
    if let Err(e) = gateway.send(chat_id, text).await {
        warn!(chat_id, "could not deliver chat message: {e}");
    }
}
