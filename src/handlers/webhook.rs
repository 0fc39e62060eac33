use actix_web::{HttpResponse, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use sea_orm::DatabaseConnection;

use crate::auth;
use crate::bot::{self, InboundEvent};
use crate::config::SettingsCache;
use crate::gateway::HttpGateway;

/// POST /api/webhook/event — the messaging gateway pushes one normalized
/// chat event (text message or button press) per request.
///
/// The reply always goes out through the gateway's send endpoint, never in
/// this response body.
pub async fn receive_event(
    caller: BearerAuth,
    db: web::Data<DatabaseConnection>,
    gateway: web::Data<HttpGateway>,
    settings: web::Data<SettingsCache>,
    body: web::Json<InboundEvent>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_gateway(&caller)?;

    match bot::handle_event(
        db.get_ref(),
        gateway.get_ref(),
        settings.get_ref(),
        body.into_inner(),
    )
    .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}
