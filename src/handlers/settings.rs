use actix_web::{HttpResponse, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use sea_orm::DatabaseConnection;

use crate::auth;
use crate::db::settings as settings_db;
use crate::models::settings::UpsertSetting;

/// GET /api/settings — list the override table.
pub async fn get_settings(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    match settings_db::get_all_settings(db.get_ref()).await {
        Ok(settings) => Ok(HttpResponse::Ok().json(settings)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}

/// PUT /api/settings — create or overwrite one parameter. The engine picks
/// the change up within the snapshot TTL.
pub async fn upsert_setting(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
    body: web::Json<UpsertSetting>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    match settings_db::upsert_setting(db.get_ref(), body.into_inner()).await {
        Ok(setting) => Ok(HttpResponse::Ok().json(setting)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to save setting: {e}"),
        }))),
    }
}
