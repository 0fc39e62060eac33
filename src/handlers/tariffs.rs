use actix_web::{HttpResponse, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth;
use crate::db::tariffs as tariff_db;
use crate::models::tariffs::CreateTariff;

/// POST /api/tariffs — register a new plan.
pub async fn create_tariff(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateTariff>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    let input = body.into_inner();
    if let Err(reason) = input.validate() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "error": reason })));
    }

    match tariff_db::insert_tariff(db.get_ref(), input).await {
        Ok(tariff) => Ok(HttpResponse::Created().json(tariff)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to create tariff: {e}"),
        }))),
    }
}

/// GET /api/tariffs — list all plans.
pub async fn get_tariffs(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    match tariff_db::get_all_tariffs(db.get_ref()).await {
        Ok(tariffs) => Ok(HttpResponse::Ok().json(tariffs)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}

/// GET /api/tariffs/{id} — fetch a single plan.
pub async fn get_tariff(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    let tariff_id = path.into_inner();
    match tariff_db::get_tariff_by_id(db.get_ref(), tariff_id).await {
        Ok(Some(tariff)) => Ok(HttpResponse::Ok().json(tariff)),
        Ok(None) => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Tariff {tariff_id} not found"),
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}
