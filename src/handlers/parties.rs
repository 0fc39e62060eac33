use actix_web::{HttpResponse, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth;
use crate::db::{parties as party_db, tariffs as tariff_db};
use crate::engine::lifecycle;
use crate::models::parties::{CreateParty, Role, is_valid_nick};

#[derive(Debug, Clone, Deserialize)]
pub struct PartyListQuery {
    pub role: Option<Role>,
}

/// POST /api/parties — register a bot user.
///
/// Clients must come with an existing tariff; the other roles must not carry
/// one. The chat id stays empty until the party first writes to the bot.
pub async fn create_party(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateParty>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    let input = body.into_inner();
    if !is_valid_nick(&input.nick) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "nick must be 5-32 word characters",
        })));
    }

    match (input.role, input.tariff_id) {
        (Role::Client, None) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "a client needs a tariff_id",
            })));
        }
        (Role::Client, Some(tariff_id)) => {
            match tariff_db::get_tariff_by_id(db.get_ref(), tariff_id).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                        "error": format!("Tariff {tariff_id} not found"),
                    })));
                }
                Err(e) => {
                    return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                        "error": format!("Database error: {e}"),
                    })));
                }
            }
        }
        (_, Some(_)) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "only clients carry a tariff",
            })));
        }
        (_, None) => {}
    }

    match party_db::insert_party(db.get_ref(), input).await {
        Ok(party) => Ok(HttpResponse::Created().json(party)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to create party: {e}"),
        }))),
    }
}

/// GET /api/parties — list bot users, optionally filtered by role.
pub async fn get_parties(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
    query: web::Query<PartyListQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    match party_db::get_parties(db.get_ref(), query.role).await {
        Ok(parties) => Ok(HttpResponse::Ok().json(parties)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}

/// GET /api/parties/{id} — fetch a single bot user.
pub async fn get_party(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    let party_id = path.into_inner();
    match party_db::get_party_by_id(db.get_ref(), party_id).await {
        Ok(Some(party)) => Ok(HttpResponse::Ok().json(party)),
        Ok(None) => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Party {party_id} not found"),
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}

/// DELETE /api/parties/{id} — deactivate a bot user.
///
/// A contractor's in-work orders are returned to the open pool in the same
/// step, so nothing stays assigned to someone who left.
pub async fn deactivate_party(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    let party_id = path.into_inner();
    let party = match party_db::get_party_by_id(db.get_ref(), party_id).await {
        Ok(Some(party)) => party,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("Party {party_id} not found"),
            })));
        }
        Err(e) => {
            return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            })));
        }
    };

    if party.role == Role::Contractor {
        return match lifecycle::release_contractor(db.get_ref(), &party).await {
            Ok(freed) => Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": format!("Contractor {} deactivated, {freed} orders freed", party.nick),
            }))),
            Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to deactivate contractor: {e}"),
            }))),
        };
    }

    match party_db::deactivate_party(db.get_ref(), party_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": format!("Party {} deactivated", party.nick),
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}
