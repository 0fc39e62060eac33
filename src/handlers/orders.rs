use actix_web::{HttpResponse, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth;
use crate::db::orders as order_db;
use crate::models::orders::OrderListQuery;

/// GET /api/orders — list orders newest first, optional `?status=` filter.
pub async fn get_orders(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
    query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    match order_db::get_orders(db.get_ref(), query.status).await {
        Ok(orders) => Ok(HttpResponse::Ok().json(orders)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}

/// GET /api/orders/{id} — fetch a single order.
pub async fn get_order(
    admin: BearerAuth,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, actix_web::Error> {
    auth::require_admin(&admin)?;

    let order_id = path.into_inner();
    match order_db::get_order_by_id(db.get_ref(), order_id).await {
        Ok(Some(order)) => Ok(HttpResponse::Ok().json(order)),
        Ok(None) => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Order {order_id} not found"),
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}
