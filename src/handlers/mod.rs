pub mod orders;
pub mod parties;
pub mod settings;
pub mod tariffs;
pub mod webhook;

use actix_web::web;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // ── Webhook (protected by the gateway's WEBHOOK_TOKEN bearer) ──
    cfg.service(
        web::scope("/webhook").route("/event", web::post().to(webhook::receive_event)),
    );

    // ── Admin routes (all protected by the ADMIN_TOKEN bearer) ──
    cfg.service(
        web::scope("/tariffs")
            .route("", web::get().to(tariffs::get_tariffs))
            .route("", web::post().to(tariffs::create_tariff))
            .route("/{id}", web::get().to(tariffs::get_tariff)),
    );
    cfg.service(
        web::scope("/parties")
            .route("", web::get().to(parties::get_parties))
            .route("", web::post().to(parties::create_party))
            .route("/{id}", web::get().to(parties::get_party))
            .route("/{id}", web::delete().to(parties::deactivate_party)),
    );
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(orders::get_orders))
            .route("/{id}", web::get().to(orders::get_order)),
    );
    cfg.service(
        web::scope("/settings")
            .route("", web::get().to(settings::get_settings))
            .route("", web::put().to(settings::upsert_setting)),
    );
}
