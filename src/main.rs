use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use helpdesk_backend::config::SettingsCache;
use helpdesk_backend::engine::sweep;
use helpdesk_backend::gateway::HttpGateway;
use helpdesk_backend::{create_pool, handlers};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let db = create_pool().await;

    // Fail at boot, not on the first request, if the tokens are missing.
    std::env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN must be set");
    std::env::var("WEBHOOK_TOKEN").expect("WEBHOOK_TOKEN must be set");

    let gateway = HttpGateway::from_env();
    let settings = SettingsCache::new(db.clone());

    // The SLA sweeps run beside the HTTP server for the life of the process.
    sweep::spawn_sweeps(db.clone(), gateway.clone(), settings.clone());
    tracing::info!("SLA sweeps scheduled");

    let db_data = web::Data::new(db);
    let gateway_data = web::Data::new(gateway);
    let settings_data = web::Data::new(settings);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_addr = format!("0.0.0.0:{port}");
    tracing::info!("Server running at http://{bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(db_data.clone())
            .app_data(gateway_data.clone())
            .app_data(settings_data.clone())
            .service(web::scope("/api").configure(handlers::init_routes))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
