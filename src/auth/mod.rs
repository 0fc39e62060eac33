use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web_httpauth::extractors::bearer::BearerAuth;

/// Admin API guard: the request must carry `Authorization: Bearer` with the
/// token from the `ADMIN_TOKEN` env var.
pub fn require_admin(auth: &BearerAuth) -> Result<(), actix_web::Error> {
    require_token(auth, "ADMIN_TOKEN")
}

/// Webhook guard: the messaging gateway signs its posts with the shared
/// `WEBHOOK_TOKEN`.
pub fn require_gateway(auth: &BearerAuth) -> Result<(), actix_web::Error> {
    require_token(auth, "WEBHOOK_TOKEN")
}

fn require_token(auth: &BearerAuth, env_var: &str) -> Result<(), actix_web::Error> {
    let expected = std::env::var(env_var)
        .map_err(|_| ErrorInternalServerError(format!("{env_var} is not configured")))?;
    if auth.token() == expected {
        Ok(())
    } else {
        Err(ErrorUnauthorized("Invalid bearer token"))
    }
}
