use serde_json::json;
use std::future::Future;
use thiserror::Error;

/// A send that did not reach the gateway or was refused by it.
///
/// Delivery is fire-and-forget: callers log a transport error and move on,
/// they never retry and never let one failed recipient block the rest of a
/// fan-out batch.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("gateway returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Outbound half of the external chat transport: deliver one text message to
/// one chat id. The engine is generic over this seam; tests and alternative
/// transports plug in here.
pub trait MessagingGateway: Send + Sync {
    fn send(
        &self,
        chat_id: i64,
        text: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Production gateway: POSTs to the messaging service's `/send` endpoint with
/// a bearer token.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Build from `GATEWAY_URL` and `GATEWAY_TOKEN` env vars.
    pub fn from_env() -> Self {
        let base_url = std::env::var("GATEWAY_URL").expect("GATEWAY_URL must be set");
        let token = std::env::var("GATEWAY_TOKEN").expect("GATEWAY_TOKEN must be set");
        Self::new(&base_url, &token)
    }
}

impl MessagingGateway for HttpGateway {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }
        Ok(())
    }
}
