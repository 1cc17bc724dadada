use serde::Deserialize;
use thiserror::Error;

use crate::Message;

/// Client for the outbound notification delivery provider.
///
/// Delivery is best-effort from the backend's point of view: callers log a
/// failed [`CourierClient::deliver`] and move on. Retry policy lives with the
/// provider, not here.
pub struct CourierClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Error, Debug)]
pub enum CourierError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Acknowledgement returned by the provider once a message is accepted for
/// delivery. Acceptance is not a delivery guarantee.
#[derive(Debug, Deserialize)]
pub struct DeliveryReceipt {
    pub id: String,
    pub accepted: bool,
}

impl CourierClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn deliver(&self, message: &Message) -> Result<DeliveryReceipt, CourierError> {
        let url = format!("{}/v1/messages", self.base_url);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| CourierError::ResponseError(e.to_string()))?;

        if resp.status() == 401 || resp.status() == 403 {
            return Err(CourierError::Unauthorized);
        }

        let receipt = resp.json::<DeliveryReceipt>().await.map_err(|e| {
            CourierError::ParsingError(format!("Failed to parse receipt as JSON: {}", e))
        })?;

        if !receipt.accepted {
            return Err(CourierError::Rejected(receipt.id));
        }

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = CourierClient::new("https://courier.example.com/", "key");
        assert_eq!(client.base_url, "https://courier.example.com");
    }
}
