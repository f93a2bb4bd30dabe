//! HTTP delivery to the sighting collaborator.

use std::time::Duration;

use reqwest::Client;

use crate::domain::LobbyEvent;
use crate::error::{Error, Result};
use crate::ports::EventDeliveryPort;

/// Delivers events as plain HTTP GET requests.
///
/// - `PlayerSighted` -> `GET {base}/seen?name=..&deviceId=..&userId=..`
/// - `LobbyReset` -> `GET {base}/resetLobby`
pub struct HttpDelivery {
    client: Client,
    base_url: String,
}

impl HttpDelivery {
    /// Create a delivery for the collaborator at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL path and query parameters for an event.
    pub fn request_for(&self, event: &LobbyEvent) -> (String, Vec<(&'static str, String)>) {
        match event {
            LobbyEvent::PlayerSighted {
                name,
                device_id,
                user_id,
            } => (
                format!("{}/seen", self.base_url),
                vec![
                    ("name", name.clone()),
                    ("deviceId", device_id.clone()),
                    ("userId", user_id.clone()),
                ],
            ),
            LobbyEvent::LobbyReset => (format!("{}/resetLobby", self.base_url), Vec::new()),
        }
    }
}

impl EventDeliveryPort for HttpDelivery {
    async fn deliver(&self, event: LobbyEvent) -> Result<()> {
        let (url, query) = self.request_for(&event);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Delivery(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        Ok(())
    }
}
