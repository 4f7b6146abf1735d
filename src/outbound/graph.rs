//! Graph API sender — posts outbound texts to the Meta `me/messages` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::error::ChannelError;
use crate::outbound::{MessageSender, SendReceipt};

/// Graph API version in the send URL.
const GRAPH_API_VERSION: &str = "v17.0";

/// Request timeout for sends, so a slow platform cannot stall the
/// sender's critical section.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends messages through the Graph API with a page access token.
pub struct GraphSender {
    access_token: SecretString,
    client: reqwest::Client,
}

impl GraphSender {
    pub fn new(access_token: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            access_token,
            client,
        }
    }

    fn api_url(&self) -> String {
        format!(
            "https://graph.facebook.com/{GRAPH_API_VERSION}/me/messages?access_token={}",
            self.access_token.expose_secret()
        )
    }
}

#[async_trait]
impl MessageSender for GraphSender {
    async fn send(&self, recipient_id: &str, text: &str) -> Result<SendReceipt, ChannelError> {
        let body = serde_json::json!({
            "recipient": {"id": recipient_id},
            "message": {"text": text}
        });

        let resp = self
            .client
            .post(self.api_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "graph".into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(status = status.as_u16(), "Graph send returned non-success");
        }

        Ok(SendReceipt {
            status: status.as_u16(),
            body,
        })
    }
}
