//! Google Sheets sink — appends lead rows over the Sheets v4 API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::info;

use crate::config::SheetsConfig;
use crate::error::SinkError;
use crate::sink::{Lead, LeadSink};

/// Request timeout for the append call, so a slow sheet cannot stall the
/// sender's critical section.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Appends rows to one tab of one spreadsheet.
pub struct SheetsSink {
    config: SheetsConfig,
    client: reqwest::Client,
}

impl SheetsSink {
    pub fn new(config: SheetsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn append_url(&self) -> String {
        format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED",
            self.config.spreadsheet_id, self.config.tab
        )
    }
}

#[async_trait]
impl LeadSink for SheetsSink {
    async fn append(&self, lead: &Lead) -> Result<(), SinkError> {
        let body = serde_json::json!({ "values": [lead.as_row()] });

        let resp = self
            .client
            .post(self.append_url())
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| SinkError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::Rejected { status, body });
        }

        info!(sender_id = %lead.sender_id, "Lead appended to sheet");
        Ok(())
    }
}
