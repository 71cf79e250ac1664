use serde_json::Value;
use url::Url;

use crate::error::ApiError;
use crate::model::TriggerRequest;

/// REST client for the trigger endpoints.
///
/// Requests go out once: no retry, no client-side timeout.
#[derive(Debug, Clone)]
pub struct TriggerClient {
    client: reqwest::Client,
    base_url: String,
}

impl TriggerClient {
    #[must_use]
    pub fn new(server_url: &Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: server_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn triggers_url(&self) -> String {
        format!("{}/triggers", self.base_url)
    }

    /// `POST /triggers`. Returns the server's JSON reply, or `Null` when the
    /// body is empty or not JSON.
    pub async fn create_trigger(&self, request: &TriggerRequest) -> Result<Value, ApiError> {
        let url = self.triggers_url();
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Request {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Request {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(%url, status = status.as_u16(), "trigger created");
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}
