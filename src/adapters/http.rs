use crate::config::toml_config::{BackendConfig, VerificationConfig};
use crate::domain::ports::VerificationSource;
use crate::utils::error::{ProgressError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Reads a boolean column from a PostgREST-style table endpoint.
#[derive(Debug, Clone)]
pub struct RemoteVerifier {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    table: String,
    id_column: String,
    field: String,
}

impl RemoteVerifier {
    pub fn new(backend: &BackendConfig, verification: &VerificationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(backend.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: backend.url.trim_end_matches('/').to_string(),
            api_key: backend.api_key.clone().filter(|k| !k.is_empty()),
            table: verification.table.clone(),
            id_column: verification.id_column.clone(),
            field: verification.field.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl VerificationSource for RemoteVerifier {
    async fn is_verified(&self, subject: &str) -> Result<bool> {
        let url = self.endpoint();
        let filter = format!("eq.{}", subject);

        let mut request = self
            .client
            .get(&url)
            .query(&[(self.id_column.as_str(), filter.as_str()), ("select", self.field.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        tracing::debug!("Verification lookup: GET {} ({}={})", url, self.id_column, subject);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProgressError::RemoteStatus {
                status: status.as_u16(),
                url,
            });
        }

        let rows: Vec<serde_json::Value> = response.json().await?;
        let row = rows.first().ok_or_else(|| ProgressError::SubjectNotFound {
            subject: subject.to_string(),
        })?;

        // null 或缺欄位都視為未驗證
        Ok(row.get(&self.field).and_then(|v| v.as_bool()).unwrap_or(false))
    }
}
