//! Gandi LiveDNS record client.

use crate::error::{DdnsError, Result};
use crate::http::{ApiCallResult, ApiRequest, HttpCaller};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a create call that the API accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateOutcome {
    Created,
    AlreadyPresent,
}

/// Reads, creates and deletes single-value rrsets.
pub struct GandiClient {
    caller: Arc<dyn HttpCaller>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    #[serde(default)]
    rrset_values: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    rrset_ttl: u32,
    rrset_values: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct GandiError {
    message: Option<String>,
}

impl GandiClient {
    pub fn new(caller: Arc<dyn HttpCaller>) -> Self {
        Self { caller }
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiCallResult> {
        self.caller.call(request).await.map_err(DdnsError::into_api)
    }

    /// Current value of the record at `url`, or `None` if it does not exist.
    pub async fn fetch_record(&self, url: &str, token: &str) -> Result<Option<String>> {
        let result = self
            .send(ApiRequest::get(url).bearer(token))
            .await
            .map_err(|e| {
                tracing::error!("Failed to get record. {}", e);
                e
            })?;

        match result.status {
            404 => {
                tracing::debug!("No existing record found");
                Ok(None)
            }
            200 => {
                let record: RecordResponse = serde_json::from_str(&result.body).map_err(|e| {
                    DdnsError::MalformedRecord(format!("{}: {}", e, result.body))
                })?;
                let value = record.rrset_values.into_iter().next().ok_or_else(|| {
                    DdnsError::MalformedRecord("rrset_values is empty".to_string())
                })?;
                tracing::debug!("Existing record found with value {}", value);
                Ok(Some(value))
            }
            _ => {
                let err = provider_error(&result);
                tracing::error!("Failed to get record. {}", err);
                Err(err)
            }
        }
    }

    /// Create the record at `url` holding `ip`.
    pub async fn create_record(
        &self,
        url: &str,
        ip: &str,
        ttl: u32,
        token: &str,
    ) -> Result<CreateOutcome> {
        let body = serde_json::to_string(&CreateRequest {
            rrset_ttl: ttl,
            rrset_values: [ip],
        })?;

        let request = ApiRequest::post(url)
            .bearer(token)
            .header("Content-Type", "application/json")
            .body(body);

        let result = self
            .send(request)
            .await
            .map_err(|e| {
                tracing::error!("Failed to add new record. {}", e);
                e
            })?;

        match result.status {
            201 => {
                tracing::info!("Added record with IP {}", ip);
                Ok(CreateOutcome::Created)
            }
            200 => {
                tracing::warn!("Record already present with IP {}", ip);
                Ok(CreateOutcome::AlreadyPresent)
            }
            _ => {
                let err = provider_error(&result);
                tracing::error!("Failed to add new record. {}", err);
                Err(err)
            }
        }
    }

    /// Delete the record at `url`.
    pub async fn delete_record(&self, url: &str, token: &str) -> Result<()> {
        let result = self
            .send(ApiRequest::delete(url).bearer(token))
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete existing record. {}", e);
                e
            })?;

        if result.status == 204 {
            tracing::info!("Deleted existing record");
            return Ok(());
        }

        let err = provider_error(&result);
        tracing::error!("Failed to delete existing record. {}", err);
        Err(err)
    }
}

/// Map an unexpected response to an error, keeping the API's own message
/// when the body carries one.
fn provider_error(result: &ApiCallResult) -> DdnsError {
    match serde_json::from_str::<GandiError>(&result.body) {
        Ok(GandiError {
            message: Some(message),
        }) => DdnsError::Api {
            status: Some(result.status),
            message,
        },
        _ => DdnsError::UnexpectedResponse {
            status: result.status,
            body: result.body.clone(),
        },
    }
}
