//! HTTP implementation of [`RemoteSyncClient`].
//!
//! Talks JSON to a `stash-server` (or anything speaking the same contract):
//!
//! | Call                   | Request                     |
//! |------------------------|-----------------------------|
//! | `check_availability`   | `GET /health`               |
//! | `fetch_all`            | `GET /v1/records`           |
//! | `push_all`             | `PUT /v1/records`           |
//! | `delete_by_id`         | `DELETE /v1/records/{id}`   |
//! | `fetch_search_history` | `GET /v1/search-history`    |
//! | `push_search_history`  | `PUT /v1/search-history`    |

use crate::{error::Result, Error, RecordCollection, RemoteConfig, RemoteSyncClient};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of `GET /v1/records` and `PUT /v1/records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsBody {
    pub records: RecordCollection,
}

/// Body of `GET /v1/search-history` and `PUT /v1/search-history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryBody {
    pub entries: Vec<String>,
}

/// Error body returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Remote store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl HttpRemote {
    /// Creates a client for the configured server.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::remote_fatal(format!("could not build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let builder = self.client.request(method, url);
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(transport_error)?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    Err(status_error(status, message))
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_connect() {
        tracing::debug!(error = %err, "Remote store unreachable");
        Error::RemoteUnavailable
    } else if err.is_timeout() {
        Error::remote("request timed out")
    } else if err.is_decode() {
        Error::remote_fatal(format!("invalid response: {err}"))
    } else {
        Error::remote(err.to_string())
    }
}

fn status_error(status: StatusCode, message: String) -> Error {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        Error::remote(format!("{status}: {message}"))
    } else {
        Error::remote_fatal(format!("{status}: {message}"))
    }
}

#[async_trait]
impl RemoteSyncClient for HttpRemote {
    async fn check_availability(&self) -> bool {
        let response = match self.send(self.request(Method::GET, "/health")).await {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(url = %self.config.base_url, error = %e, "Remote store not available");
                return false;
            }
        };

        match response.json::<HealthResponse>().await {
            Ok(health) => health.status == "ok",
            Err(e) => {
                tracing::warn!(error = %e, "Unexpected health response");
                false
            }
        }
    }

    async fn fetch_all(&self) -> Result<RecordCollection> {
        let response = self.send(self.request(Method::GET, "/v1/records")).await?;
        let body: RecordsBody = response.json().await.map_err(transport_error)?;
        Ok(body.records)
    }

    async fn push_all(&self, records: RecordCollection) -> Result<()> {
        let body = RecordsBody { records };
        self.send(self.request(Method::PUT, "/v1/records").json(&body))
            .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let path = format!("/v1/records/{}", encode_segment(id));
        let response = self
            .request(Method::DELETE, &path)
            .send()
            .await
            .map_err(transport_error)?;

        // Already gone is what we wanted
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }

    async fn fetch_search_history(&self) -> Result<Vec<String>> {
        let response = self
            .send(self.request(Method::GET, "/v1/search-history"))
            .await?;
        let body: SearchHistoryBody = response.json().await.map_err(transport_error)?;
        Ok(body.entries)
    }

    async fn push_search_history(&self, entries: Vec<String>) -> Result<()> {
        let body = SearchHistoryBody { entries };
        self.send(self.request(Method::PUT, "/v1/search-history").json(&body))
            .await?;
        Ok(())
    }
}

/// Percent-encode a record id for use as one path segment.
fn encode_segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_plain_and_special_ids() {
        assert_eq!(encode_segment("card-1"), "card-1");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_segment("é"), "%C3%A9");
    }

    #[test]
    fn status_classification() {
        let err = status_error(StatusCode::BAD_GATEWAY, "upstream".into());
        assert!(err.is_retryable());

        let err = status_error(StatusCode::BAD_REQUEST, "bad".into());
        assert!(!err.is_retryable());
        assert!(err.is_user_visible());
        assert_eq!(
            err.to_string(),
            "remote operation failed: 400 Bad Request: bad"
        );
    }

    #[test]
    fn records_body_format() {
        let body = RecordsBody {
            records: RecordCollection::new(),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"records":[]}"#);
    }
}
