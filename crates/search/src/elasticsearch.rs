//! Elasticsearch REST client.
//!
//! Talks to an Elastic Cloud deployment (addressed by Cloud ID) or any
//! Elasticsearch URL, authenticating with an API key.

use crate::backend::SearchBackend;
use crate::document::SearchResponse;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use hybrid_rag_core::logging::redact;
use hybrid_rag_core::{AppError, AppResult, SearchSettings};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Resolve an Elastic Cloud ID to the Elasticsearch base URL.
///
/// A Cloud ID has the form `name:base64(host$es_uuid$kibana_uuid)`. The
/// result is `https://{es_uuid}.{host}`, keeping an explicit port unless it
/// is 443.
pub fn cloud_id_to_url(cloud_id: &str) -> AppResult<String> {
    let encoded = cloud_id
        .split_once(':')
        .map(|(_, data)| data)
        .unwrap_or(cloud_id)
        .trim();

    if encoded.is_empty() {
        return Err(AppError::Config("Invalid Cloud ID: empty payload".to_string()));
    }

    let decoded = STANDARD
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded.trim_end_matches('=')))
        .map_err(|e| AppError::Config(format!("Invalid Cloud ID: {}", e)))?;

    let decoded = String::from_utf8(decoded)
        .map_err(|_| AppError::Config("Invalid Cloud ID: payload is not UTF-8".to_string()))?;

    let mut parts = decoded.split('$');
    let host = parts.next().unwrap_or_default().trim();
    let es_uuid = parts.next().unwrap_or_default().trim();

    if host.is_empty() || es_uuid.is_empty() {
        return Err(AppError::Config(
            "Invalid Cloud ID: expected host$es_uuid$kibana_uuid".to_string(),
        ));
    }

    let (host, port) = match host.rsplit_once(':') {
        Some((name, port)) => {
            let port: u16 = port
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid Cloud ID port: {}", port)))?;
            (name, Some(port))
        }
        None => (host, None),
    };

    Ok(match port {
        Some(port) if port != 443 => format!("https://{}.{}:{}", es_uuid, host, port),
        _ => format!("https://{}.{}", es_uuid, host),
    })
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// Elasticsearch client over the REST API.
pub struct ElasticsearchClient {
    /// Base URL without trailing slash
    base_url: String,

    /// Value of the `ApiKey` authorization scheme
    api_key: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl ElasticsearchClient {
    /// Build a client from settings without contacting the cluster.
    ///
    /// The Cloud ID takes precedence over the URL.
    ///
    /// # Errors
    /// Returns a configuration error when neither a Cloud ID nor a URL is
    /// set, when the Cloud ID is set without an API key, or when the Cloud
    /// ID cannot be decoded.
    pub fn new(settings: &SearchSettings) -> AppResult<Self> {
        let base_url = match (&settings.cloud_id, &settings.url) {
            (Some(cloud_id), _) => {
                if settings.api_key.is_none() {
                    return Err(AppError::Config(
                        "ES_API_KEY is required when ES_CLOUD_ID is set".to_string(),
                    ));
                }
                tracing::info!(
                    "Connecting to Elasticsearch using cloud_id: {}",
                    redact(cloud_id, 10)
                );
                cloud_id_to_url(cloud_id)?
            }
            (None, Some(url)) => {
                tracing::info!("Connecting to Elasticsearch at {}", url);
                url.trim_end_matches('/').to_string()
            }
            (None, None) => {
                return Err(AppError::Config(
                    "Either ES_CLOUD_ID or ES_URL must be configured".to_string(),
                ))
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            api_key: settings.api_key.clone(),
            client,
        })
    }

    /// Build a client and verify the cluster answers a ping.
    pub async fn connect(settings: &SearchSettings) -> AppResult<Self> {
        let client = Self::new(settings)?;

        tracing::info!("Checking Elasticsearch connection...");
        if !client.ping().await? {
            return Err(AppError::Connection(
                "Ping failed: could not reach Elasticsearch".to_string(),
            ));
        }

        tracing::info!("Connected to Elasticsearch");
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `true` when the cluster root answers with a success status.
    pub async fn ping(&self) -> AppResult<bool> {
        let response = self.send(Method::GET, "/", None, "ping").await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Ping returned status {}", status);
        }
        Ok(status.is_success())
    }

    pub async fn index_exists(&self, index: &str) -> AppResult<bool> {
        let response = self
            .send(Method::HEAD, &format!("/{}", index), None, "index exists")
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(status_error("index exists", status, String::new())),
        }
    }

    pub async fn get_mapping(&self, index: &str) -> AppResult<Value> {
        let path = format!("/{}/_mapping", index);
        self.request_json(Method::GET, &path, None, "get mapping")
            .await
    }

    /// Number of documents in `index`.
    pub async fn count(&self, index: &str) -> AppResult<u64> {
        let path = format!("/{}/_count", index);
        let value = self
            .request_json(Method::GET, &path, None, "count")
            .await?;
        let count: CountResponse = serde_json::from_value(value)?;
        Ok(count.count)
    }

    /// Names of all indices visible to the API key, sorted.
    pub async fn list_indices(&self) -> AppResult<Vec<String>> {
        let value = self
            .request_json(Method::GET, "/_alias", None, "list indices")
            .await?;

        let mut names: Vec<String> = value
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    /// Settings, mappings and aliases of `index`.
    pub async fn index_info(&self, index: &str) -> AppResult<Value> {
        let path = format!("/{}", index);
        self.request_json(Method::GET, &path, None, "index info")
            .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        operation: &str,
    ) -> AppResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);

        if let Some(ref api_key) = self.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", api_key));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| {
            AppError::Connection(format!("Elasticsearch {} failed: {}", operation, e))
        })
    }

    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        operation: &str,
    ) -> AppResult<Value> {
        let response = self.send(method, path, body, operation).await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(operation, status, error_text));
        }

        response.json().await.map_err(|e| {
            AppError::Search(format!(
                "Failed to parse Elasticsearch {} response: {}",
                operation, e
            ))
        })
    }
}

fn status_error(operation: &str, status: StatusCode, body: String) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Connection(format!(
            "Elasticsearch {} rejected: authentication failed ({})",
            operation, status
        )),
        _ => AppError::Search(format!(
            "Elasticsearch {} error ({}): {}",
            operation, status, body
        )),
    }
}

#[async_trait::async_trait]
impl SearchBackend for ElasticsearchClient {
    fn backend_name(&self) -> &str {
        "elasticsearch"
    }

    async fn search(&self, index: &str, body: &Value) -> AppResult<SearchResponse> {
        tracing::info!("Executing search on index {}", index);
        tracing::debug!(
            "Search request sent to Elasticsearch:\n{}",
            serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
        );

        let path = format!("/{}/_search", index);
        let value = self
            .request_json(Method::POST, &path, Some(body), "search")
            .await?;

        let response: SearchResponse = serde_json::from_value(value)?;
        tracing::info!("Found {} results", response.hits.hits.len());
        Ok(response)
    }
}
