use std::time::Duration;

use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ClientConfig;
use crate::error::ClientError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared HTTP core: base URL, credentials, connection pool.
#[derive(Debug)]
pub struct Transport {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl Transport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            http,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        self.execute(self.http.get(self.url(path)).query(query)).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(self.http.delete(self.url(path))).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%status, url = %response.url(), "api response");
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|err| ClientError::Decode(err.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::from_status(status, extract_detail(&body)))
        }
    }
}

// Open WebUI error bodies are `{"detail": "..."}`; fall back to the raw text.
fn extract_detail(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(|detail| detail.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| raw.to_string())
}
