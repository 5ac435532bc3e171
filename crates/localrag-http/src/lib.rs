//! JSON-over-HTTP plumbing shared by the Ollama embedding and completion clients.

use std::time::Duration;

use localrag_core::BackendError;
use reqwest::Client;
use serde_json::Value;

/// Backends live on the local machine, so system proxies are bypassed.
pub fn build_client() -> Result<Client, BackendError> {
    Client::builder()
        .no_proxy()
        .build()
        .map_err(|e| BackendError::Unreachable(format!("failed to build HTTP client: {e}")))
}

/// Map a transport failure onto the backend error taxonomy.
pub fn classify(err: &reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(timeout)
    } else if err.is_decode() {
        BackendError::Malformed(err.to_string())
    } else if let Some(status) = err.status() {
        BackendError::Status { status: status.as_u16(), body: err.to_string() }
    } else {
        BackendError::Unreachable(err.to_string())
    }
}

/// POST `body` to `url` and decode the JSON reply; non-2xx statuses become `Status`.
pub async fn post_json(client: &Client, url: &str, body: &Value, timeout: Duration) -> Result<Value, BackendError> {
    let resp = client
        .post(url)
        .timeout(timeout)
        .json(body)
        .send()
        .await
        .map_err(|e| classify(&e, timeout))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(BackendError::Status { status: status.as_u16(), body });
    }
    resp.json::<Value>().await.map_err(|e| classify(&e, timeout))
}

pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
