//! REST client for the process engine.
//!
//! `EngineApi` is the seam both the process trigger and the task worker talk
//! through; `RestEngineClient` is the reqwest implementation used at runtime.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::{EngineError, EngineResult};
use super::types::{CompleteTask, EngineErrorBody, ExternalTask, FetchAndLock, StartProcess};

/// Calls into the process engine used by this service.
#[async_trait]
pub trait EngineApi: Send + Sync {
    /// Start an instance of the process definition registered under `key`.
    ///
    /// Returns the engine's instance descriptor untouched.
    async fn start_process(&self, key: &str, body: &StartProcess) -> EngineResult<Value>;

    /// Claim up to `body.max_tasks` tasks of the subscribed topics.
    async fn fetch_and_lock(&self, body: &FetchAndLock) -> EngineResult<Vec<ExternalTask>>;

    /// Complete a task previously locked by this worker.
    async fn complete_task(&self, task_id: &str, body: &CompleteTask) -> EngineResult<()>;
}

// ---------------------------------------------------------------------------
// RestEngineClient
// ---------------------------------------------------------------------------

/// reqwest-backed engine client.
#[derive(Debug, Clone)]
pub struct RestEngineClient {
    client: Client,
    base_url: Url,
}

impl RestEngineClient {
    /// Build a client for the engine REST root at `base_url`
    /// (e.g. `http://localhost:8080/engine-rest`).
    pub fn new(base_url: &str, timeout: Duration) -> EngineResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so opaque task ids cannot escape their path position.
    fn endpoint(&self, segments: &[&str]) -> EngineResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EngineError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> EngineResult<Vec<u8>> {
        debug!(url = %url, "POST to engine");
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(EngineError::Status {
                status,
                message: error_message(&bytes),
            });
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl EngineApi for RestEngineClient {
    async fn start_process(&self, key: &str, body: &StartProcess) -> EngineResult<Value> {
        let url = self.endpoint(&["process-definition", "key", key, "start"])?;
        let bytes = self.post_json(url, body).await?;
        decode(&bytes)
    }

    async fn fetch_and_lock(&self, body: &FetchAndLock) -> EngineResult<Vec<ExternalTask>> {
        let url = self.endpoint(&["external-task", "fetchAndLock"])?;
        let bytes = self.post_json(url, body).await?;
        decode(&bytes)
    }

    async fn complete_task(&self, task_id: &str, body: &CompleteTask) -> EngineResult<()> {
        let url = self.endpoint(&["external-task", task_id, "complete"])?;
        self.post_json(url, body).await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> EngineResult<T> {
    serde_json::from_slice(bytes).map_err(|e| EngineError::Decode(e.to_string()))
}

/// Pull a readable message out of an engine error body, falling back to the
/// raw text.
fn error_message(bytes: &[u8]) -> String {
    match serde_json::from_slice::<EngineErrorBody>(bytes) {
        Ok(EngineErrorBody {
            kind,
            message: Some(message),
        }) => match kind {
            Some(kind) => format!("{kind}: {message}"),
            None => message,
        },
        _ => String::from_utf8_lossy(bytes).trim().to_string(),
    }
}
