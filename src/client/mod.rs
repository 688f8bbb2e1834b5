// Holler — Broker client
//
// The caller side: a thin reqwest wrapper used by the CLI to create a
// request and poll it until a human answers. All waiting lives here, in
// the client; the broker itself never blocks on a human.

mod launcher;

use std::time::Duration;

use serde_json::Value;

use crate::error::HollerError;
use crate::server::protocol::AskPayload;
use crate::store::{Request, RequestStatus};

pub use launcher::{ensure_broker, is_broker_running};

/// Cadence of the status polling loop.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Per-call HTTP timeout. Distinct from the polling deadline.
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct BrokerClient {
    base_url: String,
    http: reqwest::Client,
}

impl BrokerClient {
    pub fn new(port: u16) -> Result<Self, HollerError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            base_url: format!("http://127.0.0.1:{port}"),
            http,
        })
    }

    /// Where the human answers; printed for the caller.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request on the broker and return its id.
    pub async fn create(&self, payload: &AskPayload) -> Result<String, HollerError> {
        let response = self
            .http
            .post(format!("{}/api/ask", self.base_url))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() {
            let message = body["error"]
                .as_str()
                .unwrap_or("unexpected broker response")
                .to_string();
            return Err(HollerError::Broker(message));
        }

        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| HollerError::Broker("broker response missing id".to_string()))
    }

    /// Fetch a request's full record. `None` when the broker does not know
    /// the id (or it has been evicted).
    pub async fn status(&self, id: &str) -> Result<Option<Request>, HollerError> {
        let response = self
            .http
            .get(format!("{}/api/status/{id}", self.base_url))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json().await?))
    }

    /// All requests currently pending on the broker.
    pub async fn pending(&self) -> Result<Vec<Request>, HollerError> {
        Ok(self
            .http
            .get(format!("{}/api/pending", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Poll until the request is answered or `timeout` elapses. Transient
    /// transport errors count the same as an unanswered poll; the next tick
    /// retries. `None` means the deadline passed.
    pub async fn wait_for_answer(&self, id: &str, timeout: Duration) -> Option<Request> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(Some(request)) = self.status(id).await {
                if request.status == RequestStatus::Answered {
                    return Some(request);
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        None
    }
}
