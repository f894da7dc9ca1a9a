//! Transport adapter — executes exactly one HTTP request per dispatch.
//!
//! `Transport` is an enum over concrete backends: enum dispatch keeps the
//! seam injectable without trait objects. `Http` is the real reqwest-backed
//! adapter; `Stub` serves canned responses and records what it was asked,
//! for tests and offline callers.
//!
//! The adapter parses the body as JSON and folds non-2xx statuses into a
//! typed transport error. Unwrapping the `result` envelope is the
//! dispatcher's job, not the transport's.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::Body;
use crate::error::Error;
use crate::manifest::Verb;

// ── Adapter enum ─────────────────────────────────────────────────────────────

/// All available transport backends.
#[derive(Debug, Clone)]
pub enum Transport {
    Http(HttpTransport),
    Stub(StubTransport),
}

impl Transport {
    /// Perform one request: no retry, no redirect-special-casing.
    pub async fn execute(
        &self,
        verb: Verb,
        url: &str,
        api_key: &str,
        body: Option<&Body>,
    ) -> Result<Value, Error> {
        match self {
            Transport::Http(t) => t.execute(verb, url, api_key, body).await,
            Transport::Stub(t) => t.execute(verb, url, body),
        }
    }
}

// ── HTTP backend ─────────────────────────────────────────────────────────────

/// reqwest-backed adapter. Built once at init and cloned freely —
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn execute(
        &self,
        verb: Verb,
        url: &str,
        api_key: &str,
        body: Option<&Body>,
    ) -> Result<Value, Error> {
        let method = match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        };

        let mut req = self.client.request(method, url).bearer_auth(api_key);
        if let Some(body) = body {
            req = req.json(body);
        }

        debug!(verb = verb.as_str(), %url, "sending request");

        let response = req.send().await.map_err(|e| {
            error!(%url, error = %e, "HTTP request failed (transport)");
            Error::Transport(e.to_string())
        })?;

        let response = check_status(response).await?;

        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response body: {e}")))?;
        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(body = %text, "raw response body");
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::MalformedEnvelope(format!("response is not valid JSON: {e}")))
    }
}

/// Consume the response and return it if successful, or a structured error
/// carrying the status and whatever body the server sent.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    error!(%status, "request returned HTTP error");
    Err(Error::Transport(format!("HTTP {status}: {body}")))
}

// ── Stub backend ─────────────────────────────────────────────────────────────

/// In-memory adapter: pops queued outcomes and records every call.
///
/// The last queued outcome is sticky — once the queue is down to one entry
/// it is returned for every subsequent call, so a single stubbed response
/// can feed an entire poll run.
#[derive(Debug, Clone, Default)]
pub struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

#[derive(Debug, Default)]
struct StubState {
    outcomes: VecDeque<Result<Value, String>>,
    calls: Vec<RecordedCall>,
}

/// One request as the stub saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub verb: Verb,
    pub url: String,
    pub body: Option<Body>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful raw response body (pre-parse, envelope included).
    pub fn push_response(&self, value: Value) {
        if let Ok(mut state) = self.state.lock() {
            state.outcomes.push_back(Ok(value));
        }
    }

    /// Queue a transport-level failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.outcomes.push_back(Err(message.into()));
        }
    }

    /// Everything the stub has been asked so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().map(|s| s.calls.len()).unwrap_or(0)
    }

    fn execute(&self, verb: Verb, url: &str, body: Option<&Body>) -> Result<Value, Error> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Transport("stub transport lock poisoned".into()))?;

        state.calls.push(RecordedCall {
            verb,
            url: url.to_string(),
            body: body.cloned(),
        });

        let next = if state.outcomes.len() > 1 {
            state.outcomes.pop_front()
        } else {
            state.outcomes.front().cloned()
        };

        match next {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(Error::Transport(message)),
            None => Err(Error::Transport("stub transport has no queued response".into())),
        }
    }
}
