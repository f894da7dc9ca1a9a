//! Client construction plus the dispatcher and cache-aware accessor.
//!
//! A [`Client`] is an explicit context object: manifest, cache, poll table
//! and delivery sink all hang off one `Arc`-backed handle, so several
//! independent clients can coexist in a process. Clone it freely.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStore, CallKey};
use crate::config::ClientOptions;
use crate::delivery::{ClientEvent, OnComplete, ResultSink};
use crate::error::Error;
use crate::manifest;
use crate::poll::PollTable;
use crate::transport::{HttpTransport, Transport};
use crate::{Body, Params, logger};

/// Handle to one API client. Cheaply cloneable (`Arc`-backed).
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) transport: Transport,
    pub(crate) sink: ResultSink,
    pub(crate) events: broadcast::Sender<ClientEvent>,
    pub(crate) cache: CacheStore,
    pub(crate) polls: PollTable,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        // Dropping the last handle stops every live poll.
        self.polls.cancel_all();
    }
}

impl Client {
    /// Initialize a client against the production API.
    ///
    /// Delivery mode is fixed here: `use_callback` selects per-call
    /// callbacks, otherwise completions are broadcast as [`ClientEvent`]s.
    pub fn new(api_key: impl Into<String>, options: ClientOptions) -> Result<Self, Error> {
        let transport = Transport::Http(HttpTransport::new(options.timeout)?);
        Self::with_transport(api_key, options, transport)
    }

    /// Same construction with a caller-supplied transport — the injection
    /// seam used by tests and offline tooling.
    pub fn with_transport(
        api_key: impl Into<String>,
        options: ClientOptions,
        transport: Transport,
    ) -> Result<Self, Error> {
        if options.enable_log {
            logger::init(options.log_level);
        }

        let (events, _) = broadcast::channel(options.channel_capacity);
        let sink = if options.use_callback {
            ResultSink::Callback
        } else {
            ResultSink::Events(events.clone())
        };

        let client = Self {
            inner: Arc::new(ClientInner {
                api_key: api_key.into(),
                base_url: options.base_url,
                transport,
                sink,
                events,
                cache: CacheStore::new(),
                polls: PollTable::new(),
            }),
        };

        info!(base_url = %client.inner.base_url, "client initialized");

        // In event mode the init-complete signal also rides the bus. With no
        // subscribers yet it is dropped; the returned Result stays the
        // authoritative signal either way.
        if let ResultSink::Events(tx) = &client.inner.sink {
            let _ = tx.send(ClientEvent::Initialized);
        }

        Ok(client)
    }

    /// Subscribe to the event bus. Only event-mode clients publish here.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Dispatch `command` once and deliver the unwrapped payload through
    /// the active delivery mode.
    ///
    /// An unknown command is returned as `Err` before any network activity.
    /// Transport and envelope failures are delivered through the sink like
    /// any other outcome.
    pub async fn call(
        &self,
        command: &str,
        params: Params,
        body: Body,
        on_complete: Option<OnComplete>,
    ) -> Result<(), Error> {
        manifest::lookup(command).ok_or_else(|| Error::UnknownCommand(command.to_string()))?;
        debug!(command, "call");

        let outcome = self.dispatch(command, &params, &body).await;
        if let Err(e) = &outcome {
            warn!(command, error = %e, "dispatch failed");
        }
        self.inner.sink.deliver(command, &params, &body, outcome, on_complete);
        Ok(())
    }

    /// Cache-aware accessor: serve the memoized `{data, fetchedAt}` entry
    /// when one exists, else dispatch and republish from the fresh entry.
    ///
    /// "Exists" is a pure presence check — entries never expire by age.
    /// A successful dispatch that somehow left no entry delivers JSON null
    /// rather than an error.
    pub async fn get(
        &self,
        command: &str,
        params: Params,
        body: Body,
        on_complete: Option<OnComplete>,
    ) -> Result<(), Error> {
        manifest::lookup(command).ok_or_else(|| Error::UnknownCommand(command.to_string()))?;
        let key = CallKey::derive(command, &params, &body);

        if let Some(entry) = self.inner.cache.get(&key)? {
            debug!(command, "cache hit");
            self.inner
                .sink
                .deliver(command, &params, &body, Ok(entry.to_value()), on_complete);
            return Ok(());
        }

        debug!(command, "cache miss");
        match self.dispatch(command, &params, &body).await {
            Ok(_) => {
                // Re-read rather than reuse the raw payload so hits and
                // misses share the same result shape.
                let delivered = match self.inner.cache.get(&key)? {
                    Some(entry) => entry.to_value(),
                    None => Value::Null,
                };
                self.inner
                    .sink
                    .deliver(command, &params, &body, Ok(delivered), on_complete);
            }
            Err(e) => {
                warn!(command, error = %e, "dispatch failed");
                self.inner.sink.deliver(command, &params, &body, Err(e), on_complete);
            }
        }
        Ok(())
    }

    /// Peek at the cache slot for an invocation without any network
    /// activity or delivery.
    pub fn cached(
        &self,
        command: &str,
        params: &Params,
        body: &Body,
    ) -> Result<Option<CacheEntry>, Error> {
        let key = CallKey::derive(command, params, body);
        self.inner.cache.get(&key)
    }

    /// One manifest → path → transport → unwrap → cache round. Exactly one
    /// transport attempt; a failure leaves the cache untouched.
    pub(crate) async fn dispatch(
        &self,
        command: &str,
        params: &Params,
        body: &Body,
    ) -> Result<Value, Error> {
        let cmd =
            manifest::lookup(command).ok_or_else(|| Error::UnknownCommand(command.to_string()))?;
        let path = manifest::resolve_path(cmd.path, params);
        let url = format!("{}{}", self.inner.base_url, path);
        let request_body = cmd.verb.has_body().then_some(body);

        let raw = self
            .inner
            .transport
            .execute(cmd.verb, &url, &self.inner.api_key, request_body)
            .await?;
        let result = unwrap_envelope(raw)?;

        let key = CallKey::derive(command, params, body);
        self.inner.cache.insert(key, CacheEntry::new(result.clone()))?;
        debug!(command, "dispatch complete");
        Ok(result)
    }
}

/// Every success body is an envelope object whose `result` field holds the
/// actual payload. Anything else is a malformed envelope, never cached.
fn unwrap_envelope(raw: Value) -> Result<Value, Error> {
    match raw {
        Value::Object(mut map) => map
            .remove("result")
            .ok_or_else(|| Error::MalformedEnvelope("envelope has no `result` field".into())),
        other => Err(Error::MalformedEnvelope(format!(
            "expected a JSON object envelope, found {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
