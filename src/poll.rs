//! Interval polling — managed recurring dispatches per call key.
//!
//! The poll table maps [`CallKey`] to a cancellable handle with explicit
//! cancel-on-replace semantics: at most one live timer exists per key.
//! Tick tasks hold only a `Weak` reference to the client, so an abandoned
//! client tears its polls down instead of being kept alive by them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::CallKey;
use crate::client::{Client, ClientInner};
use crate::delivery::{OnComplete, OnTick};
use crate::error::Error;
use crate::manifest;
use crate::{Body, Params};

// ── Poll registry ────────────────────────────────────────────────────────────

/// One live poll: the token that cancels its timer task.
struct PollHandle {
    token: CancellationToken,
}

/// Registry of live polls, one handle per [`CallKey`].
#[derive(Default)]
pub(crate) struct PollTable {
    handles: Mutex<HashMap<CallKey, PollHandle>>,
}

impl PollTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Install `token` for `key`, cancelling any previous handle first.
    /// Returns whether a handle was replaced.
    fn replace(&self, key: CallKey, token: CancellationToken) -> Result<bool, Error> {
        let mut handles = self
            .handles
            .lock()
            .map_err(|_| Error::Poll("poll table lock poisoned".into()))?;
        let previous = handles.insert(key, PollHandle { token });
        if let Some(prev) = previous {
            prev.token.cancel();
            return Ok(true);
        }
        Ok(false)
    }

    /// Cancel and discard the handle for `key`. `false` means there was
    /// nothing to stop.
    fn remove(&self, key: &CallKey) -> Result<bool, Error> {
        let mut handles = self
            .handles
            .lock()
            .map_err(|_| Error::Poll("poll table lock poisoned".into()))?;
        match handles.remove(key) {
            Some(handle) => {
                handle.token.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Cancel every live poll. Called when the last client handle drops.
    pub(crate) fn cancel_all(&self) {
        if let Ok(handles) = self.handles.lock() {
            for handle in handles.values() {
                handle.token.cancel();
            }
        }
    }
}

// ── Client operations ────────────────────────────────────────────────────────

impl Client {
    /// Arm a recurring dispatch for (command, call key).
    ///
    /// Idempotent restart: a prior timer for the same key is cancelled
    /// before the new one is armed, so its future ticks never fire. The
    /// first dispatch happens immediately rather than one interval in.
    /// A failed tick logs a warning and polling continues at the fixed
    /// period — no backoff, no circuit-breaking.
    ///
    /// The tick task runs on the ambient tokio runtime; calling this
    /// outside one returns [`Error::Poll`].
    pub fn start_poll(
        &self,
        command: &str,
        params: Params,
        body: Body,
        interval: Duration,
        on_tick: Option<OnTick>,
    ) -> Result<(), Error> {
        manifest::lookup(command).ok_or_else(|| Error::UnknownCommand(command.to_string()))?;
        if interval.is_zero() {
            return Err(Error::InvalidInterval);
        }
        let runtime = Handle::try_current()
            .map_err(|_| Error::Poll("start_poll requires a tokio runtime".into()))?;

        let key = CallKey::derive(command, &params, &body);
        let token = CancellationToken::new();
        if self.inner.polls.replace(key, token.clone())? {
            debug!(command, "replacing existing poll");
        }

        let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
        let command = command.to_string();
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(command = %command, interval_ms = interval.as_millis() as u64, "poll armed");

            loop {
                tokio::select! {
                    biased;

                    _ = token.cancelled() => {
                        debug!(command = %command, "poll cancelled");
                        break;
                    }

                    _ = ticker.tick() => {
                        // The client may have been dropped between ticks.
                        let Some(inner) = weak.upgrade() else { break };
                        let client = Client { inner };

                        let outcome = client.dispatch(&command, &params, &body).await;
                        if let Err(e) = &outcome {
                            warn!(command = %command, error = %e, "poll tick failed");
                        }
                        let cb = on_tick
                            .clone()
                            .map(|f| -> OnComplete { Box::new(move |r| f(r)) });
                        client.inner.sink.deliver(&command, &params, &body, outcome, cb);
                    }
                }
            }
        });

        Ok(())
    }

    /// Cancel the poll for (command, call key). Stopping a poll that does
    /// not exist is a no-op.
    pub fn stop_poll(&self, command: &str, params: &Params, body: &Body) -> Result<(), Error> {
        let key = CallKey::derive(command, params, body);
        if self.inner.polls.remove(&key)? {
            debug!(command, "poll stopped");
        } else {
            debug!(command, "stop_poll: no active poll");
        }
        Ok(())
    }
}
