//! Result delivery — per-call callback or process-wide broadcast.
//!
//! The mode is fixed once at init and every completion (dispatch, cache
//! hit, poll tick) goes through the same sink. Exactly one delivery path
//! fires per dispatch: in callback mode nothing is broadcast, in event
//! mode the per-call callback is ignored by design.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::Error;
use crate::{Body, Params};

/// Outcome of one dispatch: the unwrapped payload or a typed failure.
pub type CallResult = Result<Value, Error>;

/// Per-call completion function (callback mode).
pub type OnComplete = Box<dyn FnOnce(CallResult) + Send + 'static>;

/// Per-tick completion function for polls (callback mode). `Fn` rather
/// than `FnOnce` because a poll invokes it on every tick.
pub type OnTick = Arc<dyn Fn(CallResult) + Send + Sync + 'static>;

/// Events published on the broadcast bus (event mode).
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Emitted once when the client finishes initialization.
    Initialized,
    /// One per completed dispatch, success or failure.
    Data {
        command: String,
        params: Params,
        body: Body,
        result: CallResult,
    },
}

/// The one place results leave the client.
#[derive(Debug, Clone)]
pub(crate) enum ResultSink {
    /// Invoke the per-call completion function.
    Callback,
    /// Publish on the broadcast bus; per-call callbacks are ignored.
    Events(broadcast::Sender<ClientEvent>),
}

impl ResultSink {
    pub(crate) fn deliver(
        &self,
        command: &str,
        params: &Params,
        body: &Body,
        result: CallResult,
        on_complete: Option<OnComplete>,
    ) {
        match self {
            ResultSink::Callback => match on_complete {
                Some(cb) => cb(result),
                None => {
                    if let Err(e) = result {
                        warn!(command, error = %e, "dropping outcome: no completion callback");
                    }
                }
            },
            ResultSink::Events(tx) => {
                let event = ClientEvent::Data {
                    command: command.to_string(),
                    params: params.clone(),
                    body: body.clone(),
                    result,
                };
                // A send error just means nobody is subscribed right now.
                if tx.send(event).is_err() {
                    debug!(command, "no event subscribers");
                }
            }
        }
    }
}
