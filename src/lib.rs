//! iflive — async client for the Infinite Flight Live API.
//!
//! A declarative command manifest drives every call: each command maps to
//! an HTTP verb and a `[token]` path template. Results are memoized per
//! (command, call key) and can be re-fetched on a fixed interval with
//! managed poll lifecycles. Delivery is either per-call callbacks or a
//! broadcast event bus, chosen once at init.
//!
//! ```no_run
//! use iflive::{Body, Client, ClientOptions, Params};
//!
//! # async fn run() -> Result<(), iflive::Error> {
//! let client = Client::new("my-api-key", ClientOptions::default())?;
//! let mut events = client.subscribe();
//!
//! client.call("sessions", Params::new(), Body::new(), None).await?;
//! let event = events.recv().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod delivery;
pub mod error;
pub mod manifest;
pub mod reference;
pub mod transport;

mod client;
mod logger;
mod poll;

pub use cache::{CacheEntry, CallKey};
pub use client::Client;
pub use config::{ClientOptions, DEFAULT_BASE_URL, LogLevel};
pub use delivery::{CallResult, ClientEvent, OnComplete, OnTick};
pub use error::Error;
pub use reference::ReferenceData;
pub use transport::{HttpTransport, RecordedCall, StubTransport, Transport};

/// Path parameters: placeholder token → string value. Ordered so key
/// derivation is structural, not insertion-dependent.
pub type Params = std::collections::BTreeMap<String, String>;

/// JSON request body for the verbs that carry one (POST/PUT/PATCH).
pub type Body = serde_json::Map<String, serde_json::Value>;
