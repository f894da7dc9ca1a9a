//! Command manifest — the declarative table that drives the dispatcher.
//!
//! Each entry maps a command name to an HTTP verb and a URL path template.
//! Templates use `[token]` placeholders filled in by [`resolve_path`].
//! The table is fixed at compile time; an unknown name is a caller error
//! surfaced before any network activity.

use std::collections::BTreeMap;

/// HTTP verb for a manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    /// Whether requests with this verb carry a JSON body.
    pub fn has_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

/// One manifest entry: command name, verb, path template.
#[derive(Debug, Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub verb: Verb,
    pub path: &'static str,
}

/// The full command table for the Live API (v2).
pub const MANIFEST: &[Command] = &[
    Command { name: "sessions", verb: Verb::Get, path: "sessions" },
    Command { name: "flights", verb: Verb::Get, path: "sessions/[sessionId]/flights" },
    Command { name: "flightRoute", verb: Verb::Get, path: "sessions/[sessionId]/flights/[flightId]/route" },
    Command { name: "flightPlan", verb: Verb::Get, path: "sessions/[sessionId]/flights/[flightId]/flightplan" },
    Command { name: "atcFreqs", verb: Verb::Get, path: "sessions/[sessionId]/atc" },
    Command { name: "users", verb: Verb::Post, path: "users" },
    Command { name: "userDetails", verb: Verb::Get, path: "users/[userId]" },
    Command { name: "airportAtis", verb: Verb::Get, path: "sessions/[sessionId]/airport/[icao]/atis" },
    Command { name: "airportStatus", verb: Verb::Get, path: "sessions/[sessionId]/airport/[icao]/status" },
    Command { name: "worldStatus", verb: Verb::Get, path: "sessions/[sessionId]/world" },
    Command { name: "tracks", verb: Verb::Get, path: "tracks" },
    Command { name: "userFlights", verb: Verb::Get, path: "users/[userId]/flights" },
    Command { name: "userFlight", verb: Verb::Get, path: "users/[userId]/flights/[flightId]" },
    Command { name: "userAtcSessions", verb: Verb::Get, path: "users/[userId]/atc" },
    Command { name: "userAtcSession", verb: Verb::Get, path: "users/[userId]/atc/[atcSessionId]" },
    Command { name: "notams", verb: Verb::Get, path: "sessions/[sessionId]/notams" },
];

/// Look up a command by name. `None` means the caller asked for something
/// the API does not expose.
pub fn lookup(name: &str) -> Option<&'static Command> {
    MANIFEST.iter().find(|c| c.name == name)
}

/// Substitute `[token]` placeholders in a path template.
///
/// Placeholders with no matching parameter are left verbatim — commands
/// without parameters pass their template through untouched. Values are
/// inserted as-is with no URL escaping; a value containing `/` or other
/// reserved characters produces an undefined request path (documented
/// limitation, kept from the wire contract).
pub fn resolve_path(template: &str, params: &BTreeMap<String, String>) -> String {
    let mut path = template.to_string();
    for (key, value) in params {
        path = path.replace(&format!("[{key}]"), value);
    }
    path
}
