//! Dispatcher and cache-aware accessor behavior against the stub transport.

use std::sync::mpsc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

use iflive::manifest::Verb;
use iflive::{
    Body, CallResult, Client, ClientEvent, ClientOptions, Error, OnComplete, Params,
    StubTransport, Transport,
};

const BASE: &str = "https://api.test/public/v2/";

fn callback_client(stub: &StubTransport) -> Client {
    let options = ClientOptions {
        use_callback: true,
        base_url: BASE.to_string(),
        ..Default::default()
    };
    Client::with_transport("test-key", options, Transport::Stub(stub.clone())).unwrap()
}

fn event_client(stub: &StubTransport) -> Client {
    let options = ClientOptions {
        base_url: BASE.to_string(),
        ..Default::default()
    };
    Client::with_transport("test-key", options, Transport::Stub(stub.clone())).unwrap()
}

fn capture() -> (OnComplete, mpsc::Receiver<CallResult>) {
    let (tx, rx) = mpsc::channel();
    (Box::new(move |r| tx.send(r).unwrap()), rx)
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn call_sessions_end_to_end() {
    let stub = StubTransport::new();
    stub.push_response(json!({"result": [{"id": "s1"}]}));
    let client = callback_client(&stub);

    let (cb, rx) = capture();
    client
        .call("sessions", Params::new(), Body::new(), Some(cb))
        .await
        .unwrap();

    // The transport saw exactly one GET against the resolved path.
    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].verb, Verb::Get);
    assert_eq!(calls[0].url, format!("{BASE}sessions"));
    assert!(calls[0].body.is_none());

    // The singleton cache slot holds the unwrapped payload with a fresh
    // timestamp.
    let entry = client
        .cached("sessions", &Params::new(), &Body::new())
        .unwrap()
        .expect("cache entry populated");
    assert_eq!(entry.data, json!([{"id": "s1"}]));
    let fetched_ms = entry.to_value()["fetchedAt"].as_i64().unwrap();
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    assert!((now_ms - fetched_ms).abs() < 5_000);

    // The callback got the raw unwrapped payload.
    assert_eq!(rx.recv().unwrap().unwrap(), json!([{"id": "s1"}]));
}

#[tokio::test]
async fn unknown_command_rejected_before_transport() {
    let stub = StubTransport::new();
    let client = callback_client(&stub);

    let err = client
        .call("teleport", Params::new(), Body::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownCommand(name) if name == "teleport"));
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn params_resolve_into_the_request_path() {
    let stub = StubTransport::new();
    stub.push_response(json!({"result": []}));
    let client = callback_client(&stub);

    client
        .call("flights", params(&[("sessionId", "abc123")]), Body::new(), None)
        .await
        .unwrap();

    assert_eq!(stub.calls()[0].url, format!("{BASE}sessions/abc123/flights"));
}

#[tokio::test]
async fn post_command_carries_the_body() {
    let stub = StubTransport::new();
    stub.push_response(json!({"result": [{"userId": "u1"}]}));
    let client = callback_client(&stub);

    let mut body = Body::new();
    body.insert("discourseNames".into(), json!(["someone"]));
    client
        .call("users", Params::new(), body.clone(), None)
        .await
        .unwrap();

    let calls = stub.calls();
    assert_eq!(calls[0].verb, Verb::Post);
    assert_eq!(calls[0].url, format!("{BASE}users"));
    assert_eq!(calls[0].body.as_ref().unwrap(), &body);

    // With empty params the body addresses the cache slot.
    let entry = client.cached("users", &Params::new(), &body).unwrap();
    assert!(entry.is_some());
}

#[tokio::test]
async fn get_serves_from_cache_after_one_dispatch() {
    let stub = StubTransport::new();
    stub.push_response(json!({"result": {"id": 7}}));
    let client = callback_client(&stub);

    let (cb1, rx1) = capture();
    client.get("tracks", Params::new(), Body::new(), Some(cb1)).await.unwrap();
    let first = rx1.recv().unwrap().unwrap();
    assert_eq!(first["data"], json!({"id": 7}));
    assert!(first["fetchedAt"].is_i64());

    let (cb2, rx2) = capture();
    client.get("tracks", Params::new(), Body::new(), Some(cb2)).await.unwrap();
    let second = rx2.recv().unwrap().unwrap();

    // Hit and miss share the {data, fetchedAt} shape, and the hit made no
    // second transport call.
    assert_eq!(second, first);
    assert_eq!(stub.call_count(), 1);
}

#[tokio::test]
async fn structurally_equal_params_hit_the_same_slot() {
    let stub = StubTransport::new();
    stub.push_response(json!({"result": []}));
    let client = callback_client(&stub);

    // Two separately constructed, structurally equal mappings.
    client
        .get("flights", params(&[("sessionId", "s1")]), Body::new(), None)
        .await
        .unwrap();
    client
        .get("flights", params(&[("sessionId", "s1")]), Body::new(), None)
        .await
        .unwrap();
    assert_eq!(stub.call_count(), 1);

    // A different parameter value is a different slot.
    client
        .get("flights", params(&[("sessionId", "s2")]), Body::new(), None)
        .await
        .unwrap();
    assert_eq!(stub.call_count(), 2);
}

#[tokio::test]
async fn malformed_envelope_is_a_failure_and_never_cached() {
    let stub = StubTransport::new();
    stub.push_response(json!({"errorCode": 6}));
    let client = callback_client(&stub);

    let (cb, rx) = capture();
    client
        .call("sessions", Params::new(), Body::new(), Some(cb))
        .await
        .unwrap();

    assert!(matches!(rx.recv().unwrap(), Err(Error::MalformedEnvelope(_))));
    assert!(
        client
            .cached("sessions", &Params::new(), &Body::new())
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn transport_failure_is_typed_and_leaves_cache_untouched() {
    let stub = StubTransport::new();
    stub.push_failure("connection reset");
    let client = callback_client(&stub);

    let (cb, rx) = capture();
    client
        .call("sessions", Params::new(), Body::new(), Some(cb))
        .await
        .unwrap();

    assert!(matches!(
        rx.recv().unwrap(),
        Err(Error::Transport(msg)) if msg.contains("connection reset")
    ));
    assert!(
        client
            .cached("sessions", &Params::new(), &Body::new())
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn failed_dispatch_does_not_corrupt_other_entries() {
    let stub = StubTransport::new();
    stub.push_response(json!({"result": "tracks-data"}));
    stub.push_failure("boom");
    let client = callback_client(&stub);

    client.call("tracks", Params::new(), Body::new(), None).await.unwrap();
    client.call("sessions", Params::new(), Body::new(), None).await.unwrap();

    let entry = client
        .cached("tracks", &Params::new(), &Body::new())
        .unwrap()
        .unwrap();
    assert_eq!(entry.data, json!("tracks-data"));
}

#[tokio::test]
async fn event_mode_broadcasts_the_full_context() {
    let stub = StubTransport::new();
    stub.push_response(json!({"result": [{"id": "s1"}]}));
    let client = event_client(&stub);
    let mut events = client.subscribe();

    let (cb, cb_rx) = capture();
    client
        .call("flights", params(&[("sessionId", "s1")]), Body::new(), Some(cb))
        .await
        .unwrap();

    match events.try_recv().unwrap() {
        ClientEvent::Data { command, params: p, body, result } => {
            assert_eq!(command, "flights");
            assert_eq!(p.get("sessionId").unwrap(), "s1");
            assert!(body.is_empty());
            assert_eq!(result.unwrap(), json!([{"id": "s1"}]));
        }
        other => panic!("expected Data event, got {other:?}"),
    }
    // Only one of the two delivery paths ever fires.
    assert!(cb_rx.try_recv().is_err());
}

#[tokio::test]
async fn event_mode_subscriber_sees_failures_too() {
    let stub = StubTransport::new();
    stub.push_failure("503 from upstream");
    let client = event_client(&stub);
    let mut events = client.subscribe();

    client.call("sessions", Params::new(), Body::new(), None).await.unwrap();

    match events.try_recv().unwrap() {
        ClientEvent::Data { result, .. } => assert!(matches!(result, Err(Error::Transport(_)))),
        other => panic!("expected Data event, got {other:?}"),
    }
}

#[tokio::test]
async fn two_clients_keep_independent_caches() {
    let stub_a = StubTransport::new();
    let stub_b = StubTransport::new();
    stub_a.push_response(json!({"result": "a"}));
    stub_b.push_response(json!({"result": "b"}));
    let a = callback_client(&stub_a);
    let b = callback_client(&stub_b);

    a.call("sessions", Params::new(), Body::new(), None).await.unwrap();
    b.call("sessions", Params::new(), Body::new(), None).await.unwrap();

    assert_eq!(
        a.cached("sessions", &Params::new(), &Body::new()).unwrap().unwrap().data,
        json!("a")
    );
    assert_eq!(
        b.cached("sessions", &Params::new(), &Body::new()).unwrap().unwrap().data,
        json!("b")
    );
}
