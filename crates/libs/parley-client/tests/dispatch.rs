use parley_client::parley_schema::{DecodeErrorKind, Int64, Tick, Update};
use parley_client::{Client, ClientConfig, Notification};
use parley_test_support::{channel, init_logging};
use serde_json::json;

fn tick(count: u64) -> serde_json::Value {
    json!({ "@type": "example.event.tick", "count": count.to_string() })
}

#[tokio::test]
async fn slow_subscriber_sees_order_and_counted_drops() {
    init_logging();
    let (stream, mut engine) = channel();
    let config = ClientConfig { event_capacity: 4, ..ClientConfig::default() };
    let client = Client::<Update>::over_stream(stream, config).expect("client");
    let mut slow = client.subscribe();
    const EVENTS: u64 = 20;

    for count in 1..=EVENTS {
        engine.send(&tick(count)).await;
    }
    // A tokened round trip proves every tick before it has been published.
    let round_trip = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .call::<parley_client::parley_schema::Done>(
                    parley_client::parley_schema::Request::new("ping"),
                    std::time::Duration::from_secs(5),
                )
                .await
        }
    });
    let ping = engine.expect_request().await;
    engine.reply(&ping, "ok", json!({})).await;
    round_trip.await.expect("task").expect("pong");

    let mut seen = Vec::new();
    let mut dropped = 0;
    while let Some(notification) = slow.try_recv() {
        match notification {
            Notification::Event(Update::Tick(Tick { count })) => seen.push(count.get()),
            Notification::Dropped(missed) => dropped += missed,
            other => panic!("unexpected {other:?}"),
        }
    }

    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]), "reordered: {seen:?}");
    assert_eq!(seen.last(), Some(&(EVENTS as i64)));
    assert_eq!(seen.len() as u64 + dropped, EVENTS);
    assert_eq!(slow.dropped(), dropped);
    assert!(dropped > 0);
    assert_eq!(client.dispatch_stats().published, EVENTS);
}

#[tokio::test]
async fn undecodable_pushes_are_surfaced_not_dropped() {
    init_logging();
    let (stream, mut engine) = channel();
    let client = Client::<Update>::over_stream(stream, ClientConfig::default()).expect("client");
    let mut events = client.subscribe();

    engine.send(&json!({ "@type": "updateUserStatus", "user_id": "1" })).await;
    engine.send_raw("{not json").await;
    engine.send(&json!({ "@type": "example.event.tick", "count": 3 })).await;
    engine.send(&tick(4)).await;

    let Some(Notification::Undecodable { discriminant, error }) = events.recv().await else {
        panic!("expected unknown variant");
    };
    assert_eq!(discriminant.as_deref(), Some("updateUserStatus"));
    assert_eq!(
        error.kind(),
        &DecodeErrorKind::UnknownVariant { category: "Update", discriminant: "updateUserStatus".into() }
    );

    let Some(Notification::Undecodable { discriminant: None, error }) = events.recv().await else {
        panic!("expected malformed frame");
    };
    assert!(matches!(error.kind(), DecodeErrorKind::Malformed { .. }));

    let Some(Notification::Undecodable { error, .. }) = events.recv().await else {
        panic!("expected wide-integer violation");
    };
    assert!(matches!(error.kind(), DecodeErrorKind::WideInteger { .. }));
    assert_eq!(error.path(), "count");

    assert_eq!(
        events.recv().await,
        Some(Notification::Event(Update::Tick(Tick { count: Int64(4) })))
    );
    assert_eq!(client.dispatch_stats().undecodable, 3);
}

#[tokio::test]
async fn unknown_token_is_treated_as_push() {
    init_logging();
    let (stream, mut engine) = channel();
    let client = Client::<Update>::over_stream(stream, ClientConfig::default()).expect("client");
    let mut events = client.subscribe();

    engine.send(&json!({ "@type": "example.event.tick", "@token": "never-issued", "count": "9" })).await;
    engine.send(&json!({ "@type": "error", "code": 500, "message": "Internal" })).await;

    assert_eq!(
        events.recv().await,
        Some(Notification::Event(Update::Tick(Tick { count: Int64(9) })))
    );
    let Some(Notification::EngineError(err)) = events.recv().await else {
        panic!("expected untokened engine error");
    };
    assert_eq!(err.code, 500);
}

#[tokio::test]
async fn subscriptions_attach_detach_and_end_with_the_client() {
    init_logging();
    let (stream, mut engine) = channel();
    let client = Client::<Update>::over_stream(stream, ClientConfig::default()).expect("client");

    let early = client.subscribe();
    client.unsubscribe(early);
    let mut late = client.subscribe();

    engine.send(&tick(1)).await;
    assert!(matches!(late.recv().await, Some(Notification::Event(_))));

    engine.hang_up().await;
    assert_eq!(late.recv().await, None);
    assert!(client.subscribe().recv().await.is_none());
}

#[tokio::test]
async fn rejected_frames_do_not_end_the_read_loop() {
    init_logging();
    let (stream, mut engine) = channel();
    let config = ClientConfig { max_frame_bytes: 64, ..ClientConfig::default() };
    let client = Client::<Update>::over_stream(stream, config).expect("client");
    let mut events = client.subscribe();

    engine.send_bytes(b"{\"@type\":\"example.event.tick\",\"count\":\"\xff\"}").await;
    engine.send(&tick(1)).await;
    engine.send(&json!({ "@type": "example.event.tick", "count": "2", "pad": "x".repeat(200) })).await;
    engine.send(&tick(3)).await;

    for expected in [1, 3] {
        let Some(Notification::Undecodable { discriminant: None, error }) = events.recv().await
        else {
            panic!("expected a rejected frame before tick {expected}");
        };
        assert!(matches!(error.kind(), DecodeErrorKind::Malformed { .. }));
        assert_eq!(
            events.recv().await,
            Some(Notification::Event(Update::Tick(Tick { count: Int64(expected) })))
        );
    }
    assert!(!client.is_closed());
    assert_eq!(client.dispatch_stats().undecodable, 2);
}
