use chat_protocol::{MessageKind, MessageRecord, Timestamp, WireMessage};
use pretty_assertions::assert_eq;
use serde_json::json;
use timeline_store::{AppendOutcome, TimelineChange, TimelineStore};

fn at(raw: &str) -> Timestamp {
    Timestamp::parse(raw).expect("test timestamp parses")
}

fn wire(value: serde_json::Value) -> WireMessage {
    serde_json::from_value(value).expect("wire message shape")
}

fn bodies(store: &TimelineStore) -> Vec<String> {
    store
        .records()
        .iter()
        .map(|record| record.body().to_string())
        .collect()
}

#[test]
fn snapshot_order_matches_non_duplicate_append_order() {
    let mut store = TimelineStore::new();
    let first = MessageRecord::plain("mina", "first", at("2024-05-01T09:30:00Z"));
    let second = MessageRecord::plain("joon", "second", at("2024-05-01T09:30:01Z"));
    let third = MessageRecord::system("weather bot", "third", at("2024-05-01T09:29:00Z"));

    store.append(first.clone());
    store.append(second.clone());
    store.append(first.clone());
    store.append(third.clone());
    store.append(second);

    assert_eq!(bodies(&store), vec!["first", "second", "third"]);
    assert_eq!(store.snapshot()[2], third);
}

#[test]
fn no_two_records_share_a_dedup_triple() {
    let mut store = TimelineStore::new();
    let created_at = at("2024-05-01T09:30:00Z");

    for _ in 0..5 {
        store.append(MessageRecord::plain("mina", "hello", created_at));
        store.append(MessageRecord::plain("mina", "hello again", created_at));
    }

    let records = store.snapshot();
    for (index, record) in records.iter().enumerate() {
        for other in &records[index + 1..] {
            assert!(!record.is_same_event(other));
        }
    }
    assert_eq!(records.len(), 2);
}

#[test]
fn identical_text_and_time_from_another_sender_is_kept() {
    let mut store = TimelineStore::new();
    let created_at = at("2024-05-01T09:30:00Z");

    assert!(store
        .append(MessageRecord::plain("mina", "hello", created_at))
        .is_appended());
    assert!(store
        .append(MessageRecord::plain("joon", "hello", created_at))
        .is_appended());
    assert_eq!(store.len(), 2);
}

#[test]
fn kind_does_not_participate_in_dedup() {
    let mut store = TimelineStore::new();
    let created_at = at("2024-05-01T09:30:00Z");

    store.append(MessageRecord::plain("mina", "hello", created_at));
    let outcome = store.append(MessageRecord::new(
        MessageKind::AiReply,
        "mina",
        "hello",
        created_at,
    ));

    assert_eq!(outcome, AppendOutcome::Duplicate);
}

#[test]
fn every_observer_sees_each_append_once_in_order() {
    let mut store = TimelineStore::new();
    let mut first = store.observe();
    let mut second = store.observe();

    let hello = MessageRecord::plain("mina", "hello", at("2024-05-01T09:30:00Z"));
    let reply = MessageRecord::new(
        MessageKind::AiReply,
        "AI assistant",
        "hi",
        at("2024-05-01T09:30:02Z"),
    );
    store.append(hello.clone());
    store.append(hello.clone());
    store.append(reply.clone());

    let expected = vec![
        TimelineChange {
            index: 0,
            record: hello,
        },
        TimelineChange {
            index: 1,
            record: reply,
        },
    ];
    assert_eq!(first.drain(), expected);
    assert_eq!(second.drain(), expected);
}

#[test]
fn late_observer_only_sees_later_appends() {
    let mut store = TimelineStore::new();
    store.append(MessageRecord::plain("mina", "before", at("2024-05-01T09:30:00Z")));

    let (snapshot, mut subscription) = store.observe_with_snapshot();
    store.append(MessageRecord::plain("mina", "after", at("2024-05-01T09:30:01Z")));

    assert_eq!(snapshot.len(), 1);
    let changes = subscription.drain();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].index, 1);
    assert_eq!(changes[0].record.body(), "after");
}

#[tokio::test]
async fn subscription_recv_waits_for_next_change() {
    let mut store = TimelineStore::new();
    let mut subscription = store.observe();

    store.append(MessageRecord::plain("mina", "hello", at("2024-05-01T09:30:00Z")));

    let change = subscription.recv().await.expect("change delivered");
    assert_eq!(change.record.body(), "hello");

    drop(store);
    assert!(subscription.recv().await.is_none());
}

#[test]
fn hydrate_skips_unclassifiable_entries_and_reports_them() {
    let mut store = TimelineStore::new();
    let history = vec![
        wire(json!({
            "type": "text",
            "nickname": "mina",
            "message": "hello",
            "timestamp": "2024-05-01T09:30:00.000000"
        })),
        wire(json!({
            "type": "text",
            "nickname": "joon",
            "message": "broken",
            "timestamp": "not a time"
        })),
        wire(json!({
            "type": "ai_chat",
            "nickname": "AI assistant",
            "message": "hi mina",
            "timestamp": "2024-05-01T09:30:01.000000"
        })),
        wire(json!({
            "type": "text",
            "nickname": "mina",
            "message": "hello",
            "timestamp": "2024-05-01T09:30:00Z"
        })),
    ];

    let report = store.hydrate(history);

    assert_eq!(report.appended, 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].index, 1);
    assert_eq!(bodies(&store), vec!["hello", "hi mina"]);
}

#[test]
fn optimistic_echo_and_server_broadcast_merge() {
    let mut store = TimelineStore::new();
    let sent_at = at("2024-05-01T09:30:00.123Z");
    store.append(MessageRecord::plain("mina", "hello", sent_at));

    let broadcast = wire(json!({
        "type": "text",
        "nickname": "mina",
        "message": "hello",
        "timestamp": "2024-05-01T09:30:00.123000"
    }))
    .into_record()
    .expect("broadcast classifies");

    assert_eq!(store.append(broadcast), AppendOutcome::Duplicate);
    assert_eq!(store.len(), 1);
}
