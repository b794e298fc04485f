use super::*;
use crate::error::{ApiError, ApiErrorStatus};
use crate::test_support::{BASE_URL, MockHttp, MockSink, identity};
use schoolhub_shared::{CHAT_PAGE_SIZE, PUBLIC_ROOM, Role, Timestamp};

// =========================================================
// 辅助函数
// =========================================================

struct Harness {
    http: MockHttp,
    sink: MockSink,
    room: ChatRoom<MockHttp, MockSink>,
}

fn harness() -> Harness {
    let http = MockHttp::new();
    let sink = MockSink::default();
    let gateway = Rc::new(Gateway::new(http.clone(), BASE_URL));
    let room = ChatRoom::new(
        gateway,
        PUBLIC_ROOM,
        Some(identity("me", Role::Teacher)),
        Some("tok".into()),
    );
    room.attach(sink.clone());
    Harness { http, sink, room }
}

fn message_json(id: &str, sender: &str, ms: i64) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "sender": {"_id": sender, "fullName": format!("User {sender}")},
        "content": format!("message {id}"),
        "timestamp": Timestamp::from_millis(ms).to_cursor(),
        "room": PUBLIC_ROOM,
    })
}

fn page_json(prefix: &str, count: usize, start_ms: i64) -> String {
    let messages: Vec<_> = (0..count)
        .map(|i| message_json(&format!("{prefix}{i}"), "peer", start_ms + i as i64))
        .collect();
    serde_json::json!({ "messages": messages }).to_string()
}

fn incoming(id: &str, sender: &str, ms: i64) -> ServerEvent {
    ServerEvent::ChatMessage(serde_json::from_value(message_json(id, sender, ms)).unwrap())
}

fn ids(room: &ChatRoom<MockHttp, MockSink>) -> Vec<String> {
    room.with_state(|s| {
        s.timeline
            .messages()
            .iter()
            .map(|m| m.server_id.clone().unwrap_or_else(|| "<pending>".into()))
            .collect()
    })
}

// =========================================================
// 连接与历史
// =========================================================

#[tokio::test]
async fn test_attach_joins_room_and_history_loads() {
    let h = harness();
    assert_eq!(
        h.sink.events(),
        vec![ClientEvent::JoinRoom(PUBLIC_ROOM.into())]
    );

    h.http.respond(200, &page_json("h", 3, 1_000));
    h.room.load_history().await;
    assert_eq!(ids(&h.room), vec!["h0", "h1", "h2"]);
    assert!(!h.room.with_state(|s| s.timeline.has_more()));

    let sent = h.http.last_request();
    assert!(sent.query.contains(&("room".to_string(), PUBLIC_ROOM.to_string())));
}

#[tokio::test]
async fn test_history_failure_empties_list() {
    let cases: [fn(&MockHttp); 3] = [
        |http: &MockHttp| {
            http.fail(ApiError::timeout());
        },
        |http: &MockHttp| {
            http.respond(200, "{not json");
        },
        |http: &MockHttp| {
            http.respond(502, "");
        },
    ];
    for fail in cases {
        let h = harness();
        fail(&h.http);
        h.room.load_history().await;
        h.room.with_state(|s| {
            assert!(s.history_loaded);
            assert!(s.timeline.is_empty());
            assert!(!s.timeline.has_more());
        });
    }
}

// =========================================================
// 发送与回显
// =========================================================

#[tokio::test]
async fn test_send_is_optimistic_and_echo_collapses() {
    let h = harness();
    assert!(!h.room.send("   "));
    assert!(h.room.send("hello"));
    assert_eq!(ids(&h.room), vec!["<pending>"]);

    let Some(ClientEvent::ChatMessage(outgoing)) = h.sink.events().last().cloned() else {
        panic!("chatMessage was not emitted");
    };
    let mut echo = serde_json::to_value(&outgoing).unwrap();
    echo["_id"] = "s1".into();
    echo["sender"] = serde_json::json!({"_id": "me"});
    h.room
        .on_event(ServerEvent::ChatMessage(serde_json::from_value(echo).unwrap()));

    assert_eq!(ids(&h.room), vec!["s1"]);
}

#[tokio::test]
async fn test_send_clears_reply_target() {
    let h = harness();
    h.room.on_event(incoming("p1", "peer", 1_000));
    let target = h.room.with_state(|s| s.timeline.find("p1").cloned());
    h.room.set_reply(target);

    assert!(h.room.send("replying"));
    assert!(h.room.with_state(|s| s.reply_to.is_none()));
    let Some(ClientEvent::ChatMessage(outgoing)) = h.sink.events().last().cloned() else {
        panic!("chatMessage was not emitted");
    };
    assert_eq!(outgoing.reply_to.as_deref(), Some("p1"));
}

#[tokio::test]
async fn test_peer_messages_append_and_duplicates_are_ignored() {
    let h = harness();
    h.room.on_event(incoming("p1", "peer", 1_000));
    h.room.on_event(incoming("p1", "peer", 1_000));
    h.room.on_event(incoming("p2", "peer", 2_000));
    assert_eq!(ids(&h.room), vec!["p1", "p2"]);
}

// =========================================================
// 删除
// =========================================================

#[tokio::test]
async fn test_delete_removes_and_broadcasts() {
    let h = harness();
    h.room.on_event(incoming("m1", "me", 1_000));
    h.http.respond(200, r#"{"message":"deleted"}"#);

    h.room.delete("m1").await.unwrap();
    assert!(ids(&h.room).is_empty());
    assert_eq!(
        h.sink.events().last(),
        Some(&ClientEvent::DeleteMessage {
            message_id: "m1".into(),
            room: PUBLIC_ROOM.into()
        })
    );
    assert!(h.http.last_request().url.ends_with("/chat/messages/m1"));
}

#[tokio::test]
async fn test_failed_delete_keeps_message() {
    let h = harness();
    h.room.on_event(incoming("m1", "me", 1_000));
    h.http.respond(403, "");
    let emitted = h.sink.events().len();

    let err = h.room.delete("m1").await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Forbidden));
    assert_eq!(ids(&h.room), vec!["m1"]);
    assert_eq!(h.sink.events().len(), emitted);
}

#[tokio::test]
async fn test_peer_deletion_is_idempotent() {
    let h = harness();
    h.room.on_event(incoming("m1", "peer", 1_000));
    h.room.on_event(ServerEvent::MessageDeleted("m1".into()));
    h.room.on_event(ServerEvent::MessageDeleted("m1".into()));
    h.room.on_event(ServerEvent::MessageDeleted("never-held".into()));
    assert!(ids(&h.room).is_empty());
}

// =========================================================
// 向前翻页
// =========================================================

#[tokio::test]
async fn test_load_more_prepends_with_cursor() {
    let h = harness();
    h.http.respond(200, &page_json("new", CHAT_PAGE_SIZE, 100_000));
    h.room.load_history().await;

    h.http.respond(200, &page_json("old", 2, 1_000));
    assert!(h.room.load_more().await);

    let held = ids(&h.room);
    assert_eq!(held.len(), CHAT_PAGE_SIZE + 2);
    assert_eq!(&held[..2], ["old0", "old1"]);
    assert_eq!(held[2], "new0");
    assert!(!h.room.with_state(|s| s.timeline.has_more()));

    let before = Timestamp::from_millis(100_000).to_cursor();
    assert!(h.http.last_request().query.contains(&("before".to_string(), before)));

    // 没有更多历史时不再请求
    assert!(!h.room.load_more().await);
    assert_eq!(h.http.request_count(), 2);
}

#[tokio::test]
async fn test_load_more_failure_only_clears_flag() {
    let h = harness();
    h.http.respond(200, &page_json("new", CHAT_PAGE_SIZE, 100_000));
    h.room.load_history().await;
    h.http.fail(ApiError::network());

    assert!(h.room.load_more().await);
    h.room.with_state(|s| {
        assert_eq!(s.timeline.len(), CHAT_PAGE_SIZE);
        assert!(s.timeline.has_more());
        assert!(!s.timeline.is_loading_more());
    });
}

// =========================================================
// 输入提示
// =========================================================

#[tokio::test]
async fn test_typing_is_throttled_and_remote_expiry_uses_generation() {
    let h = harness();
    h.room.on_input(10_000);
    h.room.on_input(10_500);
    h.room.on_input(11_000);
    let typing: Vec<_> = h
        .sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, ClientEvent::UserTyping(_)))
        .collect();
    assert_eq!(typing.len(), 2);

    assert_eq!(h.room.on_event(ServerEvent::UserTyping("me".into())), None);
    let first = h.room.on_event(ServerEvent::UserTyping("peer".into())).unwrap();
    let second = h.room.on_event(ServerEvent::UserTyping("peer".into())).unwrap();
    assert!(!h.room.expire_typing(first));
    assert!(h.room.with_state(|s| s.typing.is_active()));
    assert!(h.room.expire_typing(second));
    assert!(!h.room.with_state(|s| s.typing.is_active()));
}

#[tokio::test]
async fn test_detached_room_drops_events() {
    let h = harness();
    h.room.detach();
    assert!(h.room.send("after unmount"));
    assert_eq!(h.sink.events().len(), 1);
}
