use super::*;

// =========================================================
// 辅助函数
// =========================================================

const ME: &str = "u-me";
const PEER: &str = "u-peer";

fn sender(id: &str) -> SenderSnapshot {
    SenderSnapshot {
        id: id.to_string(),
        full_name: format!("User {id}"),
        email: format!("{id}@school.test"),
        profile_picture: None,
    }
}

fn confirmed(id: &str, from: &str, ms: i64) -> ChatMessage {
    ChatMessage {
        server_id: Some(id.to_string()),
        client_id: None,
        local_id: 0,
        sender: Some(sender(from)),
        content: format!("message {id}"),
        timestamp: Timestamp::from_millis(ms),
        room: crate::PUBLIC_ROOM.to_string(),
        reply_to: None,
    }
}

fn page(prefix: &str, count: usize, start_ms: i64) -> Vec<ChatMessage> {
    (0..count)
        .map(|i| confirmed(&format!("{prefix}{i}"), PEER, start_ms + i as i64))
        .collect()
}

fn ids(timeline: &ChatTimeline) -> Vec<String> {
    timeline
        .messages()
        .iter()
        .map(|m| m.server_id.clone().unwrap_or_else(|| "<pending>".into()))
        .collect()
}

// =========================================================
// 发送与回显合并
// =========================================================

#[test]
fn test_blank_input_is_not_sent() {
    assert!(OutgoingMessage::new("   \n", "public", None).is_none());
    assert!(OutgoingMessage::new("", "public", None).is_none());
}

#[test]
fn test_echo_with_client_id_replaces_in_place() {
    let mut timeline = ChatTimeline::new();
    timeline.replace_history(page("h", 2, 1_000));

    let out = OutgoingMessage::new("hello", "public", None).unwrap();
    timeline.push_local(out.to_local(sender(ME), None));
    let key_before = timeline.messages()[2].key();

    let mut echo = out.to_local(sender(ME), None);
    echo.server_id = Some("s1".into());
    echo.reply_to = None;

    assert_eq!(timeline.apply_incoming(echo, Some(ME)), Reconciled::Confirmed);
    assert_eq!(timeline.len(), 3);
    assert_eq!(ids(&timeline), vec!["h0", "h1", "s1"]);
    // 渲染键保持不变
    assert_eq!(timeline.messages()[2].key(), key_before);
}

#[test]
fn test_echo_without_client_id_uses_timestamp_and_sender() {
    let mut timeline = ChatTimeline::new();
    let ts = Timestamp::from_millis(5_000);

    let mut first = confirmed("x", ME, 5_000);
    first.server_id = None;
    first.client_id = Some("c1".into());
    let mut second = first.clone();
    second.client_id = Some("c2".into());
    second.content = "second".into();
    timeline.push_local(first);
    timeline.push_local(second);

    let mut echo = confirmed("s1", ME, ts.as_millis());
    echo.content = "message x".into();
    assert_eq!(timeline.apply_incoming(echo, Some(ME)), Reconciled::Confirmed);

    // 最早的未确认条目被替换
    assert_eq!(ids(&timeline), vec!["s1", "<pending>"]);
    assert_eq!(timeline.messages()[1].content, "second");
}

#[test]
fn test_own_echo_without_match_is_appended() {
    let mut timeline = ChatTimeline::new();
    let echo = confirmed("s9", ME, 9_000);
    assert_eq!(timeline.apply_incoming(echo, Some(ME)), Reconciled::Appended);
    assert_eq!(timeline.len(), 1);
}

#[test]
fn test_peer_message_is_appended_even_with_same_timestamp() {
    let mut timeline = ChatTimeline::new();
    let mut local = confirmed("x", ME, 7_000);
    local.server_id = None;
    timeline.push_local(local);

    let peer = confirmed("p1", PEER, 7_000);
    assert_eq!(timeline.apply_incoming(peer, Some(ME)), Reconciled::Appended);
    assert_eq!(ids(&timeline), vec!["<pending>", "p1"]);
}

#[test]
fn test_null_sender_and_duplicates_are_ignored() {
    let mut timeline = ChatTimeline::new();
    timeline.replace_history(page("h", 3, 0));

    let mut anonymous = confirmed("z", PEER, 1);
    anonymous.sender = None;
    assert_eq!(timeline.apply_incoming(anonymous, Some(ME)), Reconciled::Ignored);

    let dup = confirmed("h1", PEER, 1);
    assert_eq!(timeline.apply_incoming(dup, Some(ME)), Reconciled::Ignored);
    assert_eq!(timeline.len(), 3);
}

// =========================================================
// 删除
// =========================================================

#[test]
fn test_remove_is_idempotent() {
    let mut timeline = ChatTimeline::new();
    timeline.replace_history(page("h", 3, 0));

    assert!(timeline.remove("h1"));
    assert!(!timeline.remove("h1"));
    assert!(!timeline.remove("never-held"));
    assert_eq!(ids(&timeline), vec!["h0", "h2"]);
}

#[test]
fn test_peer_deletion_event_removes_message() {
    let mut timeline = ChatTimeline::new();
    timeline.replace_history(page("h", 2, 0));

    let wire::Inbound::Event(ServerEvent::MessageDeleted(id)) = wire::decode(r#"42["messageDeleted","h0"]"#)
    else {
        panic!("unexpected event");
    };
    timeline.remove(&id);
    assert_eq!(ids(&timeline), vec!["h1"]);
}

// =========================================================
// 历史与翻页
// =========================================================

#[test]
fn test_full_first_page_keeps_has_more() {
    let mut timeline = ChatTimeline::new();
    timeline.replace_history(page("h", CHAT_PAGE_SIZE, 10_000));
    assert!(timeline.has_more());

    timeline.replace_history(page("h", 3, 10_000));
    assert!(!timeline.has_more());
}

#[test]
fn test_history_failure_clears_and_stops_paging() {
    let mut timeline = ChatTimeline::new();
    timeline.replace_history(page("h", CHAT_PAGE_SIZE, 0));
    timeline.fail_history();
    assert!(timeline.is_empty());
    assert!(!timeline.has_more());
    assert_eq!(timeline.begin_load_more(), None);
}

#[test]
fn test_load_more_guards() {
    let mut timeline = ChatTimeline::new();
    // 空列表不翻页
    assert_eq!(timeline.begin_load_more(), None);

    timeline.replace_history(page("h", CHAT_PAGE_SIZE, 1_714_552_200_000));
    let cursor = timeline.begin_load_more().unwrap();
    assert_eq!(cursor, "2024-05-01T08:30:00.000Z");
    assert!(timeline.is_loading_more());

    // 已在加载中
    assert_eq!(timeline.begin_load_more(), None);

    timeline.abort_load_more();
    assert!(!timeline.is_loading_more());
    assert!(timeline.has_more());
}

#[test]
fn test_older_page_skips_held_and_keeps_tail() {
    let mut timeline = ChatTimeline::new();
    timeline.replace_history(page("h", CHAT_PAGE_SIZE, 1_000));
    let tail_before: Vec<_> = timeline.messages().to_vec();

    timeline.begin_load_more().unwrap();
    let mut older = page("o", 4, 0);
    older.push(confirmed("h0", PEER, 1_000));
    timeline.prepend_older(older);

    assert_eq!(timeline.len(), CHAT_PAGE_SIZE + 4);
    assert_eq!(&ids(&timeline)[..4], &["o0", "o1", "o2", "o3"]);
    assert_eq!(&timeline.messages()[4..], tail_before.as_slice());
    assert!(!timeline.has_more());
    assert!(!timeline.is_loading_more());
}

#[test]
fn test_first_page_keeps_messages_that_arrived_while_loading() {
    let mut timeline = ChatTimeline::new();

    // 历史请求在途时：自己发送并被确认一条，对方一条，另有一条尚未回显
    let early = OutgoingMessage::new("early", "public", None).unwrap();
    timeline.push_local(early.to_local(sender(ME), None));
    let mut echo = early.to_local(sender(ME), None);
    echo.server_id = Some("s-early".into());
    assert_eq!(timeline.apply_incoming(echo, Some(ME)), Reconciled::Confirmed);
    timeline.apply_incoming(confirmed("s-peer", PEER, 9_000), Some(ME));
    let late = OutgoingMessage::new("late", "public", None).unwrap();
    timeline.push_local(late.to_local(sender(ME), None));
    let live_keys: Vec<String> = timeline.messages().iter().map(ChatMessage::key).collect();

    // 快照早于对方消息，但已包含了第一条回显
    let mut history = page("h", 3, 0);
    let mut known = early.to_local(sender(ME), None);
    known.server_id = Some("s-early".into());
    history.push(known);
    timeline.replace_history(history);

    assert_eq!(ids(&timeline), vec!["h0", "h1", "h2", "s-early", "s-peer", "<pending>"]);
    assert_eq!(timeline.messages()[4].key(), live_keys[1]);
    assert_eq!(timeline.messages()[5].key(), live_keys[2]);
    assert!(!timeline.has_more());

    // 未确认条目之后仍能按 clientId 合并
    let mut late_echo = late.to_local(sender(ME), None);
    late_echo.server_id = Some("s-late".into());
    assert_eq!(timeline.apply_incoming(late_echo, Some(ME)), Reconciled::Confirmed);
    assert_eq!(timeline.len(), 6);
}

#[test]
fn test_full_older_page_keeps_has_more() {
    let mut timeline = ChatTimeline::new();
    timeline.replace_history(page("h", CHAT_PAGE_SIZE, 100_000));
    timeline.begin_load_more().unwrap();
    timeline.prepend_older(page("o", CHAT_PAGE_SIZE, 0));
    assert!(timeline.has_more());
    assert_eq!(timeline.oldest_cursor(), Some(Timestamp::from_millis(0).to_cursor()));
}

// =========================================================
// 回复与事件编码
// =========================================================

#[test]
fn test_reply_ref_accepts_id_or_embedded_message() {
    let mut timeline = ChatTimeline::new();
    timeline.replace_history(page("h", 2, 0));

    let by_id: ChatMessage = serde_json::from_str(
        r#"{"_id":"r1","sender":{"_id":"u-peer","fullName":"P"},"content":"re","timestamp":"2024-05-01T08:30:00.000Z","room":"public","replyTo":"h1"}"#,
    )
    .unwrap();
    let reply = by_id.reply_to.as_ref().unwrap();
    assert_eq!(timeline.resolve_reply(reply).unwrap().server_id.as_deref(), Some("h1"));

    let embedded: ChatMessage = serde_json::from_str(
        r#"{"_id":"r2","sender":null,"content":"re","timestamp":"2024-05-01T08:30:00.000Z","replyTo":{"_id":"zz","content":"quoted","timestamp":"2024-05-01T08:00:00.000Z"}}"#,
    )
    .unwrap();
    let reply = embedded.reply_to.as_ref().unwrap();
    assert_eq!(timeline.resolve_reply(reply).unwrap().content, "quoted");
}

#[test]
fn test_client_events_use_envelopes() {
    let join = serde_json::to_value(ClientEvent::JoinRoom("public".into())).unwrap();
    assert_eq!(join, serde_json::json!({"event": "joinRoom", "data": "public"}));

    let deleted = serde_json::to_value(ClientEvent::DeleteMessage {
        message_id: "m1".into(),
        room: "public".into(),
    })
    .unwrap();
    assert_eq!(
        deleted,
        serde_json::json!({"event": "deleteMessage", "data": {"messageId": "m1", "room": "public"}})
    );

    let out = OutgoingMessage::new("hi", "public", None).unwrap();
    let sent = serde_json::to_value(ClientEvent::ChatMessage(out.clone())).unwrap();
    assert_eq!(sent["event"], "chatMessage");
    assert_eq!(sent["data"]["clientId"], out.client_id.as_str());
    assert!(sent["data"]["replyTo"].is_null());
}

// =========================================================
// 输入提示
// =========================================================

#[test]
fn test_typing_indicator_generations() {
    let mut typing = TypingIndicator::default();
    assert_eq!(typing.on_remote(ME, Some(ME)), None);
    assert!(!typing.is_active());

    let first = typing.on_remote(PEER, Some(ME)).unwrap();
    let second = typing.on_remote(PEER, Some(ME)).unwrap();
    assert!(typing.is_active());

    // 旧的过期回调不生效
    assert!(!typing.expire(first));
    assert!(typing.is_active());
    assert!(typing.expire(second));
    assert!(!typing.is_active());
}

#[test]
fn test_typing_emit_is_throttled() {
    let mut typing = TypingIndicator::default();
    assert!(typing.should_emit(0));
    assert!(!typing.should_emit(500));
    assert!(!typing.should_emit(999));
    assert!(typing.should_emit(1_000));
}
