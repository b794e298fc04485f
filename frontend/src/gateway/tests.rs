use super::*;
use crate::error::ApiErrorStatus;
use crate::test_support::{BASE_URL, MockHttp};
use schoolhub_shared::protocol::{
    Ack, AutoVerifyOAuthRequest, ChatMessagesRequest, DeleteMessageRequest, LoginRequest,
    ProfileRequest, RefreshRequest, timeouts,
};
use std::cell::Cell;

// =========================================================
// 辅助函数
// =========================================================

fn gateway_with_hook(http: &MockHttp) -> (Gateway<MockHttp>, Rc<Cell<u32>>) {
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    let gateway = Gateway::new(http.clone(), format!("{BASE_URL}/"))
        .with_unauthorized_hook(move || counter.set(counter.get() + 1));
    (gateway, fired)
}

fn login() -> LoginRequest {
    LoginRequest {
        email: "a@school.test".into(),
        password: "secret".into(),
    }
}

// =========================================================
// 请求组装
// =========================================================

#[tokio::test]
async fn test_authenticated_get_carries_bearer_and_query() {
    let http = MockHttp::new();
    http.respond(200, r#"{"messages":[]}"#);
    let (gateway, _) = gateway_with_hook(&http);

    let request = ChatMessagesRequest {
        room: "public".into(),
        with_user: None,
        before: Some("2024-05-01T08:30:00.000Z".into()),
    };
    let page = gateway.call(&request, Some("tok")).await.unwrap();
    assert!(page.messages.is_empty());

    let sent = http.last_request();
    assert_eq!(sent.url, "https://api.school.test/api/chat/messages");
    assert_eq!(sent.method, HttpMethod::Get);
    assert_eq!(sent.header_value("Authorization"), Some("Bearer tok"));
    assert_eq!(sent.header_value("Content-Type"), None);
    assert!(sent.body.is_none());
    assert_eq!(
        sent.query,
        vec![
            ("room".to_string(), "public".to_string()),
            ("before".to_string(), "2024-05-01T08:30:00.000Z".to_string()),
        ]
    );
    assert_eq!(sent.timeout, Some(timeouts::CHAT_HISTORY));
}

#[tokio::test]
async fn test_public_post_sends_json_without_token() {
    let http = MockHttp::new();
    http.respond(
        200,
        r#"{"user":{"_id":"u1","fullName":"Ada","role":"Teacher","isVerified":true},"accessToken":"a1","refreshToken":"r1"}"#,
    );
    let (gateway, _) = gateway_with_hook(&http);

    let auth = gateway.call(&login(), None).await.unwrap();
    assert_eq!(auth.user.id, "u1");
    assert_eq!(auth.access_token, "a1");

    let sent = http.last_request();
    assert_eq!(sent.header_value("Authorization"), None);
    assert_eq!(sent.header_value("Content-Type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(sent.json_body().unwrap()).unwrap();
    assert_eq!(body["email"], "a@school.test");
}

#[tokio::test]
async fn test_unit_request_body_is_empty_object() {
    let http = MockHttp::new();
    http.respond(200, r#"{"message":"verified"}"#);
    let (gateway, _) = gateway_with_hook(&http);

    gateway
        .call(&AutoVerifyOAuthRequest, Some("tok"))
        .await
        .unwrap();
    assert_eq!(http.last_request().json_body(), Some("{}"));
}

#[tokio::test]
async fn test_missing_token_fails_before_sending() {
    let http = MockHttp::new();
    let (gateway, fired) = gateway_with_hook(&http);

    let err = gateway.call(&ProfileRequest, None).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::NotAuthenticated));
    assert_eq!(http.request_count(), 0);
    assert_eq!(fired.get(), 0);
}

// =========================================================
// 状态映射
// =========================================================

#[tokio::test]
async fn test_401_on_authenticated_call_fires_hook() {
    let http = MockHttp::new();
    http.respond(401, r#"{"error":"jwt expired"}"#);
    let (gateway, fired) = gateway_with_hook(&http);

    let err = gateway.call(&ProfileRequest, Some("stale")).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Unauthorized));
    assert_eq!(err.user_message(), "Session expired. Please log in again.");
    assert_eq!(fired.get(), 1);
}

#[tokio::test]
async fn test_401_on_public_or_quiet_call_does_not_fire_hook() {
    let http = MockHttp::new();
    http.respond(401, r#"{"error":"Invalid credentials"}"#)
        .respond(401, "")
        .respond(401, "");
    let (gateway, fired) = gateway_with_hook(&http);

    let err = gateway.call(&login(), None).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Unauthorized));

    let refresh = RefreshRequest {
        refresh_token: "r".into(),
    };
    gateway.call(&refresh, None).await.unwrap_err();
    gateway
        .call_quietly(&ProfileRequest, Some("stale"))
        .await
        .unwrap_err();
    assert_eq!(fired.get(), 0);
}

#[tokio::test]
async fn test_status_mapping_and_backend_messages() {
    let http = MockHttp::new();
    http.respond(403, r#"{"error":"nope"}"#)
        .respond(429, "")
        .respond(500, "boom")
        .respond(409, r#"{"message":"Already exists"}"#);
    let (gateway, _) = gateway_with_hook(&http);
    let delete = DeleteMessageRequest { id: "m1".into() };

    let mut statuses = Vec::new();
    for _ in 0..3 {
        statuses.push(gateway.call(&delete, Some("tok")).await.unwrap_err().status);
    }
    assert_eq!(
        statuses,
        vec![
            ApiErrorStatus::Forbidden,
            ApiErrorStatus::RateLimited,
            ApiErrorStatus::Server
        ]
    );

    let err = gateway.call(&delete, Some("tok")).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Rejected));
    assert_eq!(err.user_message(), "Already exists");
    assert!(err.to_string().contains("/chat/messages/m1"));
}

#[tokio::test]
async fn test_transport_errors_pass_through() {
    let http = MockHttp::new();
    http.fail(ApiError::timeout()).fail(ApiError::network());
    let (gateway, fired) = gateway_with_hook(&http);

    let err = gateway.call(&ProfileRequest, Some("t")).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Timeout));
    assert_eq!(err.user_message(), "Request timed out. Please try again.");

    let err = gateway.call(&ProfileRequest, Some("t")).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Network));
    assert_eq!(fired.get(), 0);
}

// =========================================================
// 响应解析
// =========================================================

#[tokio::test]
async fn test_empty_body_is_ack_but_parse_error_for_typed_responses() {
    let http = MockHttp::new();
    http.respond(204, "").respond(200, "  ").respond(200, "{not json");
    let (gateway, _) = gateway_with_hook(&http);

    let delete = DeleteMessageRequest { id: "m1".into() };
    assert_eq!(gateway.call(&delete, Some("tok")).await.unwrap(), Ack);

    let err = gateway.call(&login(), None).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Parse));
    assert!(err.is_empty_body());

    let err = gateway.call(&login(), None).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Parse));
    assert!(!err.is_empty_body());
    assert_eq!(err.user_message(), "Response parsing failed, please retry.");
}
