use super::*;
use crate::test_support::{BASE_URL, MockHttp};
use schoolhub_shared::LessonPlanStatus;

// =========================================================
// 辅助函数
// =========================================================

fn api(http: &MockHttp) -> Api<MockHttp> {
    Api::new(Rc::new(Gateway::new(http.clone(), BASE_URL)))
}

fn plan_json(id: &str, status: &str) -> String {
    format!(r#"{{"lessonPlan":{{"_id":"{id}","title":"Fractions Intro","status":"{status}"}}}}"#)
}

fn paths(http: &MockHttp) -> Vec<String> {
    http.requests()
        .into_iter()
        .map(|r| r.url.trim_start_matches(BASE_URL).to_string())
        .collect()
}

// =========================================================
// 作业助手
// =========================================================

#[tokio::test]
async fn test_homework_chat_retries_once_on_malformed_body() {
    let http = MockHttp::new();
    http.respond(200, "<html>gateway</html>")
        .respond(200, r#"{"answer":"1/2 + 1/4 = 3/4"}"#);

    let answer = api(&http)
        .homework_chat("what is 1/2 + 1/4?", Some("tok"))
        .await
        .unwrap();
    assert_eq!(answer.as_deref(), Some("1/2 + 1/4 = 3/4"));
    assert_eq!(http.request_count(), 2);
}

#[tokio::test]
async fn test_homework_chat_does_not_retry_empty_body_or_http_errors() {
    let http = MockHttp::new();
    http.respond(200, "").respond(429, "");
    let api = api(&http);

    let err = api.homework_chat("q", Some("tok")).await.unwrap_err();
    assert!(err.is_empty_body());
    assert_eq!(http.request_count(), 1);

    let err = api.homework_chat("q", Some("tok")).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::RateLimited));
    assert_eq!(http.request_count(), 2);
}

#[tokio::test]
async fn test_homework_chat_second_failure_is_returned() {
    let http = MockHttp::new();
    http.respond(200, "{oops").respond(200, "{oops again");

    let err = api(&http).homework_chat("q", Some("tok")).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Parse));
    assert_eq!(http.request_count(), 2);
}

#[tokio::test]
async fn test_parent_assistant_never_retries() {
    let http = MockHttp::new();
    http.respond(200, "{oops");

    let err = api(&http).parent_assistant("q", Some("tok")).await.unwrap_err();
    assert!(err.is(ApiErrorStatus::Parse));
    let sent = http.last_request();
    assert!(sent.url.ends_with("/parent/ai-assistant"));
    assert_eq!(sent.timeout, Some(timeouts::PARENT_ASSISTANT));
}

// =========================================================
// 教案状态迁移
// =========================================================

#[tokio::test]
async fn test_submit_shows_server_returned_plan() {
    let http = MockHttp::new();
    http.respond(200, &plan_json("lp1", "pending"));

    let outcome = api(&http)
        .apply_plan_action("lp1", PlanCommand::Submit, Role::Teacher, Some("tok"))
        .await;
    assert!(outcome.error.is_none());
    assert_eq!(outcome.plan.unwrap().status, LessonPlanStatus::Pending);
    assert_eq!(paths(&http), vec!["/teacher/lesson-plans/lp1/submit"]);
}

#[tokio::test]
async fn test_rejected_transition_refetches_actual_state() {
    let http = MockHttp::new();
    http.respond(400, r#"{"error":"Lesson plan already accepted"}"#)
        .respond(200, r#"{"_id":"lp1","status":"accepted"}"#);

    let outcome = api(&http)
        .apply_plan_action("lp1", PlanCommand::Accept, Role::Department, Some("tok"))
        .await;
    assert_eq!(
        outcome.error.unwrap().user_message(),
        "Lesson plan already accepted"
    );
    assert_eq!(outcome.plan.unwrap().status, LessonPlanStatus::Accepted);
    assert_eq!(
        paths(&http),
        vec![
            "/department/lesson-plans/lp1/accept",
            "/department/lesson-plans/lp1"
        ]
    );
}

#[tokio::test]
async fn test_incomplete_response_triggers_refetch() {
    let http = MockHttp::new();
    http.respond(200, r#"{"message":"submitted"}"#)
        .respond(200, &plan_json("lp1", "pending"));

    let outcome = api(&http)
        .apply_plan_action("lp1", PlanCommand::Submit, Role::Teacher, Some("tok"))
        .await;
    assert!(outcome.error.is_none());
    assert_eq!(outcome.plan.unwrap().id, "lp1");
    assert_eq!(http.request_count(), 2);
    assert!(http.last_request().url.ends_with("/teacher/lesson-plans/lp1"));
}

#[tokio::test]
async fn test_reject_requires_reason_and_sends_highlight() {
    let http = MockHttp::new();
    let api = api(&http);

    let blank = PlanCommand::Reject {
        reason: "   ".into(),
        highlighted_text: None,
    };
    let outcome = api
        .apply_plan_action("lp1", blank, Role::Department, Some("tok"))
        .await;
    assert!(outcome.error.is_some());
    assert!(outcome.plan.is_none());
    assert_eq!(http.request_count(), 0);

    http.respond(200, &plan_json("lp1", "rejected"));
    let reject = PlanCommand::Reject {
        reason: "Objectives are missing".into(),
        highlighted_text: Some("Students will learn".into()),
    };
    let outcome = api
        .apply_plan_action("lp1", reject, Role::Department, Some("tok"))
        .await;
    assert_eq!(outcome.plan.unwrap().status, LessonPlanStatus::Rejected);

    let body: serde_json::Value =
        serde_json::from_str(http.last_request().json_body().unwrap()).unwrap();
    assert_eq!(body["reason"], "Objectives are missing");
    assert_eq!(body["highlightedText"], "Students will learn");
}

#[tokio::test]
async fn test_failed_refetch_leaves_plan_empty() {
    let http = MockHttp::new();
    http.fail(ApiError::network()).fail(ApiError::network());

    let outcome = api(&http)
        .apply_plan_action("lp1", PlanCommand::Submit, Role::Teacher, Some("tok"))
        .await;
    assert!(outcome.error.unwrap().is(ApiErrorStatus::Network));
    assert!(outcome.plan.is_none());
}

#[tokio::test]
async fn test_fractions_intro_review_cycle() {
    let http = MockHttp::new();
    http.respond(200, &plan_json("lp1", "pending"))
        .respond(200, &plan_json("lp1", "rejected"))
        .respond(200, &plan_json("lp1", "pending"));
    let api = api(&http);

    let mut status = LessonPlanStatus::Draft;
    let steps = [
        (PlanCommand::Submit, Role::Teacher),
        (
            PlanCommand::Reject {
                reason: "Add worked examples".into(),
                highlighted_text: Some("Introduce fractions".into()),
            },
            Role::Department,
        ),
        (PlanCommand::Submit, Role::Teacher),
    ];
    for (command, role) in steps {
        let expected = status.next(command.action()).unwrap();
        let outcome = api.apply_plan_action("lp1", command, role, Some("tok")).await;
        status = outcome.plan.unwrap().status;
        assert_eq!(status, expected);
    }
    assert_eq!(status, LessonPlanStatus::Pending);
}
