use super::*;
use crate::error::ApiError;
use crate::test_support::{BASE_URL, MockHttp, identity};
use crate::web::storage::MemoryStore;
use schoolhub_shared::Role;
use schoolhub_shared::theme::presets;

fn theme_store(http: &MockHttp, store: &MemoryStore) -> ThemeStore<MemoryStore, MockHttp> {
    ThemeStore::new(store.clone(), Rc::new(Gateway::new(http.clone(), BASE_URL)))
}

fn teacher_session() -> Session {
    Session::authenticated(identity("u1", Role::Teacher), "tok".into(), None)
}

fn ocean() -> Theme {
    presets()
        .into_iter()
        .find(|t| !t.is_light())
        .expect("at least one dark preset")
}

#[tokio::test]
async fn test_load_prefers_server_theme_and_caches_it() {
    let http = MockHttp::new();
    let store = MemoryStore::new();
    let remote = ocean();
    http.respond(200, &serde_json::json!({ "theme": remote }).to_string());

    let themes = theme_store(&http, &store);
    let loaded = themes.load_for(&teacher_session()).await;
    assert_eq!(loaded, remote);
    assert_eq!(themes.read_local(Some("u1")), Some(remote));
    assert!(http.last_request().url.ends_with("/auth/user/theme"));
}

#[tokio::test]
async fn test_load_falls_back_to_local_then_default() {
    let http = MockHttp::new();
    let store = MemoryStore::new();
    let themes = theme_store(&http, &store);
    let cached = ocean();
    themes.write_local(Some("u1"), &cached);

    http.fail(ApiError::network());
    assert_eq!(themes.load_for(&teacher_session()).await, cached);

    http.respond(200, r#"{"theme":null}"#);
    assert_eq!(themes.load_for(&teacher_session()).await, cached);

    store.remove(&storage_key(Some("u1")));
    http.respond(500, "");
    assert_eq!(themes.load_for(&teacher_session()).await, Theme::default());
}

#[tokio::test]
async fn test_signed_out_uses_default_key_without_requests() {
    let http = MockHttp::new();
    let store = MemoryStore::new();
    let themes = theme_store(&http, &store);
    let cached = ocean();
    themes.write_local(None, &cached);

    assert_eq!(themes.load_for(&Session::signed_out()).await, cached);
    assert!(store.contains("app-theme-default"));
    assert_eq!(http.request_count(), 0);
}

#[tokio::test]
async fn test_save_writes_locally_even_when_server_fails() {
    let http = MockHttp::new();
    let store = MemoryStore::new();
    let themes = theme_store(&http, &store);
    let chosen = ocean();
    http.respond(503, "");

    themes.save(&teacher_session(), chosen.clone()).await;
    assert_eq!(themes.read_local(Some("u1")), Some(chosen.clone()));

    let sent = http.last_request();
    assert_eq!(sent.method, schoolhub_shared::HttpMethod::Put);
    let body: serde_json::Value = serde_json::from_str(sent.json_body().unwrap()).unwrap();
    assert_eq!(body["theme"]["name"], chosen.name.as_str());
}

#[tokio::test]
async fn test_save_signed_out_stays_local() {
    let http = MockHttp::new();
    let store = MemoryStore::new();
    let themes = theme_store(&http, &store);

    themes.save(&Session::signed_out(), ocean()).await;
    assert_eq!(themes.read_local(None), Some(ocean()));
    assert_eq!(http.request_count(), 0);
}

#[tokio::test]
async fn test_unreadable_cache_is_ignored() {
    let http = MockHttp::new();
    let store = MemoryStore::new();
    store.set(&storage_key(None), "not json");

    let themes = theme_store(&http, &store);
    assert_eq!(themes.load_for(&Session::signed_out()).await, Theme::default());
}
