//! AI 助手页面：学生作业助手、家长助手
//!
//! 两者界面相同，只是调用的端点与文案不同。

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::use_api_handle;
use crate::components::icons::{Send, Sparkles};
use crate::components::layout::AppLayout;
use crate::error::ApiResult;
use crate::session::use_session;

const NO_ANSWER: &str = "Sorry, I could not find an answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantKind {
    Homework,
    Parent,
}

impl AssistantKind {
    fn title(&self) -> &'static str {
        match self {
            AssistantKind::Homework => "Homework Helper",
            AssistantKind::Parent => "AI Assistant",
        }
    }

    fn placeholder(&self) -> &'static str {
        match self {
            AssistantKind::Homework => "Ask your homework question...",
            AssistantKind::Parent => "e.g., How can I help my child with homework?",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
struct Exchange {
    id: usize,
    speaker: Speaker,
    text: String,
    failed: bool,
}

/// 把接口结果转成展示文本，失败时标记为错误气泡
fn reply_text(result: ApiResult<Option<String>>) -> (String, bool) {
    match result {
        Ok(Some(answer)) if !answer.trim().is_empty() => (answer, false),
        Ok(_) => (NO_ANSWER.to_string(), false),
        Err(e) => (format!("Error: {}", e.user_message()), true),
    }
}

#[component]
pub fn AssistantPage(kind: AssistantKind) -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();

    let (input, set_input) = signal(String::new());
    let (loading, set_loading) = signal(false);
    let exchanges = RwSignal::new(Vec::<Exchange>::new());

    let push = move |speaker: Speaker, text: String, failed: bool| {
        exchanges.update(|list| {
            let id = list.len();
            list.push(Exchange { id, speaker, text, failed });
        });
    };

    let ask = move || {
        let question = input.get_untracked().trim().to_string();
        if question.is_empty() || loading.get_untracked() {
            return;
        }
        let Some(token) = session.token_untracked() else {
            return;
        };
        push(Speaker::User, question.clone(), false);
        set_input.set(String::new());
        set_loading.set(true);

        let api = api.get_value();
        spawn_local(async move {
            let result = match kind {
                AssistantKind::Homework => api.homework_chat(&question, Some(&token)).await,
                AssistantKind::Parent => api.parent_assistant(&question, Some(&token)).await,
            };
            if let Err(e) = &result {
                log::warn!("[Assistant] {:?} request failed: {}", kind, e);
            }
            let (text, failed) = reply_text(result);
            push(Speaker::Assistant, text, failed);
            set_loading.set(false);
        });
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        ask();
    };

    view! {
        <AppLayout title=kind.title()>
            <div class="card bg-base-100 shadow max-w-3xl">
                <div class="card-body">
                    <div class="flex flex-col gap-3 min-h-[20rem] max-h-[60vh] overflow-y-auto">
                        <Show when=move || exchanges.with(Vec::is_empty)>
                            <div class="flex flex-col items-center justify-center flex-1 opacity-60 gap-2 py-12">
                                <Sparkles attr:class="h-10 w-10" />
                                <p>"Ask a question to get started."</p>
                            </div>
                        </Show>
                        <For
                            each=move || exchanges.get()
                            key=|e| e.id
                            children=|e| {
                                let (side, bubble) = match (e.speaker, e.failed) {
                                    (Speaker::User, _) => ("chat chat-end", "chat-bubble chat-bubble-primary"),
                                    (Speaker::Assistant, true) => ("chat chat-start", "chat-bubble chat-bubble-error"),
                                    (Speaker::Assistant, false) => ("chat chat-start", "chat-bubble"),
                                };
                                view! {
                                    <div class=side>
                                        <div class=format!("{} whitespace-pre-wrap", bubble)>{e.text}</div>
                                    </div>
                                }
                            }
                        />
                        <Show when=move || loading.get()>
                            <div class="chat chat-start">
                                <div class="chat-bubble">
                                    <span class="loading loading-dots loading-sm"></span>
                                </div>
                            </div>
                        </Show>
                    </div>

                    <form class="join w-full mt-4" on:submit=on_submit>
                        <input
                            type="text"
                            class="input input-bordered join-item flex-1"
                            placeholder=kind.placeholder()
                            on:input=move |ev| set_input.set(event_target_value(&ev))
                            prop:value=input
                            disabled=move || loading.get()
                        />
                        <button type="submit" class="btn btn-primary join-item" disabled=move || loading.get()>
                            <Send attr:class="h-4 w-4" />
                        </button>
                    </form>
                </div>
            </div>
        </AppLayout>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn reply_text_covers_answer_blank_and_error() {
        assert_eq!(reply_text(Ok(Some("42".into()))), ("42".to_string(), false));
        assert_eq!(reply_text(Ok(None)), (NO_ANSWER.to_string(), false));
        assert_eq!(reply_text(Ok(Some("  ".into()))), (NO_ANSWER.to_string(), false));

        let (text, failed) = reply_text(Err(ApiError::timeout()));
        assert!(failed);
        assert_eq!(text, "Error: Request timed out. Please try again.");
    }
}
