//! 教案新建/编辑页
//!
//! 三种录入方式共用一个 [`FormState`]：AI 生成的结果回填到手动表单，
//! 由教师确认后保存；上传则直接由服务端创建教案。

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::{
    CreateLessonPlanRequest, GenerateAiLessonPlanRequest, UpdateLessonPlanRequest,
};
use schoolhub_shared::Role;

use super::LESSON_PLANNER_PATH;
use super::form_state::{EntryMode, FormState};
use crate::api::use_api_handle;
use crate::components::common::{ErrorAlert, Spinner, SubmitButton, SuccessAlert};
use crate::components::icons::Sparkles;
use crate::components::layout::AppLayout;
use crate::components::signup::{GradeSelect, SubjectSelect};
use crate::error::{ApiError, ApiErrorStatus};
use crate::session::use_session;
use crate::web::router::{Link, use_router};

/// AI 生成失败时的提示文案
fn ai_error_message(err: &ApiError) -> String {
    let raw = err.user_message();
    let lower = raw.to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if mentions(&["quota", "billing"]) {
        "AI service quota exceeded. Please try again later or contact administrator.".to_string()
    } else if mentions(&["payment", "402"]) {
        "AI service payment required. Please contact administrator.".to_string()
    } else if mentions(&["api key", "unauthorized"]) {
        "AI service configuration issue. Please contact administrator.".to_string()
    } else if err.is(ApiErrorStatus::Network) || err.is(ApiErrorStatus::Timeout) {
        raw.to_string()
    } else if mentions(&["service not available"]) {
        "AI services are currently unavailable. Please try manual creation or contact administrator."
            .to_string()
    } else {
        raw.to_string()
    }
}

#[component]
pub fn LessonPlanFormPage(#[prop(optional)] id: Option<String>) -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let api = use_api_handle();

    let form = FormState::new(session.identity().as_ref());
    let editing = id.is_some();
    let (loading, set_loading) = signal(editing);
    let (saving, set_saving) = signal(false);
    let (generating, set_generating) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (message, set_message) = signal(Option::<String>::None);
    let file_ref = NodeRef::<leptos::html::Input>::new();

    if let (Some(plan_id), Some(token)) = (id.clone(), session.token_untracked()) {
        let api = api.get_value();
        spawn_local(async move {
            match api.lesson_plan(&plan_id, Role::Teacher, Some(&token)).await {
                Ok(plan) => form.fill_from_plan(&plan),
                Err(e) => {
                    log::warn!("[LessonPlanForm] load {} failed: {}", plan_id, e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_loading.set(false);
        });
    }

    let plan_id = StoredValue::new(id);

    let on_save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(message) => {
                set_error_msg.set(Some(message));
                return;
            }
        };
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_saving.set(true);
        set_error_msg.set(None);

        let api = api.get_value();
        let id = plan_id.get_value();
        spawn_local(async move {
            let result = match id {
                Some(id) => api.call(&UpdateLessonPlanRequest { id, draft }, Some(&token)).await,
                None => api.call(&CreateLessonPlanRequest(draft), Some(&token)).await,
            };
            match result {
                Ok(_) => router.navigate(LESSON_PLANNER_PATH),
                Err(e) => {
                    set_error_msg.set(Some(e.user_message().to_string()));
                    set_saving.set(false);
                }
            }
        });
    };

    let on_generate = move |_| {
        let topic = form.topic.get_untracked().trim().to_string();
        if topic.is_empty() {
            set_error_msg.set(Some("Please enter a topic.".to_string()));
            return;
        }
        let Some(token) = session.token_untracked() else {
            return;
        };
        let request = GenerateAiLessonPlanRequest {
            grade: form.grade.get_untracked(),
            topic,
            subject: form.subject.get_untracked(),
        };
        set_generating.set(true);
        set_error_msg.set(None);
        set_message.set(None);

        let api = api.get_value();
        spawn_local(async move {
            match api.call(&request, Some(&token)).await {
                Ok(generated) => {
                    log::info!("[LessonPlanForm] AI plan generated for '{}'", request.topic);
                    form.fill_from_generated(generated);
                    form.mode.set(EntryMode::Manual);
                    set_message.set(Some("Lesson plan generated. Review it and save.".to_string()));
                }
                Err(e) => {
                    log::warn!("[LessonPlanForm] AI generation failed: {}", e);
                    set_error_msg.set(Some(ai_error_message(&e)));
                }
            }
            set_generating.set(false);
        });
    };

    let on_upload = move |_| {
        let meta = match form.to_upload_meta() {
            Ok(meta) => meta,
            Err(message) => {
                set_error_msg.set(Some(message));
                return;
            }
        };
        let file = file_ref
            .get_untracked()
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        let Some(file) = file else {
            set_error_msg.set(Some("Please choose a file to upload.".to_string()));
            return;
        };
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_saving.set(true);
        set_error_msg.set(None);

        let api = api.get_value();
        spawn_local(async move {
            match api.upload_lesson_plan(&file, &meta, Some(&token)).await {
                Ok(plan) => {
                    log::info!("[LessonPlanForm] uploaded lesson plan {}", plan.id);
                    router.navigate(LESSON_PLANNER_PATH);
                }
                Err(e) => {
                    set_error_msg.set(Some(e.user_message().to_string()));
                    set_saving.set(false);
                }
            }
        });
    };

    let title = if editing { "Edit Lesson Plan" } else { "Create Lesson Plan" };
    // 编辑时不提供上传
    let modes: Vec<EntryMode> = EntryMode::ALL
        .into_iter()
        .filter(|m| !(editing && *m == EntryMode::Upload))
        .collect();

    view! {
        <AppLayout title=title>
            <Show when=move || !loading.get() fallback=|| view! { <Spinner label="Loading lesson plan..." /> }>
                <div class="card bg-base-100 shadow max-w-3xl">
                    <div class="card-body gap-4">
                        <div role="tablist" class="tabs tabs-boxed w-fit">
                            {modes.iter().map(|&mode| view! {
                                <a
                                    role="tab"
                                    class="tab"
                                    class:tab-active=move || form.mode.get() == mode
                                    on:click=move |_| form.mode.set(mode)
                                >
                                    {mode.label()}
                                </a>
                            }).collect_view()}
                        </div>

                        <ErrorAlert message=error_msg />
                        <SuccessAlert message=message />

                        {move || match form.mode.get() {
                            EntryMode::Manual => view! {
                                <form class="flex flex-col gap-3" on:submit=on_save>
                                    <input
                                        type="text"
                                        placeholder="Title"
                                        class="input input-bordered"
                                        on:input=move |ev| form.title.set(event_target_value(&ev))
                                        prop:value=form.title
                                    />
                                    <div class="grid grid-cols-1 sm:grid-cols-2 gap-3">
                                        <SubjectSelect value=form.subject />
                                        <GradeSelect value=form.grade />
                                    </div>
                                    <textarea
                                        placeholder="Description, objectives, activities..."
                                        class="textarea textarea-bordered min-h-60"
                                        on:input=move |ev| form.description.set(event_target_value(&ev))
                                        prop:value=form.description
                                    ></textarea>
                                    {move || form.generated.get().then(|| view! {
                                        <span class="badge badge-secondary">"AI generated"</span>
                                    })}
                                    <div class="flex justify-end gap-2">
                                        <Link to=LESSON_PLANNER_PATH class="btn btn-ghost">"Cancel"</Link>
                                        <SubmitButton busy=saving label="Save Lesson Plan" busy_label="Saving..." class="btn btn-primary" />
                                    </div>
                                </form>
                            }.into_any(),
                            EntryMode::Ai => view! {
                                <div class="flex flex-col gap-3">
                                    <div class="grid grid-cols-1 sm:grid-cols-2 gap-3">
                                        <SubjectSelect value=form.subject />
                                        <GradeSelect value=form.grade />
                                    </div>
                                    <input
                                        type="text"
                                        placeholder="Topic, e.g. Fractions"
                                        class="input input-bordered"
                                        on:input=move |ev| form.topic.set(event_target_value(&ev))
                                        prop:value=form.topic
                                    />
                                    <button class="btn btn-secondary" on:click=on_generate disabled=move || generating.get()>
                                        <Sparkles attr:class="h-4 w-4" />
                                        {move || if generating.get() { "Generating..." } else { "Generate with AI" }}
                                    </button>
                                </div>
                            }.into_any(),
                            EntryMode::Upload => view! {
                                <div class="flex flex-col gap-3">
                                    <div class="grid grid-cols-1 sm:grid-cols-2 gap-3">
                                        <SubjectSelect value=form.subject />
                                        <GradeSelect value=form.grade />
                                    </div>
                                    <input
                                        type="text"
                                        placeholder="Topic"
                                        class="input input-bordered"
                                        on:input=move |ev| form.topic.set(event_target_value(&ev))
                                        prop:value=form.topic
                                    />
                                    <input
                                        type="file"
                                        accept=".pdf,.doc,.docx,.txt"
                                        class="file-input file-input-bordered"
                                        node_ref=file_ref
                                    />
                                    <button class="btn btn-primary" on:click=on_upload disabled=move || saving.get()>
                                        {move || if saving.get() { "Uploading..." } else { "Upload" }}
                                    </button>
                                </div>
                            }.into_any(),
                        }}
                    </div>
                </div>
            </Show>
        </AppLayout>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_errors_map_to_guidance() {
        let cases = [
            ("Quota exceeded for model", "AI service quota exceeded."),
            ("402 Payment Required", "AI service payment required."),
            ("Invalid API key", "AI service configuration issue."),
            ("AI service not available", "AI services are currently unavailable."),
        ];
        for (raw, prefix) in cases {
            let message = ai_error_message(&ApiError::rejected(raw));
            assert!(message.starts_with(prefix), "{raw} -> {message}");
        }
    }

    #[test]
    fn network_and_unknown_errors_pass_through() {
        assert_eq!(
            ai_error_message(&ApiError::timeout()),
            "Request timed out. Please try again."
        );
        assert_eq!(ai_error_message(&ApiError::rejected("Topic too long")), "Topic too long");
    }
}
