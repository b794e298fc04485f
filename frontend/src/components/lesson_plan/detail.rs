use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::lesson_plan::available_actions;
use schoolhub_shared::{LessonPlan, LessonPlanStatus, PlanAction, Role};

use super::{LESSON_PLANNER_PATH, StatusBadge};
use crate::api::{PlanCommand, use_api_handle};
use crate::components::common::{ErrorAlert, Spinner, SuccessAlert};
use crate::components::layout::AppLayout;
use crate::session::use_session;
use crate::web::route::AppRoute;
use crate::web::router::Link;

/// 详情页的返回入口
fn back_target(role: Role) -> (String, &'static str) {
    match role {
        Role::Department => (AppRoute::CheckLessonPlans.to_path(), "Back to review list"),
        Role::Admin => (AppRoute::LessonPlanReport.to_path(), "Back to report"),
        _ => (LESSON_PLANNER_PATH.to_string(), "Back to lesson planner"),
    }
}

fn success_text(action: PlanAction) -> &'static str {
    match action {
        PlanAction::Submit => "Lesson plan submitted for review",
        PlanAction::Accept => "Lesson plan accepted",
        PlanAction::Reject => "Lesson plan rejected",
    }
}

#[component]
pub fn LessonPlanDetailPage(id: String) -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();
    let role = session.session.with_untracked(|s| s.role()).unwrap_or_default();
    let (back_path, back_label) = back_target(role);

    let plan = RwSignal::new(Option::<LessonPlan>::None);
    let (loading, set_loading) = signal(true);
    let (acting, set_acting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (message, set_message) = signal(Option::<String>::None);

    let show_reject = RwSignal::new(false);
    let reason = RwSignal::new(String::new());
    let highlighted = RwSignal::new(String::new());

    if let Some(token) = session.token_untracked() {
        let api = api.get_value();
        let id = id.clone();
        spawn_local(async move {
            match api.lesson_plan(&id, role, Some(&token)).await {
                Ok(loaded) => plan.set(Some(loaded)),
                Err(e) => {
                    log::warn!("[LessonPlanDetail] load {} failed: {}", id, e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_loading.set(false);
        });
    }

    let plan_id = StoredValue::new(id);

    let run = move |command: PlanCommand| {
        let Some(token) = session.token_untracked() else {
            return;
        };
        let action = command.action();
        set_acting.set(true);
        set_error_msg.set(None);
        set_message.set(None);

        let api = api.get_value();
        let id = plan_id.get_value();
        spawn_local(async move {
            let outcome = api.apply_plan_action(&id, command, role, Some(&token)).await;
            // 无论成败都展示服务端状态
            if let Some(latest) = outcome.plan {
                plan.set(Some(latest));
            }
            match outcome.error {
                Some(e) => set_error_msg.set(Some(e.user_message().to_string())),
                None => {
                    set_message.set(Some(success_text(action).to_string()));
                    show_reject.set(false);
                    reason.set(String::new());
                    highlighted.set(String::new());
                }
            }
            set_acting.set(false);
        });
    };

    let on_reject = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let text = highlighted.get_untracked();
        run(PlanCommand::Reject {
            reason: reason.get_untracked(),
            highlighted_text: (!text.trim().is_empty()).then_some(text),
        });
    };

    let actions = Memo::new(move |_| {
        plan.with(|p| {
            p.as_ref()
                .map(|p| available_actions(role, p.status))
                .unwrap_or_default()
        })
    });

    view! {
        <AppLayout title="Lesson Plan">
            <Link to=back_path class="link link-hover text-sm mb-4 inline-block">{back_label}</Link>
            <ErrorAlert message=error_msg />
            <SuccessAlert message=message />

            <Show when=move || !loading.get() fallback=|| view! { <Spinner label="Loading lesson plan..." /> }>
                {move || plan.get().map(|p| view! {
                    <div class="card bg-base-100 shadow max-w-4xl">
                        <div class="card-body gap-3">
                            <div class="flex flex-wrap items-start justify-between gap-2">
                                <h2 class="card-title text-2xl">{p.title.clone()}</h2>
                                <StatusBadge status=p.status />
                            </div>
                            <div class="flex flex-wrap gap-2 text-sm">
                                <span class="badge badge-outline">{p.subject.clone()}</span>
                                <span class="badge badge-outline">{format!("Grade {}", p.grade)}</span>
                                <span class="badge badge-outline">{p.kind.label()}</span>
                            </div>
                            <p class="text-sm opacity-70">
                                {format!("By {} ({})", p.teacher_name(), p.teacher_email())}
                            </p>
                            <div class="divider my-1"></div>
                            <div class="whitespace-pre-wrap leading-relaxed">{p.description.clone()}</div>

                            {(p.status == LessonPlanStatus::Rejected).then(|| view! {
                                <div class="alert alert-error flex-col items-start">
                                    <span class="font-semibold">"Rejection reason"</span>
                                    <span>{p.rejection_reason.clone().unwrap_or_default()}</span>
                                    {p.highlighted_text.clone().filter(|t| !t.is_empty()).map(|t| view! {
                                        <blockquote class="border-l-4 border-error-content/40 pl-3 italic">{t}</blockquote>
                                    })}
                                </div>
                            })}
                        </div>
                    </div>
                })}

                <div class="flex flex-wrap gap-2 mt-4">
                    <For
                        each=move || actions.get()
                        key=|a| *a
                        children=move |action| {
                            let class = match action {
                                PlanAction::Reject => "btn btn-error",
                                PlanAction::Accept => "btn btn-success",
                                PlanAction::Submit => "btn btn-primary",
                            };
                            view! {
                                <button
                                    class=class
                                    disabled=move || acting.get()
                                    on:click=move |_| match action {
                                        PlanAction::Submit => run(PlanCommand::Submit),
                                        PlanAction::Accept => run(PlanCommand::Accept),
                                        PlanAction::Reject => show_reject.update(|open| *open = !*open),
                                    }
                                >
                                    {action.label()}
                                </button>
                            }
                        }
                    />
                </div>

                <Show when=move || show_reject.get()>
                    <form class="card bg-base-100 shadow max-w-4xl mt-4" on:submit=on_reject>
                        <div class="card-body gap-3">
                            <h3 class="font-semibold">"Reject lesson plan"</h3>
                            <textarea
                                class="textarea textarea-bordered"
                                placeholder="Reason for rejection (required)"
                                on:input=move |ev| reason.set(event_target_value(&ev))
                                prop:value=reason
                            ></textarea>
                            <textarea
                                class="textarea textarea-bordered"
                                placeholder="Paste the passage that needs changes (optional)"
                                on:input=move |ev| highlighted.set(event_target_value(&ev))
                                prop:value=highlighted
                            ></textarea>
                            <div class="flex justify-end gap-2">
                                <button type="button" class="btn btn-ghost" on:click=move |_| show_reject.set(false)>
                                    "Cancel"
                                </button>
                                <button type="submit" class="btn btn-error" disabled=move || acting.get()>
                                    {move || if acting.get() { "Rejecting..." } else { "Confirm Reject" }}
                                </button>
                            </div>
                        </div>
                    </form>
                </Show>
            </Show>
        </AppLayout>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_link_follows_role() {
        assert_eq!(back_target(Role::Department).0, "/check-lesson-plans");
        assert_eq!(back_target(Role::Admin).0, "/reports-lesson");
        assert_eq!(back_target(Role::Teacher).0, "/lesson-planner");
    }
}
