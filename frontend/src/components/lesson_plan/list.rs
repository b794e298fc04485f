use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::{DeleteLessonPlanRequest, TeacherLessonPlansRequest};
use schoolhub_shared::lesson_plan::available_actions;
use schoolhub_shared::{LessonPlan, PlanAction, Role};

use super::{StatusBadge, excerpt};
use crate::api::{PlanCommand, use_api_handle};
use crate::components::common::{ConfirmDialog, ErrorAlert, Spinner, SuccessAlert};
use crate::components::icons::{Plus, RefreshCw, Trash2};
use crate::components::layout::AppLayout;
use crate::session::use_session;
use crate::web::route::AppRoute;
use crate::web::router::Link;

#[component]
pub fn LessonPlannerPage() -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();

    let plans = RwSignal::new(Vec::<LessonPlan>::new());
    let (loading, set_loading) = signal(true);
    let (busy_id, set_busy_id) = signal(Option::<String>::None);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (message, set_message) = signal(Option::<String>::None);

    let pending_delete = RwSignal::new(Option::<LessonPlan>::None);
    let confirm_open = RwSignal::new(false);
    let (deleting, set_deleting) = signal(false);

    let load = move || {
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_loading.set(true);
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&TeacherLessonPlansRequest, Some(&token)).await {
                Ok(response) => plans.set(response.lesson_plans),
                Err(e) => {
                    log::warn!("[LessonPlanner] list failed: {}", e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_loading.set(false);
        });
    };
    load();

    let submit = move |id: String| {
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_busy_id.set(Some(id.clone()));
        set_error_msg.set(None);
        set_message.set(None);
        let api = api.get_value();
        spawn_local(async move {
            let outcome = api
                .apply_plan_action(&id, PlanCommand::Submit, Role::Teacher, Some(&token))
                .await;
            if let Some(plan) = outcome.plan {
                plans.update(|list| {
                    if let Some(slot) = list.iter_mut().find(|p| p.id == plan.id) {
                        *slot = plan;
                    }
                });
            }
            match outcome.error {
                Some(e) => set_error_msg.set(Some(e.user_message().to_string())),
                None => set_message.set(Some("Lesson plan submitted for review".to_string())),
            }
            set_busy_id.set(None);
        });
    };

    let on_confirm_delete = Callback::new(move |()| {
        let Some(plan) = pending_delete.get_untracked() else {
            return;
        };
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_deleting.set(true);
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&DeleteLessonPlanRequest { id: plan.id.clone() }, Some(&token)).await {
                Ok(_) => {
                    plans.update(|list| list.retain(|p| p.id != plan.id));
                    set_message.set(Some("Lesson plan deleted".to_string()));
                }
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_deleting.set(false);
            confirm_open.set(false);
            pending_delete.set(None);
        });
    });

    let delete_message = Signal::derive(move || {
        pending_delete.with(|p| {
            p.as_ref()
                .map(|plan| format!("Delete \"{}\"? This cannot be undone.", plan.title))
                .unwrap_or_default()
        })
    });

    view! {
        <AppLayout title="Lesson Planner">
            <div class="flex flex-wrap items-center justify-between gap-2 mb-6">
                <p class="opacity-70">"Create lessons and submit them for department review."</p>
                <div class="flex gap-2">
                    <button class="btn btn-ghost" on:click=move |_| load() disabled=move || loading.get()>
                        <RefreshCw attr:class="h-4 w-4" />
                    </button>
                    <Link to=AppRoute::CreateLessonPlan.to_path() class="btn btn-primary">
                        <Plus attr:class="h-4 w-4" />
                        "New Lesson Plan"
                    </Link>
                </div>
            </div>

            <ErrorAlert message=error_msg />
            <SuccessAlert message=message />

            <Show
                when=move || !loading.get()
                fallback=|| view! { <Spinner label="Loading lesson plans..." /> }
            >
                <Show
                    when=move || plans.with(|p| !p.is_empty())
                    fallback=|| view! {
                        <div class="text-center opacity-60 py-16">"No lesson plans yet."</div>
                    }
                >
                    <div class="grid grid-cols-1 lg:grid-cols-2 gap-4">
                        <For
                            each=move || plans.get()
                            key=|p| format!("{}-{}", p.id, p.status.as_str())
                            children=move |plan| {
                                let can_submit = available_actions(Role::Teacher, plan.status)
                                    .contains(&PlanAction::Submit);
                                let submit_id = plan.id.clone();
                                let row_id = plan.id.clone();
                                let target = plan.clone();
                                let is_busy = move || busy_id.with(|b| b.as_deref() == Some(row_id.as_str()));
                                view! {
                                    <div class="card bg-base-100 shadow">
                                        <div class="card-body gap-2">
                                            <div class="flex items-start justify-between gap-2">
                                                <Link
                                                    to=AppRoute::LessonPlanDetail(plan.id.clone()).to_path()
                                                    class="card-title link link-hover"
                                                >
                                                    {plan.title.clone()}
                                                </Link>
                                                <StatusBadge status=plan.status />
                                            </div>
                                            <p class="text-sm opacity-70">
                                                {format!("{} · Grade {} · {}", plan.subject, plan.grade, plan.kind.label())}
                                            </p>
                                            <p class="text-sm">{excerpt(&plan.description, 160)}</p>
                                            {plan.rejection_reason.clone().map(|reason| view! {
                                                <p class="text-sm text-error">{format!("Rejected: {}", reason)}</p>
                                            })}
                                            <div class="card-actions justify-end">
                                                {can_submit.then(|| view! {
                                                    <Link
                                                        to=AppRoute::EditLessonPlan(plan.id.clone()).to_path()
                                                        class="btn btn-sm btn-ghost"
                                                    >
                                                        "Edit"
                                                    </Link>
                                                })}
                                                {can_submit.then(|| {
                                                    let is_busy = is_busy.clone();
                                                    view! {
                                                        <button
                                                            class="btn btn-sm btn-primary"
                                                            disabled=move || is_busy()
                                                            on:click=move |_| submit(submit_id.clone())
                                                        >
                                                            "Submit"
                                                        </button>
                                                    }
                                                })}
                                                <button
                                                    class="btn btn-sm btn-error btn-outline"
                                                    on:click=move |_| {
                                                        pending_delete.set(Some(target.clone()));
                                                        confirm_open.set(true);
                                                    }
                                                >
                                                    <Trash2 attr:class="h-4 w-4" />
                                                </button>
                                            </div>
                                        </div>
                                    </div>
                                }
                            }
                        />
                    </div>
                </Show>
            </Show>

            <ConfirmDialog
                open=confirm_open
                title="Delete lesson plan?"
                message=delete_message
                busy=deleting
                on_confirm=on_confirm_delete
            />
        </AppLayout>
    }
}
