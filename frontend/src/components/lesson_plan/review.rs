//! 教研组审核：待审列表与驳回理由

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::lesson_plan::{RejectionReason, RejectionStatus};
use schoolhub_shared::protocol::{
    DepartmentLessonPlansRequest, RejectionReasonsRequest, ResolveRejectionReasonRequest,
};
use schoolhub_shared::{LessonPlan, LessonPlanStatus};

use super::{StatusBadge, excerpt};
use crate::api::use_api_handle;
use crate::components::common::{ErrorAlert, Spinner, SuccessAlert};
use crate::components::icons::RefreshCw;
use crate::components::layout::AppLayout;
use crate::session::use_session;
use crate::web::route::AppRoute;
use crate::web::router::Link;

/// 待审的排在最前
fn review_order(plans: &mut [LessonPlan]) {
    plans.sort_by_key(|p| match p.status {
        LessonPlanStatus::Pending => 0,
        LessonPlanStatus::Rejected => 1,
        LessonPlanStatus::Accepted => 2,
        LessonPlanStatus::Draft => 3,
    });
}

#[component]
pub fn CheckLessonPlansPage() -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();
    let subject = session
        .identity()
        .and_then(|me| me.subject)
        .unwrap_or_default();

    let plans = RwSignal::new(Vec::<LessonPlan>::new());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let subject_label = if subject.is_empty() {
        "All subjects".to_string()
    } else {
        format!("Subject: {}", subject)
    };
    let subject = StoredValue::new(subject);

    let load = move || {
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_loading.set(true);
        set_error_msg.set(None);
        let api = api.get_value();
        let request = DepartmentLessonPlansRequest {
            subject: subject.get_value(),
        };
        spawn_local(async move {
            match api.call(&request, Some(&token)).await {
                Ok(response) => {
                    let mut list = response.lesson_plans;
                    review_order(&mut list);
                    plans.set(list);
                }
                Err(e) => {
                    log::warn!("[Review] department list failed: {}", e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_loading.set(false);
        });
    };
    load();

    view! {
        <AppLayout title="Check Lesson Plans">
            <div class="flex items-center justify-between mb-6">
                <span class="badge badge-lg badge-outline">{subject_label}</span>
                <button class="btn btn-ghost" on:click=move |_| load() disabled=move || loading.get()>
                    <RefreshCw attr:class="h-4 w-4" />
                </button>
            </div>
            <ErrorAlert message=error_msg />

            <Show when=move || !loading.get() fallback=|| view! { <Spinner label="Loading lesson plans..." /> }>
                <div class="overflow-x-auto bg-base-100 rounded-box shadow">
                    <table class="table">
                        <thead>
                            <tr>
                                <th>"Title"</th>
                                <th>"Teacher"</th>
                                <th>"Grade"</th>
                                <th>"Status"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>
                            <For
                                each=move || plans.get()
                                key=|p| format!("{}-{}", p.id, p.status.as_str())
                                children=|p| view! {
                                    <tr>
                                        <td>
                                            <div class="font-medium">{p.title.clone()}</div>
                                            <div class="text-xs opacity-60">{excerpt(&p.description, 80)}</div>
                                        </td>
                                        <td>{p.teacher_name().to_string()}</td>
                                        <td>{p.grade.clone()}</td>
                                        <td><StatusBadge status=p.status /></td>
                                        <td>
                                            <Link to=AppRoute::LessonPlanDetail(p.id.clone()).to_path() class="btn btn-sm btn-primary">
                                                "Review"
                                            </Link>
                                        </td>
                                    </tr>
                                }
                            />
                        </tbody>
                    </table>
                    <Show when=move || plans.with(Vec::is_empty)>
                        <div class="text-center opacity-60 py-10">"No lesson plans to review."</div>
                    </Show>
                </div>
            </Show>
        </AppLayout>
    }
}

#[component]
pub fn RejectionReasonsPage() -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();

    let reasons = RwSignal::new(Vec::<RejectionReason>::new());
    let (loading, set_loading) = signal(true);
    let (resolving, set_resolving) = signal(Option::<String>::None);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (message, set_message) = signal(Option::<String>::None);

    if let Some(token) = session.token_untracked() {
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&RejectionReasonsRequest, Some(&token)).await {
                Ok(response) => reasons.set(response.rejection_reasons),
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_loading.set(false);
        });
    }

    let resolve = move |id: String| {
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_resolving.set(Some(id.clone()));
        set_error_msg.set(None);
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&ResolveRejectionReasonRequest { id: id.clone() }, Some(&token)).await {
                Ok(_) => {
                    reasons.update(|list| {
                        if let Some(r) = list.iter_mut().find(|r| r.id == id) {
                            r.status = RejectionStatus::Resolved;
                        }
                    });
                    set_message.set(Some("Marked as resolved".to_string()));
                }
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_resolving.set(None);
        });
    };

    view! {
        <AppLayout title="Rejection Reasons">
            <ErrorAlert message=error_msg />
            <SuccessAlert message=message />
            <Show when=move || !loading.get() fallback=|| view! { <Spinner label="Loading rejection reasons..." /> }>
                <Show
                    when=move || reasons.with(|r| !r.is_empty())
                    fallback=|| view! { <div class="text-center opacity-60 py-16">"No rejection reasons."</div> }
                >
                    <div class="flex flex-col gap-4">
                        <For
                            each=move || reasons.get()
                            key=|r| format!("{}-{:?}", r.id, r.status)
                            children=move |r| {
                                let resolved = r.status == RejectionStatus::Resolved;
                                let id = r.id.clone();
                                let row_id = r.id.clone();
                                view! {
                                    <div class="card bg-base-100 shadow" class:opacity-60=resolved>
                                        <div class="card-body gap-2">
                                            <div class="flex flex-wrap items-start justify-between gap-2">
                                                <Link
                                                    to=AppRoute::LessonPlanDetail(r.lesson_plan_id.clone()).to_path()
                                                    class="card-title link link-hover"
                                                >
                                                    {r.lesson_plan_title.clone()}
                                                </Link>
                                                <span class=if resolved { "badge badge-success" } else { "badge badge-warning" }>
                                                    {if resolved { "Resolved" } else { "Active" }}
                                                </span>
                                            </div>
                                            <p class="text-sm opacity-70">
                                                {format!("{} ({})", r.teacher_name, r.teacher_email)}
                                                {r.created_at.clone().map(|at| format!(" · {}", at))}
                                            </p>
                                            <p>{r.reason.clone()}</p>
                                            {r.highlighted_text.clone().filter(|t| !t.is_empty()).map(|t| view! {
                                                <blockquote class="border-l-4 border-base-300 pl-3 italic text-sm">{t}</blockquote>
                                            })}
                                            {(!resolved).then(|| view! {
                                                <div class="card-actions justify-end">
                                                    <button
                                                        class="btn btn-sm btn-success"
                                                        disabled=move || resolving.with(|x| x.as_deref() == Some(row_id.as_str()))
                                                        on:click=move |_| resolve(id.clone())
                                                    >
                                                        "Mark Resolved"
                                                    </button>
                                                </div>
                                            })}
                                        </div>
                                    </div>
                                }
                            }
                        />
                    </div>
                </Show>
            </Show>
        </AppLayout>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_plans_come_first() {
        let plan = |id: &str, status| LessonPlan {
            id: id.into(),
            status,
            ..LessonPlan::default()
        };
        let mut list = vec![
            plan("a", LessonPlanStatus::Accepted),
            plan("p", LessonPlanStatus::Pending),
            plan("r", LessonPlanStatus::Rejected),
        ];
        review_order(&mut list);
        let ids: Vec<_> = list.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p", "r", "a"]);
    }
}
