//! 管理员页面：用户列表、教案报表、考勤报表

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::{
    AdminAttendancesRequest, AdminLessonPlansRequest, AdminUsersRequest, Pagination,
};
use schoolhub_shared::{AttendanceRecord, Identity, LessonPlan, Role};

use crate::api::use_api_handle;
use crate::components::attendance::{class_label, record_date};
use crate::components::common::{ErrorAlert, Pager, Spinner};
use crate::components::layout::AppLayout;
use crate::components::lesson_plan::StatusBadge;
use crate::config::REPORT_PAGE_SIZE;
use crate::session::use_session;
use crate::web::route::AppRoute;
use crate::web::router::Link;

/// 按角色与关键字（姓名或邮箱）筛选用户
fn filter_users(users: &[Identity], role: Option<Role>, query: &str) -> Vec<Identity> {
    let query = query.trim().to_lowercase();
    users
        .iter()
        .filter(|u| role.is_none_or(|r| u.role == r))
        .filter(|u| {
            query.is_empty()
                || u.full_name.to_lowercase().contains(&query)
                || u.email.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

#[component]
pub fn ManageUsersPage() -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();
    let users = RwSignal::new(Vec::<Identity>::new());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let role_filter = RwSignal::new(Option::<Role>::None);
    let query = RwSignal::new(String::new());

    if let Some(token) = session.token_untracked() {
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&AdminUsersRequest, Some(&token)).await {
                Ok(response) => users.set(response.users),
                Err(e) => {
                    log::warn!("[Admin] users failed: {}", e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_loading.set(false);
        });
    }

    let visible = Memo::new(move |_| {
        users.with(|all| filter_users(all, role_filter.get(), &query.get()))
    });

    view! {
        <AppLayout title="Manage Users">
            <div class="flex flex-wrap gap-3 mb-6">
                <input
                    type="search"
                    placeholder="Search by name or email"
                    class="input input-bordered w-full sm:w-72"
                    on:input=move |ev| query.set(event_target_value(&ev))
                    prop:value=query
                />
                <select
                    class="select select-bordered"
                    on:change=move |ev| {
                        let raw = event_target_value(&ev);
                        role_filter.set((!raw.is_empty()).then(|| Role::parse(&raw)));
                    }
                >
                    <option value="">"All roles"</option>
                    {Role::ALL.into_iter().map(|r| view! { <option value=r.as_str()>{r.as_str()}</option> }).collect_view()}
                </select>
            </div>
            <ErrorAlert message=error_msg />
            <Show when=move || !loading.get() fallback=|| view! { <Spinner label="Loading users..." /> }>
                <p class="text-sm opacity-70 mb-2">{move || format!("{} users", visible.with(Vec::len))}</p>
                <div class="overflow-x-auto bg-base-100 rounded-box shadow">
                    <table class="table">
                        <thead>
                            <tr>
                                <th>"Name"</th>
                                <th>"Email"</th>
                                <th>"Role"</th>
                                <th>"Class / Subject"</th>
                                <th>"Verified"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <For
                                each=move || visible.get()
                                key=|u| u.id.clone()
                                children=|u| {
                                    let detail = [u.grade.as_deref().map(|g| format!("Grade {}", g)), u.section.clone(), u.subject.clone()]
                                        .into_iter()
                                        .flatten()
                                        .collect::<Vec<_>>()
                                        .join(" · ");
                                    view! {
                                        <tr>
                                            <td>{u.display_name().to_string()}</td>
                                            <td>{u.email.clone()}</td>
                                            <td><span class="badge badge-outline">{u.role.as_str()}</span></td>
                                            <td>{detail}</td>
                                            <td>{if u.is_verified { "Yes" } else { "No" }}</td>
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </Show>
        </AppLayout>
    }
}

#[component]
pub fn LessonPlanReportPage() -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();
    let page = RwSignal::new(1u32);
    let plans = RwSignal::new(Vec::<LessonPlan>::new());
    let pagination = RwSignal::new(Pagination::default());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    Effect::new(move |_| {
        let requested = page.get();
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_loading.set(true);
        set_error_msg.set(None);
        let request = AdminLessonPlansRequest {
            page: requested,
            limit: REPORT_PAGE_SIZE,
        };
        let api = api.get_value();
        spawn_local(async move {
            let result = api.call(&request, Some(&token)).await;
            // 翻页过快时丢弃过期响应
            if page.get_untracked() != requested {
                return;
            }
            match result {
                Ok(report) => {
                    plans.set(report.lesson_plans);
                    pagination.set(report.pagination);
                }
                Err(e) => {
                    log::warn!("[Admin] lesson report page {} failed: {}", requested, e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_loading.set(false);
        });
    });

    let is_last = Signal::derive(move || pagination.with(Pagination::is_last));

    view! {
        <AppLayout title="Lesson Plan Report">
            <ErrorAlert message=error_msg />
            <div class="flex items-center justify-between mb-4">
                <span class="text-sm opacity-70">
                    {move || format!("{} lesson plans in total", pagination.with(|p| p.total))}
                </span>
                <Pager page=page is_last=is_last busy=loading />
            </div>
            <Show when=move || !loading.get() fallback=|| view! { <Spinner label="Loading report..." /> }>
                <div class="overflow-x-auto bg-base-100 rounded-box shadow">
                    <table class="table">
                        <thead>
                            <tr>
                                <th>"Title"</th>
                                <th>"Teacher"</th>
                                <th>"Subject"</th>
                                <th>"Grade"</th>
                                <th>"Status"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <For
                                each=move || plans.get()
                                key=|p| p.id.clone()
                                children=|p| {
                                    let title = p.title.clone();
                                    view! {
                                    <tr>
                                        <td>
                                            <Link to=AppRoute::LessonPlanDetail(p.id.clone()).to_path() class="link link-hover">
                                                {title}
                                            </Link>
                                        </td>
                                        <td>{p.teacher_name().to_string()}</td>
                                        <td>{p.subject.clone()}</td>
                                        <td>{p.grade.clone()}</td>
                                        <td><StatusBadge status=p.status /></td>
                                    </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </Show>
        </AppLayout>
    }
}

#[component]
pub fn AttendanceReportPage() -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();
    let page = RwSignal::new(1u32);
    let records = RwSignal::new(Vec::<AttendanceRecord>::new());
    let pagination = RwSignal::new(Pagination::default());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    Effect::new(move |_| {
        let requested = page.get();
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_loading.set(true);
        set_error_msg.set(None);
        let request = AdminAttendancesRequest {
            page: requested,
            limit: REPORT_PAGE_SIZE,
        };
        let api = api.get_value();
        spawn_local(async move {
            let result = api.call(&request, Some(&token)).await;
            if page.get_untracked() != requested {
                return;
            }
            match result {
                Ok(report) => {
                    records.set(report.attendances);
                    pagination.set(report.pagination);
                }
                Err(e) => {
                    log::warn!("[Admin] attendance report page {} failed: {}", requested, e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_loading.set(false);
        });
    });

    let is_last = Signal::derive(move || pagination.with(Pagination::is_last));

    view! {
        <AppLayout title="Attendance Report">
            <ErrorAlert message=error_msg />
            <div class="flex items-center justify-between mb-4">
                <span class="text-sm opacity-70">
                    {move || format!("{} records in total", pagination.with(|p| p.total))}
                </span>
                <Pager page=page is_last=is_last busy=loading />
            </div>
            <Show when=move || !loading.get() fallback=|| view! { <Spinner label="Loading report..." /> }>
                <div class="overflow-x-auto bg-base-100 rounded-box shadow">
                    <table class="table">
                        <thead>
                            <tr>
                                <th>"Date"</th>
                                <th>"Class"</th>
                                <th>"Present"</th>
                                <th>"Absent"</th>
                                <th>"Uniform"</th>
                                <th>"Missing HW"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <For
                                each=move || records.get()
                                key=|r| r.id.clone()
                                children=|r| {
                                    let stats = r.stats();
                                    view! {
                                        <tr>
                                            <td>{record_date(&r)}</td>
                                            <td>{class_label(&r)}</td>
                                            <td>{format!("{} / {}", stats.present_count, r.student_count.max(stats.total_students))}</td>
                                            <td>{stats.absent_count}</td>
                                            <td>{stats.uniform_count}</td>
                                            <td>{stats.no_hw_count}</td>
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </Show>
        </AppLayout>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str, role: Role) -> Identity {
        Identity {
            id: email.into(),
            full_name: name.into(),
            email: email.into(),
            role,
            ..Identity::default()
        }
    }

    #[test]
    fn users_filter_by_role_and_query() {
        let users = vec![
            user("Amal Haddad", "amal@school.edu", Role::Teacher),
            user("Omar Nasser", "omar@school.edu", Role::Student),
            user("Lina Amal", "lina@school.edu", Role::Student),
        ];

        assert_eq!(filter_users(&users, None, "").len(), 3);
        assert_eq!(filter_users(&users, Some(Role::Student), "").len(), 2);

        let hits = filter_users(&users, None, "AMAL");
        assert_eq!(hits.len(), 2);

        let hits = filter_users(&users, Some(Role::Student), "omar@");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].full_name, "Omar Nasser");
    }
}
