//! 点名：先输入人数，再逐个填写学生出勤情况

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::CreateAttendanceRequest;
use schoolhub_shared::{AttendanceScope, AttendanceSheet, StudentEntry};

use super::StatsGrid;
use crate::api::use_api_handle;
use crate::components::common::{ErrorAlert, SubmitButton};
use crate::components::layout::AppLayout;
use crate::session::use_session;
use crate::web::location::query_param;
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};

/// 解析人数输入，必须为正整数
fn parse_count(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// 点名页地址；班级总人数不同于当日人数时通过 `?total=` 传递
fn take_path(scope: AttendanceScope, today: usize, total: Option<usize>) -> String {
    let base = AppRoute::TakeAttendance(scope, today).to_path();
    match total {
        Some(total) if total != today => format!("{}?total={}", base, total),
        _ => base,
    }
}

#[component]
pub fn CreateAttendancePage(scope: AttendanceScope) -> impl IntoView {
    let router = use_router();
    let today = RwSignal::new(String::new());
    let total = RwSignal::new(String::new());
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(count) = parse_count(&today.get_untracked()) else {
            set_error_msg.set(Some("Please enter a valid number of students".to_string()));
            return;
        };
        let raw_total = total.get_untracked();
        let class_total = if raw_total.trim().is_empty() {
            None
        } else {
            match parse_count(&raw_total) {
                Some(n) if n >= count => Some(n),
                _ => {
                    set_error_msg.set(Some(
                        "Class total must be a number no smaller than today's count".to_string(),
                    ));
                    return;
                }
            }
        };
        router.navigate(&take_path(scope, count, class_total));
    };

    view! {
        <AppLayout title="Create Attendance">
            <form class="card bg-base-100 shadow max-w-md" on:submit=on_submit>
                <div class="card-body gap-3">
                    <ErrorAlert message=error_msg />
                    <label class="form-control">
                        <span class="label-text mb-1">"Number of students today"</span>
                        <input
                            type="number"
                            min="1"
                            class="input input-bordered"
                            on:input=move |ev| today.set(event_target_value(&ev))
                            prop:value=today
                        />
                    </label>
                    <label class="form-control">
                        <span class="label-text mb-1">"Class total (optional)"</span>
                        <input
                            type="number"
                            min="1"
                            class="input input-bordered"
                            on:input=move |ev| total.set(event_target_value(&ev))
                            prop:value=total
                        />
                    </label>
                    <div class="card-actions justify-end">
                        <Link to=AppRoute::AttendanceList(scope).to_path() class="btn btn-ghost">"Cancel"</Link>
                        <button type="submit" class="btn btn-primary">"Continue"</button>
                    </div>
                </div>
            </form>
        </AppLayout>
    }
}

#[component]
pub fn TakeAttendancePage(scope: AttendanceScope, count: usize) -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let api = use_api_handle();

    let total = query_param("total").and_then(|raw| parse_count(&raw));
    let sheet = RwSignal::new(AttendanceSheet::new(count, total));
    let stats = Signal::derive(move || sheet.with(AttendanceSheet::stats));
    let (saving, set_saving) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let edit = move |index: usize, change: fn(&mut StudentEntry, String), value: String| {
        sheet.update(|s| {
            if let Some(student) = s.students.get_mut(index) {
                change(student, value);
            }
        });
    };
    let toggle = move |index: usize, change: fn(&mut StudentEntry, bool), on: bool| {
        sheet.update(|s| {
            if let Some(student) = s.students.get_mut(index) {
                change(student, on);
            }
        });
    };
    let flag = move |index: usize, read: fn(&StudentEntry) -> bool| {
        sheet.with(|s| s.students.get(index).is_some_and(read))
    };

    let on_save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let current = sheet.get_untracked();
        if let Some(row) = current.first_missing_name() {
            set_error_msg.set(Some(format!(
                "Please fill in all student names (row {} is empty)",
                row + 1
            )));
            return;
        }
        let Some(token) = session.token_untracked() else {
            return;
        };
        let me = session.identity().unwrap_or_default();
        let request = CreateAttendanceRequest {
            scope,
            student_count: current.total_count,
            students: current.students,
            grade: me.grade,
            section: me.section,
        };
        set_saving.set(true);
        set_error_msg.set(None);

        let api = api.get_value();
        spawn_local(async move {
            match api.call(&request, Some(&token)).await {
                Ok(_) => {
                    log::info!("[Attendance] saved {} entries", request.students.len());
                    router.navigate(&AppRoute::AttendanceList(scope).to_path());
                }
                Err(e) => {
                    set_error_msg.set(Some(e.user_message().to_string()));
                    set_saving.set(false);
                }
            }
        });
    };

    view! {
        <AppLayout title="Take Attendance">
            <form class="flex flex-col gap-6" on:submit=on_save>
                <StatsGrid stats=stats />
                <ErrorAlert message=error_msg />
                <div class="overflow-x-auto bg-base-100 rounded-box shadow">
                    <table class="table table-sm">
                        <thead>
                            <tr>
                                <th>"#"</th>
                                <th>"Name"</th>
                                <th>"Gender"</th>
                                <th>"Present"</th>
                                <th>"Uniform"</th>
                                <th>"Homework"</th>
                                <th>"Classwork"</th>
                            </tr>
                        </thead>
                        <tbody>
                            {(0..count).map(|i| view! {
                                <tr>
                                    <td>{i + 1}</td>
                                    <td>
                                        <input
                                            type="text"
                                            class="input input-bordered input-sm w-full min-w-40"
                                            placeholder="Student name"
                                            on:input=move |ev| edit(i, |s, v| s.name = v, event_target_value(&ev))
                                        />
                                    </td>
                                    <td>
                                        <select
                                            class="select select-bordered select-sm"
                                            on:change=move |ev| edit(i, |s, v| s.gender = v, event_target_value(&ev))
                                        >
                                            <option value="">"-"</option>
                                            <option value="Male">"Male"</option>
                                            <option value="Female">"Female"</option>
                                        </select>
                                    </td>
                                    <td>
                                        <input
                                            type="checkbox"
                                            class="toggle toggle-success toggle-sm"
                                            prop:checked=move || flag(i, |s| s.present)
                                            on:change=move |_| sheet.update(|s| {
                                                if let Some(student) = s.students.get_mut(i) {
                                                    student.toggle_presence();
                                                }
                                            })
                                        />
                                    </td>
                                    <td>
                                        <input
                                            type="checkbox"
                                            class="checkbox checkbox-sm"
                                            prop:checked=move || flag(i, |s| s.uniform)
                                            on:change=move |ev| toggle(i, |s, on| s.uniform = on, event_target_checked(&ev))
                                        />
                                    </td>
                                    <td>
                                        <input
                                            type="checkbox"
                                            class="checkbox checkbox-sm"
                                            prop:checked=move || flag(i, |s| !s.homework_missing)
                                            on:change=move |ev| toggle(i, |s, on| s.homework_missing = !on, event_target_checked(&ev))
                                        />
                                    </td>
                                    <td>
                                        <input
                                            type="checkbox"
                                            class="checkbox checkbox-sm"
                                            prop:checked=move || flag(i, |s| !s.classwork_missing)
                                            on:change=move |ev| toggle(i, |s, on| s.classwork_missing = !on, event_target_checked(&ev))
                                        />
                                    </td>
                                </tr>
                            }).collect_view()}
                        </tbody>
                    </table>
                </div>
                <div class="flex justify-end gap-2">
                    <Link to=AppRoute::AttendanceList(scope).to_path() class="btn btn-ghost">"Cancel"</Link>
                    <SubmitButton busy=saving label="Save Attendance" busy_label="Saving..." class="btn btn-primary" />
                </div>
            </form>
        </AppLayout>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_must_be_positive_integer() {
        assert_eq!(parse_count(" 12 "), Some(12));
        assert_eq!(parse_count("0"), None);
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("abc"), None);
    }

    #[test]
    fn total_only_added_when_different() {
        assert_eq!(
            take_path(AttendanceScope::Babysitter, 10, Some(12)),
            "/babysitter/attendance/take/10?total=12"
        );
        assert_eq!(take_path(AttendanceScope::General, 10, Some(10)), "/attendance/take/10");
        assert_eq!(take_path(AttendanceScope::General, 5, None), "/attendance/take/5");
    }
}
