use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::AttendanceRecordRequest;
use schoolhub_shared::{AttendanceRecord, AttendanceScope, AttendanceStats};

use super::{class_label, record_date};
use crate::api::use_api_handle;
use crate::components::common::{ErrorAlert, Spinner};
use crate::components::layout::AppLayout;
use crate::session::use_session;
use crate::web::route::AppRoute;
use crate::web::router::Link;

/// 统计卡片：(标题, 数值)
fn stat_tiles(stats: &AttendanceStats) -> [(&'static str, usize); 8] {
    [
        ("Students", stats.total_students),
        ("Present", stats.present_count),
        ("Absent", stats.absent_count),
        ("Uniform", stats.uniform_count),
        ("No Uniform", stats.no_uniform_count),
        ("Homework Done", stats.hw_count),
        ("No Homework", stats.no_hw_count),
        ("Classwork Done", stats.cw_count),
    ]
}

#[component]
pub fn StatsGrid(#[prop(into)] stats: Signal<AttendanceStats>) -> impl IntoView {
    view! {
        <div class="stats stats-vertical sm:stats-horizontal shadow bg-base-100 w-full flex-wrap">
            {move || stat_tiles(&stats.get()).into_iter().map(|(title, value)| view! {
                <div class="stat">
                    <div class="stat-title">{title}</div>
                    <div class="stat-value text-2xl">{value}</div>
                </div>
            }).collect_view()}
        </div>
    }
}

#[component]
pub fn AttendanceRecordPage(scope: AttendanceScope, id: String) -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();
    let record = RwSignal::new(Option::<AttendanceRecord>::None);
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    if let Some(token) = session.token_untracked() {
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&AttendanceRecordRequest { scope, id: id.clone() }, Some(&token)).await {
                Ok(response) => match response.record {
                    Some(found) => record.set(Some(found)),
                    None => set_error_msg.set(Some("Attendance record not found".to_string())),
                },
                Err(e) => {
                    log::warn!("[Attendance] record {} failed: {}", id, e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_loading.set(false);
        });
    }

    let stats = Signal::derive(move || record.with(|r| r.as_ref().map(AttendanceRecord::stats).unwrap_or_default()));

    view! {
        <AppLayout title="Attendance Record">
            <Link to=AppRoute::AttendanceList(scope).to_path() class="link link-hover text-sm mb-4 inline-block">
                "Back to attendance"
            </Link>
            <ErrorAlert message=error_msg />
            <Show when=move || !loading.get() fallback=|| view! { <Spinner label="Loading record..." /> }>
                {move || record.get().map(|r| view! {
                    <div class="flex flex-col gap-6">
                        <div class="flex flex-wrap gap-2">
                            <span class="badge badge-lg badge-outline">{record_date(&r)}</span>
                            <span class="badge badge-lg badge-outline">{class_label(&r)}</span>
                            <span class="badge badge-lg badge-outline">{format!("Class size {}", r.student_count)}</span>
                        </div>
                        <StatsGrid stats=stats />
                        <div class="overflow-x-auto bg-base-100 rounded-box shadow">
                            <table class="table table-sm">
                                <thead>
                                    <tr>
                                        <th>"Name"</th>
                                        <th>"Gender"</th>
                                        <th>"Status"</th>
                                        <th>"Uniform"</th>
                                        <th>"Homework"</th>
                                        <th>"Classwork"</th>
                                    </tr>
                                </thead>
                                <tbody>
                                    {r.students().iter().map(|s| {
                                        let mark = |ok: bool| if ok { "✓" } else { "✗" };
                                        view! {
                                            <tr>
                                                <td>{s.name.clone()}</td>
                                                <td>{s.gender.clone()}</td>
                                                <td>
                                                    <span class=if s.present { "badge badge-success" } else { "badge badge-error" }>
                                                        {if s.present { "Present" } else { "Absent" }}
                                                    </span>
                                                </td>
                                                <td>{mark(s.uniform)}</td>
                                                <td>{mark(!s.homework_missing)}</td>
                                                <td>{mark(!s.classwork_missing)}</td>
                                            </tr>
                                        }
                                    }).collect_view()}
                                </tbody>
                            </table>
                        </div>
                    </div>
                })}
            </Show>
        </AppLayout>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_shared::StudentEntry;

    #[test]
    fn tiles_follow_derived_counts() {
        let mut present = StudentEntry::blank();
        present.toggle_presence();
        present.uniform = true;
        let absent = StudentEntry::blank();
        let stats = AttendanceStats::from_entries(&[present, absent]);

        let tiles = stat_tiles(&stats);
        assert_eq!(tiles[0], ("Students", 2));
        assert_eq!(tiles[1], ("Present", 1));
        assert_eq!(tiles[2], ("Absent", 1));
        assert_eq!(tiles[3], ("Uniform", 1));
        assert_eq!(tiles[6], ("No Homework", 2));
    }
}
