use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::{AttendanceListRequest, DeleteAttendanceRequest};
use schoolhub_shared::{AttendanceRecord, AttendanceScope};

use super::{class_label, record_date};
use crate::api::use_api_handle;
use crate::components::common::{ConfirmDialog, ErrorAlert, Spinner, SuccessAlert};
use crate::components::icons::{Plus, Trash2};
use crate::components::layout::AppLayout;
use crate::session::use_session;
use crate::web::route::AppRoute;
use crate::web::router::Link;

#[component]
pub fn AttendanceListPage(scope: AttendanceScope) -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();

    let records = RwSignal::new(Vec::<AttendanceRecord>::new());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (message, set_message) = signal(Option::<String>::None);

    let pending_delete = RwSignal::new(Option::<String>::None);
    let confirm_open = RwSignal::new(false);
    let (deleting, set_deleting) = signal(false);

    if let Some(token) = session.token_untracked() {
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&AttendanceListRequest { scope }, Some(&token)).await {
                Ok(response) => records.set(response.records),
                Err(e) => {
                    log::warn!("[Attendance] list {:?} failed: {}", scope, e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_loading.set(false);
        });
    }

    let on_confirm_delete = Callback::new(move |()| {
        let (Some(id), Some(token)) = (pending_delete.get_untracked(), session.token_untracked()) else {
            return;
        };
        set_deleting.set(true);
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&DeleteAttendanceRequest { scope, id: id.clone() }, Some(&token)).await {
                Ok(_) => {
                    records.update(|list| list.retain(|r| r.id != id));
                    set_message.set(Some("Attendance record deleted".to_string()));
                }
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_deleting.set(false);
            confirm_open.set(false);
            pending_delete.set(None);
        });
    });

    view! {
        <AppLayout title="Attendance">
            <div class="flex justify-end mb-6">
                <Link to=AppRoute::CreateAttendance(scope).to_path() class="btn btn-primary">
                    <Plus attr:class="h-4 w-4" />
                    "Take Attendance"
                </Link>
            </div>
            <ErrorAlert message=error_msg />
            <SuccessAlert message=message />

            <Show when=move || !loading.get() fallback=|| view! { <Spinner label="Loading attendance..." /> }>
                <div class="overflow-x-auto bg-base-100 rounded-box shadow">
                    <table class="table">
                        <thead>
                            <tr>
                                <th>"Date"</th>
                                <th>"Class"</th>
                                <th>"Present"</th>
                                <th>"Absent"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>
                            <For
                                each=move || records.get()
                                key=|r| r.id.clone()
                                children=move |r| {
                                    let stats = r.stats();
                                    let id = r.id.clone();
                                    view! {
                                        <tr>
                                            <td>{record_date(&r)}</td>
                                            <td>{class_label(&r)}</td>
                                            <td>{format!("{} / {}", stats.present_count, r.student_count.max(stats.total_students))}</td>
                                            <td>{stats.absent_count}</td>
                                            <td class="flex justify-end gap-2">
                                                <Link
                                                    to=AppRoute::ViewAttendance(scope, r.id.clone()).to_path()
                                                    class="btn btn-sm btn-ghost"
                                                >
                                                    "View"
                                                </Link>
                                                <button
                                                    class="btn btn-sm btn-error btn-outline"
                                                    on:click=move |_| {
                                                        pending_delete.set(Some(id.clone()));
                                                        confirm_open.set(true);
                                                    }
                                                >
                                                    <Trash2 attr:class="h-4 w-4" />
                                                </button>
                                            </td>
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                    <Show when=move || records.with(Vec::is_empty)>
                        <div class="text-center opacity-60 py-10">"No attendance records yet."</div>
                    </Show>
                </div>
            </Show>

            <ConfirmDialog
                open=confirm_open
                title="Delete attendance record?"
                message=Signal::derive(|| "This record will be permanently removed.".to_string())
                busy=deleting
                on_confirm=on_confirm_delete
            />
        </AppLayout>
    }
}
