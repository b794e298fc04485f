use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::IdentityPatch;
use schoolhub_shared::protocol::DeleteUserRequest;
use schoolhub_shared::school::{self, RoleFields};

use crate::api::use_api_handle;
use crate::components::common::{ConfirmDialog, ErrorAlert, SuccessAlert};
use crate::components::layout::AppLayout;
use crate::components::signup::{GradeSelect, SectionSelect, SubjectSelect};
use crate::session::use_session;

#[component]
pub fn ProfilePage() -> impl IntoView {
    let session = use_session();

    // 进入页面时拉取最新资料
    spawn_local(async move {
        if let Err(e) = session.reload_profile().await {
            log::debug!("[Profile] reload failed: {}", e);
        }
    });

    let (message, set_message) = signal(Option::<String>::None);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    view! {
        <AppLayout title="Profile">
            <div class="flex flex-col gap-6 max-w-2xl">
                <SuccessAlert message=message />
                <ErrorAlert message=error_msg />
                <ProfileCard set_message set_error_msg />
                <ChangePasswordCard set_message set_error_msg />
                <DangerZone set_message set_error_msg />
            </div>
        </AppLayout>
    }
}

#[component]
fn ProfileCard(
    set_message: WriteSignal<Option<String>>,
    set_error_msg: WriteSignal<Option<String>>,
) -> impl IntoView {
    let session = use_session();
    let me = session.identity().unwrap_or_default();
    let role = me.role;
    let fields = RoleFields::for_role(role);

    let full_name = RwSignal::new(me.full_name.clone());
    let grade = RwSignal::new(me.grade.clone().unwrap_or_default());
    let section = RwSignal::new(me.section.clone().unwrap_or_default());
    let subject = RwSignal::new(me.subject.clone().unwrap_or_default());
    let (saving, set_saving) = signal(false);

    let on_save = move |_| {
        let name = full_name.get_untracked().trim().to_string();
        if name.is_empty() {
            set_error_msg.set(Some("Name cannot be empty".to_string()));
            return;
        }
        let (g, s, sub) = (grade.get_untracked(), section.get_untracked(), subject.get_untracked());
        let patch = IdentityPatch {
            full_name: Some(name),
            role: None,
            ..fields.patch(role, &g, &s, &sub)
        };

        set_saving.set(true);
        set_message.set(None);
        set_error_msg.set(None);
        spawn_local(async move {
            match session.update_identity(patch).await {
                Ok(()) => set_message.set(Some("Profile updated".to_string())),
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_saving.set(false);
        });
    };

    view! {
        <div class="card bg-base-100 shadow">
            <div class="card-body gap-3">
                <div class="flex items-center gap-4">
                    <div class="avatar placeholder">
                        <div class="bg-neutral text-neutral-content w-16 rounded-full">
                            <span class="text-2xl">{me.initial()}</span>
                        </div>
                    </div>
                    <div>
                        <p class="font-semibold">{me.email.clone()}</p>
                        <div class="flex gap-2 mt-1">
                            <span class="badge badge-outline">{role.as_str()}</span>
                            {me.is_oauth.then(|| view! { <span class="badge badge-ghost">"Google"</span> })}
                        </div>
                    </div>
                </div>

                <label class="form-control">
                    <span class="label-text mb-1">"Full name"</span>
                    <input
                        type="text"
                        class="input input-bordered"
                        on:input=move |ev| full_name.set(event_target_value(&ev))
                        prop:value=full_name
                    />
                </label>
                {fields.grade.then(|| view! { <GradeSelect value=grade /> })}
                {fields.section.then(|| view! { <SectionSelect value=section /> })}
                {fields.subject.then(|| view! { <SubjectSelect value=subject /> })}

                <div class="card-actions justify-end">
                    <button class="btn btn-primary" on:click=on_save disabled=move || saving.get()>
                        {move || if saving.get() { "Saving..." } else { "Save Profile" }}
                    </button>
                </div>
            </div>
        </div>
    }
}

#[component]
fn ChangePasswordCard(
    set_message: WriteSignal<Option<String>>,
    set_error_msg: WriteSignal<Option<String>>,
) -> impl IntoView {
    let session = use_session();
    let needs_current = !session.identity().is_some_and(|me| me.is_oauth);

    let current = RwSignal::new(String::new());
    let new_password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let (saving, set_saving) = signal(false);

    let on_change = move |_| {
        let next = new_password.get_untracked();
        if let Err(message) = school::validate_new_password(&next, Some(&confirm.get_untracked())) {
            set_error_msg.set(Some(message));
            return;
        }
        let existing = current.get_untracked();
        if needs_current && existing.is_empty() {
            set_error_msg.set(Some("Current password is required.".to_string()));
            return;
        }

        set_saving.set(true);
        set_message.set(None);
        set_error_msg.set(None);
        spawn_local(async move {
            match session.change_password(existing, next).await {
                Ok(()) => {
                    set_message.set(Some("Password changed".to_string()));
                    current.set(String::new());
                    new_password.set(String::new());
                    confirm.set(String::new());
                }
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_saving.set(false);
        });
    };

    let password_input = move |placeholder: &'static str, value: RwSignal<String>| {
        view! {
            <input
                type="password"
                placeholder=placeholder
                class="input input-bordered"
                on:input=move |ev| value.set(event_target_value(&ev))
                prop:value=value
            />
        }
    };

    view! {
        <div class="card bg-base-100 shadow">
            <div class="card-body gap-3">
                <h2 class="card-title">"Change Password"</h2>
                {needs_current.then(|| password_input("Current password", current))}
                {password_input("New password", new_password)}
                {password_input("Confirm new password", confirm)}
                <div class="card-actions justify-end">
                    <button class="btn btn-secondary" on:click=on_change disabled=move || saving.get()>
                        {move || if saving.get() { "Updating..." } else { "Change Password" }}
                    </button>
                </div>
            </div>
        </div>
    }
}

#[component]
fn DangerZone(
    set_message: WriteSignal<Option<String>>,
    set_error_msg: WriteSignal<Option<String>>,
) -> impl IntoView {
    let session = use_session();
    let api = use_api_handle();
    let open = RwSignal::new(false);
    let (deleting, set_deleting) = signal(false);

    let on_confirm = Callback::new(move |()| {
        let Some(token) = session.token_untracked() else {
            return;
        };
        set_deleting.set(true);
        set_error_msg.set(None);
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&DeleteUserRequest, Some(&token)).await {
                Ok(_) => {
                    log::info!("[Profile] account deleted");
                    set_message.set(Some("Account deleted successfully. Redirecting...".to_string()));
                    open.set(false);
                    session.logout();
                }
                Err(e) => {
                    set_error_msg.set(Some(e.user_message().to_string()));
                    open.set(false);
                }
            }
            set_deleting.set(false);
        });
    });

    view! {
        <div class="card bg-base-100 shadow border border-error/30">
            <div class="card-body">
                <h2 class="card-title text-error">"Delete Account"</h2>
                <p class="text-sm opacity-70">"This permanently removes your account and its data."</p>
                <div class="card-actions justify-end">
                    <button class="btn btn-error btn-outline" on:click=move |_| open.set(true)>
                        "Delete Account"
                    </button>
                </div>
            </div>
        </div>
        <ConfirmDialog
            open=open
            title="Delete account?"
            message=Signal::derive(|| "This action cannot be undone.".to_string())
            busy=deleting
            on_confirm=on_confirm
        />
    }
}
