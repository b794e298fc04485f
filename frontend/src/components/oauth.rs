//! OAuth 登录后的三个页面：回调、设置密码、完善资料

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::Identity;
use schoolhub_shared::protocol::{AutoVerifyOAuthRequest, SetPasswordRequest};
use schoolhub_shared::school::{self, RoleFields};

use crate::api::{use_api, use_api_handle};
use crate::components::common::{AuthCard, ErrorAlert, SubmitButton};
use crate::components::signup::{GradeSelect, SectionSelect, SubjectSelect};
use crate::config::OAUTH_FAILURE_REDIRECT_DELAY;
use crate::session::{LOGIN_PATH, use_session};
use crate::web::location::query_param;
use crate::web::router::use_router;
use crate::web::timer::{after, bind_to_owner};

const SET_PASSWORD_PATH: &str = "/set-password";
const COMPLETE_PROFILE_PATH: &str = "/complete-profile";

#[derive(Debug, PartialEq, Eq)]
enum CallbackError {
    Missing,
    Invalid,
}

impl CallbackError {
    fn message(&self) -> &'static str {
        match self {
            CallbackError::Missing => "No token or user data found. Please try logging in again.",
            CallbackError::Invalid => "Authentication failed. Redirecting to login...",
        }
    }
}

/// 从回调查询参数中取出令牌与用户
fn parse_callback(
    access_token: Option<String>,
    user: Option<String>,
) -> Result<(Identity, String), CallbackError> {
    let (Some(token), Some(user)) = (
        access_token.filter(|t| !t.is_empty()),
        user.filter(|u| !u.is_empty()),
    ) else {
        return Err(CallbackError::Missing);
    };
    let identity: Identity = serde_json::from_str(&user).map_err(|e| {
        log::warn!("[OAuth] user payload is not valid JSON: {}", e);
        CallbackError::Invalid
    })?;
    if identity.id.is_empty() {
        return Err(CallbackError::Invalid);
    }
    Ok((identity, token))
}

/// 没有本地密码的账户先去设置密码
fn next_step(identity: &Identity) -> &'static str {
    if identity.has_password == Some(true) {
        COMPLETE_PROFILE_PATH
    } else {
        SET_PASSWORD_PATH
    }
}

#[component]
pub fn OAuthCallbackPage() -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let api = use_api();
    let (status, set_status) = signal("Processing login...".to_string());

    match parse_callback(query_param("accessToken"), query_param("user")) {
        Ok((identity, token)) => {
            let target = next_step(&identity);
            let needs_verify = !identity.is_verified;
            session.login(identity, token.clone(), None);
            set_status.set("Login successful! Redirecting...".to_string());

            spawn_local(async move {
                // Google 已验证过邮箱，这里同步给后端
                if needs_verify {
                    match api.call(&AutoVerifyOAuthRequest, Some(&token)).await {
                        Ok(_) => {
                            if let Some(mut me) = session.identity() {
                                me.is_verified = true;
                                session.set_identity(me);
                            }
                        }
                        Err(e) => log::warn!("[OAuth] auto-verify failed: {}", e),
                    }
                }
                router.redirect(target);
            });
        }
        Err(e) => {
            set_status.set(e.message().to_string());
            bind_to_owner(after(OAUTH_FAILURE_REDIRECT_DELAY, move || {
                router.redirect(LOGIN_PATH);
            }));
        }
    }

    view! {
        <div class="flex flex-col justify-center items-center gap-4 min-h-screen bg-base-200">
            <span class="loading loading-spinner loading-lg text-primary"></span>
            <p class="text-lg">{status}</p>
        </div>
    }
}

#[component]
pub fn SetPasswordPage() -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let api = use_api_handle();

    let (password, set_password) = signal(String::new());
    let (confirm, set_confirm) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let password = password.get_untracked();
        if let Err(message) = school::validate_new_password(&password, Some(&confirm.get_untracked())) {
            set_error_msg.set(Some(message));
            return;
        }
        let Some(token) = session.token_untracked() else {
            router.redirect(LOGIN_PATH);
            return;
        };

        set_is_submitting.set(true);
        set_error_msg.set(None);
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&SetPasswordRequest { password }, Some(&token)).await {
                Ok(response) => {
                    match response.user {
                        Some(user) => session.set_identity(user),
                        None => {
                            if let Some(mut me) = session.identity() {
                                me.has_password = Some(true);
                                session.set_identity(me);
                            }
                        }
                    }
                    router.navigate(COMPLETE_PROFILE_PATH);
                }
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <AuthCard title="Set Your Password" subtitle="Add a password so you can also sign in with email">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <ErrorAlert message=error_msg />
                <input
                    type="password"
                    placeholder="New password"
                    class="input input-bordered"
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                    prop:value=password
                    required
                />
                <input
                    type="password"
                    placeholder="Confirm password"
                    class="input input-bordered"
                    on:input=move |ev| set_confirm.set(event_target_value(&ev))
                    prop:value=confirm
                    required
                />
                <SubmitButton busy=is_submitting label="Save Password" busy_label="Saving..." class="btn btn-primary mt-2" />
                <button
                    type="button"
                    class="btn btn-ghost btn-sm"
                    on:click=move |_| router.navigate(COMPLETE_PROFILE_PATH)
                >
                    "Skip for now"
                </button>
            </form>
        </AuthCard>
    }
}

#[component]
pub fn CompleteProfilePage() -> impl IntoView {
    let session = use_session();
    let router = use_router();

    let me = session.identity();
    let role = RwSignal::new(me.as_ref().map(|m| m.role).unwrap_or_default());
    let grade = RwSignal::new(me.as_ref().and_then(|m| m.grade.clone()).unwrap_or_default());
    let section = RwSignal::new(me.as_ref().and_then(|m| m.section.clone()).unwrap_or_default());
    let subject = RwSignal::new(me.and_then(|m| m.subject).unwrap_or_default());
    let fields = move || RoleFields::for_role(role.get());

    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let role = role.get_untracked();
        let fields = RoleFields::for_role(role);
        let (g, s, sub) = (grade.get_untracked(), section.get_untracked(), subject.get_untracked());
        if let Some(missing) = fields.missing(&g, &s, &sub) {
            set_error_msg.set(Some(format!("Please select a {}", missing)));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);
        let patch = fields.patch(role, &g, &s, &sub);
        spawn_local(async move {
            match session.update_identity(patch).await {
                Ok(()) => router.navigate("/dashboard"),
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <AuthCard title="Complete Your Profile" subtitle="Tell us about your role at school">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <ErrorAlert message=error_msg />
                <select
                    class="select select-bordered"
                    on:change=move |ev| {
                        role.set(schoolhub_shared::Role::parse(&event_target_value(&ev)));
                        grade.set(String::new());
                        section.set(String::new());
                        subject.set(String::new());
                    }
                >
                    {schoolhub_shared::Role::ALL.into_iter().map(|r| view! {
                        <option value=r.as_str() selected=move || role.get() == r>{r.as_str()}</option>
                    }).collect_view()}
                </select>
                <Show when=move || fields().grade>
                    <GradeSelect value=grade />
                </Show>
                <Show when=move || fields().section>
                    <SectionSelect value=section />
                </Show>
                <Show when=move || fields().subject>
                    <SubjectSelect value=subject />
                </Show>
                <SubmitButton busy=is_submitting label="Continue" busy_label="Saving..." class="btn btn-primary mt-2" />
            </form>
        </AuthCard>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_requires_token_and_user() {
        assert_eq!(parse_callback(None, Some("{}".into())), Err(CallbackError::Missing));
        assert_eq!(parse_callback(Some("t".into()), None), Err(CallbackError::Missing));
        assert_eq!(
            parse_callback(Some("".into()), Some(r#"{"_id":"u1"}"#.into())),
            Err(CallbackError::Missing)
        );
    }

    #[test]
    fn callback_rejects_bad_user_payload() {
        assert_eq!(
            parse_callback(Some("t".into()), Some("not json".into())),
            Err(CallbackError::Invalid)
        );
        assert_eq!(
            parse_callback(Some("t".into()), Some(r#"{"fullName":"No Id"}"#.into())),
            Err(CallbackError::Invalid)
        );
    }

    #[test]
    fn password_state_decides_next_page() {
        let (identity, token) = parse_callback(
            Some("tok".into()),
            Some(r#"{"_id":"u1","email":"a@b.c","hasPassword":true}"#.into()),
        )
        .unwrap();
        assert_eq!(token, "tok");
        assert_eq!(next_step(&identity), COMPLETE_PROFILE_PATH);

        let mut without = identity.clone();
        without.has_password = Some(false);
        assert_eq!(next_step(&without), SET_PASSWORD_PATH);
        without.has_password = None;
        assert_eq!(next_step(&without), SET_PASSWORD_PATH);
    }
}
