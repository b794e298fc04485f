use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::{ForgotPasswordRequest, ResetPasswordRequest};
use schoolhub_shared::school;

use crate::api::use_api_handle;
use crate::components::common::{AuthCard, ErrorAlert, SubmitButton, SuccessAlert};
use crate::session::LOGIN_PATH;
use crate::web::router::{Link, use_router};
use crate::web::timer::{Timeout, after};

const RESET_REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[component]
pub fn ForgotPasswordPage() -> impl IntoView {
    let api = use_api_handle();
    let (email, set_email) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (success_msg, set_success_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let email = email.get_untracked().trim().to_string();
        if email.is_empty() {
            set_error_msg.set(Some("Please enter your email".to_string()));
            return;
        }
        set_is_submitting.set(true);
        set_error_msg.set(None);
        set_success_msg.set(None);

        let api = api.get_value();
        spawn_local(async move {
            match api.call(&ForgotPasswordRequest { email }, None).await {
                Ok(response) => set_success_msg.set(Some(response.message.unwrap_or_else(|| {
                    "If that account exists, a reset link is on its way.".to_string()
                }))),
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <AuthCard title="Forgot Password" subtitle="We will email you a reset link">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <ErrorAlert message=error_msg />
                <SuccessAlert message=success_msg />
                <input
                    type="email"
                    placeholder="you@school.edu"
                    class="input input-bordered"
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    prop:value=email
                    required
                />
                <SubmitButton busy=is_submitting label="Send Reset Link" busy_label="Sending..." class="btn btn-primary mt-2" />
            </form>
            <Link to=LOGIN_PATH class="link link-hover text-sm text-center mt-4">"Back to login"</Link>
        </AuthCard>
    }
}

#[component]
pub fn ResetPasswordPage(token: String) -> impl IntoView {
    let router = use_router();
    let api = use_api_handle();
    let (password, set_password) = signal(String::new());
    let (confirm, set_confirm) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (success_msg, set_success_msg) = signal(Option::<String>::None);
    let redirect = StoredValue::new_local(Option::<Timeout>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let new_password = password.get_untracked();
        if let Err(message) = school::validate_new_password(&new_password, Some(&confirm.get_untracked())) {
            set_error_msg.set(Some(message));
            return;
        }
        set_is_submitting.set(true);
        set_error_msg.set(None);

        let api = api.get_value();
        let request = ResetPasswordRequest {
            token: token.clone(),
            new_password,
        };
        spawn_local(async move {
            match api.call(&request, None).await {
                Ok(_) => {
                    set_success_msg.set(Some("Password reset! Redirecting to login...".to_string()));
                    redirect.set_value(Some(after(RESET_REDIRECT_DELAY, move || {
                        router.navigate(LOGIN_PATH)
                    })));
                }
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <AuthCard title="Reset Password">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <ErrorAlert message=error_msg />
                <SuccessAlert message=success_msg />
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
                    placeholder="Confirm new password"
                    class="input input-bordered"
                    on:input=move |ev| set_confirm.set(event_target_value(&ev))
                    prop:value=confirm
                    required
                />
                <SubmitButton busy=is_submitting label="Reset Password" busy_label="Resetting..." class="btn btn-primary mt-2" />
            </form>
        </AuthCard>
    }
}
