//! 邮箱验证：等待页与验证链接落地页

use std::cell::Cell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::{CheckVerificationStatusRequest, ResendVerificationRequest, VerifyEmailRequest};

use crate::api::{use_api, use_api_handle};
use crate::components::common::{AuthCard, ErrorAlert, SuccessAlert};
use crate::components::icons::Mail;
use crate::config::VERIFICATION_POLL_INTERVAL;
use crate::session::{LOGIN_PATH, use_session};
use crate::web::location::{encode_component, query_param};
use crate::web::router::{Link, use_router};
use crate::web::timer::{Poller, bind_to_owner};

const DASHBOARD_PATH: &str = "/dashboard";

#[component]
pub fn CheckEmailPage() -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let api = use_api_handle();

    // 邮件里的链接可能落到这里
    if let Some(token) = query_param("token").filter(|t| !t.is_empty()) {
        router.redirect(&format!("/verify-email?token={}", encode_component(&token)));
        return view! { <div></div> }.into_any();
    }

    let email = query_param("email")
        .filter(|e| !e.is_empty())
        .or_else(|| session.identity().map(|me| me.email));

    let (verified, set_verified) = signal(false);
    let (resending, set_resending) = signal(false);
    let (notice, set_notice) = signal(Option::<String>::None);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    if let Some(address) = email.clone() {
        let done = Rc::new(Cell::new(false));
        let api = api.get_value();
        let poller = Poller::start(VERIFICATION_POLL_INTERVAL, move || {
            if done.get() {
                return;
            }
            let api = api.clone();
            let done = done.clone();
            let request = CheckVerificationStatusRequest { email: address.clone() };
            spawn_local(async move {
                match api.call(&request, None).await {
                    Ok(status) if status.is_verified && !done.get() => {
                        done.set(true);
                        set_verified.set(true);
                        log::info!("[Verify] email verified");
                        if session.token_untracked().is_some() {
                            if let Err(e) = session.reload_profile().await {
                                log::warn!("[Verify] profile reload failed: {}", e);
                            }
                            router.navigate(DASHBOARD_PATH);
                        } else {
                            router.navigate(LOGIN_PATH);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("[Verify] status check failed: {}", e),
                }
            });
        });
        bind_to_owner(poller);
    } else {
        set_error_msg.set(Some("Email not found. Please try signing up again.".to_string()));
    }

    let has_email = email.is_some();
    let email_label = email.clone().unwrap_or_else(|| "your inbox".to_string());
    let resend_email = email;
    let on_resend = move |_| {
        let Some(address) = resend_email.clone() else {
            return;
        };
        set_resending.set(true);
        set_notice.set(None);
        set_error_msg.set(None);
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&ResendVerificationRequest { email: address }, None).await {
                Ok(_) => set_notice.set(Some(
                    "Verification email sent successfully! Please check your email.".to_string(),
                )),
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_resending.set(false);
        });
    };

    view! {
        <AuthCard title="Check Your Email">
            <div class="flex flex-col items-center gap-4 text-center">
                <Mail attr:class="h-12 w-12 text-primary" />
                <p>
                    "We sent a verification link to "
                    <span class="font-semibold">{email_label}</span>
                    ". This page continues automatically once you verify."
                </p>
                <ErrorAlert message=error_msg />
                <SuccessAlert message=notice />
                <Show
                    when=move || verified.get()
                    fallback=|| view! {
                        <div class="flex items-center gap-2 text-sm opacity-70">
                            <span class="loading loading-dots loading-sm"></span>
                            "Waiting for verification"
                        </div>
                    }
                >
                    <div class="badge badge-success">"Verified"</div>
                </Show>
                <button
                    class="btn btn-outline btn-sm"
                    on:click=on_resend
                    disabled=move || resending.get() || !has_email
                >
                    {move || if resending.get() { "Sending..." } else { "Resend verification email" }}
                </button>
                <Link to=LOGIN_PATH class="link link-hover text-sm">"Back to login"</Link>
            </div>
        </AuthCard>
    }
    .into_any()
}

#[derive(Clone, Debug, PartialEq)]
enum VerifyState {
    Verifying,
    Verified,
    Failed(String),
}

#[component]
pub fn VerifyEmailPage(token: Option<String>) -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let api = use_api();
    let (state, set_state) = signal(VerifyState::Verifying);

    match token.or_else(|| query_param("token")).filter(|t| !t.is_empty()) {
        Some(token) => spawn_local(async move {
            match api.call(&VerifyEmailRequest { token }, None).await {
                Ok(_) => {
                    set_state.set(VerifyState::Verified);
                    if session.token_untracked().is_some() {
                        if let Err(e) = session.reload_profile().await {
                            log::warn!("[Verify] profile reload failed: {}", e);
                        }
                    }
                }
                Err(e) => set_state.set(VerifyState::Failed(e.user_message().to_string())),
            }
        }),
        None => router.redirect(LOGIN_PATH),
    }

    let signed_in = session.is_authenticated_signal();

    view! {
        <AuthCard title="Email Verification">
            <div class="flex flex-col items-center gap-4 text-center">
                {move || match state.get() {
                    VerifyState::Verifying => view! {
                        <span class="loading loading-spinner loading-lg text-primary"></span>
                        <p>"Verifying your email..."</p>
                    }.into_any(),
                    VerifyState::Verified => view! {
                        <div class="badge badge-success badge-lg">"Verified"</div>
                        <p>"Your email has been verified."</p>
                        {move || if signed_in.get() {
                            view! { <Link to=DASHBOARD_PATH class="btn btn-primary">"Go to Dashboard"</Link> }.into_any()
                        } else {
                            view! { <Link to=LOGIN_PATH class="btn btn-primary">"Continue to Login"</Link> }.into_any()
                        }}
                    }.into_any(),
                    VerifyState::Failed(message) => view! {
                        <div role="alert" class="alert alert-error text-sm">{message}</div>
                        <Link to="/check-email" class="btn btn-outline">"Request a new link"</Link>
                    }.into_any(),
                }}
            </div>
        </AuthCard>
    }
}
