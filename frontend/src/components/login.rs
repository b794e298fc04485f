use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::LoginRequest;

use crate::api::use_api_handle;
use crate::components::common::{AuthCard, ErrorAlert, SubmitButton, SuccessAlert};
use crate::config::use_config;
use crate::guard;
use crate::session::use_session;
use crate::web::location::query_param;
use crate::web::router::{Link, use_router};

const OAUTH_VERIFIED_MESSAGE: &str = "oauth-verified";

#[component]
pub fn LoginPage() -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let api = use_api_handle();
    let config = use_config();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (success_msg, set_success_msg) = signal(Option::<String>::None);

    if query_param("message").as_deref() == Some(OAUTH_VERIFIED_MESSAGE) {
        set_success_msg.set(Some(
            "Your account has been verified! You can now log in with Google.".to_string(),
        ));
        router.redirect("/login");
    }

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let email = email.get_untracked().trim().to_string();
        let password = password.get_untracked();
        if email.is_empty() || password.is_empty() {
            set_error_msg.set(Some("Please fill in all fields".to_string()));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        let api = api.get_value();
        spawn_local(async move {
            match api.call(&LoginRequest { email, password }, None).await {
                Ok(auth) => {
                    log::info!("[Login] signed in as {}", auth.user.email);
                    session.login(auth.user, auth.access_token, auth.refresh_token);
                    router.navigate(&guard::return_target(query_param("from")));
                }
                Err(e) => {
                    log::warn!("[Login] failed: {}", e);
                    set_error_msg.set(Some(e.user_message().to_string()));
                }
            }
            set_is_submitting.set(false);
        });
    };

    let google_url = config.google_auth_url();
    let on_google = move |_| {
        if let Some(window) = web_sys::window() {
            let _ = window.location().set_href(&google_url);
        }
    };

    view! {
        <AuthCard title="Welcome Back" subtitle="Sign in to continue to SchoolHub">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <ErrorAlert message=error_msg />
                <SuccessAlert message=success_msg />

                <div class="form-control">
                    <label class="label" for="email">
                        <span class="label-text">"Email"</span>
                    </label>
                    <input
                        id="email"
                        type="email"
                        placeholder="you@school.edu"
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                        prop:value=email
                        class="input input-bordered"
                        required
                    />
                </div>
                <div class="form-control">
                    <label class="label" for="password">
                        <span class="label-text">"Password"</span>
                    </label>
                    <input
                        id="password"
                        type="password"
                        placeholder="••••••••"
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                        prop:value=password
                        class="input input-bordered"
                        required
                    />
                    <label class="label">
                        <Link to="/forgot-password" class="label-text-alt link link-hover">
                            "Forgot password?"
                        </Link>
                    </label>
                </div>
                <SubmitButton busy=is_submitting label="Sign In" busy_label="Signing in..." class="btn btn-primary mt-2" />
            </form>

            <div class="divider">"OR"</div>
            <button class="btn btn-outline" on:click=on_google>"Continue with Google"</button>

            <p class="text-center text-sm mt-4">
                "Don't have an account? "
                <Link to="/signup" class="link link-primary">"Sign up"</Link>
            </p>
        </AuthCard>
    }
}
