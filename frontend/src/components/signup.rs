use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::Role;
use schoolhub_shared::protocol::SignupRequest;
use schoolhub_shared::school::{self, RoleFields};

use crate::api::use_api_handle;
use crate::components::common::{AuthCard, ErrorAlert, SubmitButton, SuccessAlert};
use crate::guard::CHECK_EMAIL_PATH;
use crate::web::router::{Link, use_router};

/// 注册表单状态
#[derive(Clone, Copy)]
struct SignupForm {
    full_name: RwSignal<String>,
    email: RwSignal<String>,
    password: RwSignal<String>,
    role: RwSignal<Option<Role>>,
    grade: RwSignal<String>,
    section: RwSignal<String>,
    subject: RwSignal<String>,
}

impl SignupForm {
    fn new() -> Self {
        Self {
            full_name: RwSignal::new(String::new()),
            email: RwSignal::new(String::new()),
            password: RwSignal::new(String::new()),
            role: RwSignal::new(None),
            grade: RwSignal::new(String::new()),
            section: RwSignal::new(String::new()),
            subject: RwSignal::new(String::new()),
        }
    }

    fn fields(&self) -> RoleFields {
        self.role
            .get()
            .map(RoleFields::for_role)
            .unwrap_or_default()
    }

    /// 换角色时清空角色相关字段
    fn select_role(&self, raw: &str) {
        self.role
            .set((!raw.is_empty()).then(|| Role::parse(raw)));
        self.grade.set(String::new());
        self.section.set(String::new());
        self.subject.set(String::new());
    }

    fn to_request(&self) -> Result<SignupRequest, String> {
        let password = self.password.get_untracked();
        school::validate_new_password(&password, None)?;
        let role = self
            .role
            .get_untracked()
            .ok_or_else(|| "Please select a role".to_string())?;

        let fields = RoleFields::for_role(role);
        let grade = self.grade.get_untracked();
        let section = self.section.get_untracked();
        let subject = self.subject.get_untracked();
        if let Some(missing) = fields.missing(&grade, &section, &subject) {
            return Err(format!("Please select a {}", missing));
        }
        let patch = fields.patch(role, &grade, &section, &subject);

        Ok(SignupRequest {
            full_name: self.full_name.get_untracked().trim().to_string(),
            email: self.email.get_untracked().trim().to_string(),
            password,
            role,
            grade: patch.grade,
            section: patch.section,
            subject: patch.subject,
        })
    }
}

#[component]
pub fn SignupPage() -> impl IntoView {
    let router = use_router();
    let api = use_api_handle();
    let form = SignupForm::new();

    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (success_msg, set_success_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        set_error_msg.set(None);
        set_success_msg.set(None);

        let request = match form.to_request() {
            Ok(request) => request,
            Err(message) => {
                set_error_msg.set(Some(message));
                return;
            }
        };

        set_is_submitting.set(true);
        let api = api.get_value();
        spawn_local(async move {
            match api.call(&request, None).await {
                Ok(data) => {
                    set_success_msg.set(Some("Account created successfully! Redirecting...".to_string()));
                    let target = data
                        .redirect_to
                        .filter(|to| to.starts_with('/'))
                        .unwrap_or_else(|| CHECK_EMAIL_PATH.to_string());
                    router.navigate(&target);
                }
                Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <AuthCard title="Create Account" subtitle="Join SchoolHub">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <ErrorAlert message=error_msg />
                <SuccessAlert message=success_msg />

                <input
                    type="text"
                    placeholder="Full name"
                    class="input input-bordered"
                    on:input=move |ev| form.full_name.set(event_target_value(&ev))
                    prop:value=form.full_name
                    required
                />
                <input
                    type="email"
                    placeholder="Email"
                    class="input input-bordered"
                    on:input=move |ev| form.email.set(event_target_value(&ev))
                    prop:value=form.email
                    required
                />
                <input
                    type="password"
                    placeholder="Password (min 8 characters)"
                    class="input input-bordered"
                    on:input=move |ev| form.password.set(event_target_value(&ev))
                    prop:value=form.password
                    required
                />

                <select
                    class="select select-bordered"
                    on:change=move |ev| form.select_role(&event_target_value(&ev))
                >
                    <option value="" selected=move || form.role.get().is_none()>"Select role"</option>
                    {Role::ALL.into_iter().map(|role| view! {
                        <option value=role.as_str() selected=move || form.role.get() == Some(role)>
                            {role.as_str()}
                        </option>
                    }).collect_view()}
                </select>

                <Show when=move || form.fields().grade>
                    <GradeSelect value=form.grade />
                </Show>
                <Show when=move || form.fields().section>
                    <SectionSelect value=form.section />
                </Show>
                <Show when=move || form.fields().subject>
                    <SubjectSelect value=form.subject />
                </Show>

                <SubmitButton busy=is_submitting label="Sign Up" busy_label="Creating account..." class="btn btn-primary mt-2" />
            </form>
            <p class="text-center text-sm mt-4">
                "Already have an account? "
                <Link to="/login" class="link link-primary">"Log in"</Link>
            </p>
        </AuthCard>
    }
}

#[component]
pub fn GradeSelect(value: RwSignal<String>) -> impl IntoView {
    view! {
        <select class="select select-bordered" on:change=move |ev| value.set(event_target_value(&ev))>
            <option value="" selected=move || value.get().is_empty()>"Select grade"</option>
            {school::grades().map(|g| {
                let label = format!("Grade {}", g);
                let current = g.clone();
                view! {
                    <option value=g selected=move || value.get() == current>{label}</option>
                }
            }).collect_view()}
        </select>
    }
}

#[component]
pub fn SectionSelect(value: RwSignal<String>) -> impl IntoView {
    view! {
        <select class="select select-bordered" on:change=move |ev| value.set(event_target_value(&ev))>
            <option value="" selected=move || value.get().is_empty()>"Select section"</option>
            {school::SECTIONS.into_iter().map(|s| view! {
                <option value=s selected=move || value.get() == s>{format!("Section {}", s)}</option>
            }).collect_view()}
        </select>
    }
}

#[component]
pub fn SubjectSelect(value: RwSignal<String>) -> impl IntoView {
    view! {
        <select class="select select-bordered" on:change=move |ev| value.set(event_target_value(&ev))>
            <option value="" selected=move || value.get().is_empty()>"Select subject"</option>
            {school::SUBJECTS.into_iter().map(|s| view! {
                <option value=s selected=move || value.get() == s>{s}</option>
            }).collect_view()}
        </select>
    }
}
