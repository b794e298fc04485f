//! SchoolHub 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `gateway` / `api`: 请求网关与业务接口
//! - `session` / `theme`: 会话与主题状态管理
//! - `chat`: 聊天室消息协调
//! - `components`: UI 组件层

mod api;
mod chat;
mod config;
mod error;
mod gateway;
mod guard;
mod session;
mod theme;

mod components {
    pub mod admin;
    pub mod assistant;
    pub mod attendance;
    pub mod chat;
    mod common;
    pub mod dashboard;
    mod icons;
    mod layout;
    pub mod lesson_plan;
    pub mod login;
    pub mod oauth;
    pub mod password;
    pub mod profile;
    pub mod settings;
    pub mod signup;
    pub mod verification;
}

// 浏览器原生 API 封装模块
pub(crate) mod web;

#[cfg(test)]
mod test_support;

use std::rc::Rc;

use leptos::prelude::*;

use crate::api::{Api, provide_api};
use crate::components::admin::{AttendanceReportPage, LessonPlanReportPage, ManageUsersPage};
use crate::components::assistant::{AssistantKind, AssistantPage};
use crate::components::attendance::{
    AttendanceListPage, AttendanceRecordPage, CreateAttendancePage, TakeAttendancePage,
};
use crate::components::chat::ChatPage;
use crate::components::dashboard::DashboardPage;
use crate::components::lesson_plan::{
    CheckLessonPlansPage, LessonPlanDetailPage, LessonPlanFormPage, LessonPlannerPage,
    RejectionReasonsPage,
};
use crate::components::login::LoginPage;
use crate::components::oauth::{CompleteProfilePage, OAuthCallbackPage, SetPasswordPage};
use crate::components::password::{ForgotPasswordPage, ResetPasswordPage};
use crate::components::profile::ProfilePage;
use crate::components::settings::SettingsPage;
use crate::components::signup::SignupPage;
use crate::components::verification::{CheckEmailPage, VerifyEmailPage};
use crate::config::AppConfig;
use crate::gateway::Gateway;
use crate::session::{SessionContext, SessionManager, unauthorized_hook};
use crate::theme::{ThemeContext, ThemeStore};
use crate::web::http::FetchClient;
use crate::web::location::BrowserNavigator;
use crate::web::route::AppRoute;
use crate::web::router::{Link, Router, RouterOutlet};
use crate::web::storage::BrowserStorage;

/// 安装浏览器控制台 logger
pub fn init_logging() {
    web::logger::init();
}

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Signup => view! { <SignupPage /> }.into_any(),
        AppRoute::CheckEmail => view! { <CheckEmailPage /> }.into_any(),
        AppRoute::VerifyEmail(token) => view! { <VerifyEmailPage token=token /> }.into_any(),
        AppRoute::ForgotPassword => view! { <ForgotPasswordPage /> }.into_any(),
        AppRoute::ResetPassword(token) => view! { <ResetPasswordPage token=token /> }.into_any(),
        AppRoute::OAuthCallback => view! { <OAuthCallbackPage /> }.into_any(),
        AppRoute::SetPassword => view! { <SetPasswordPage /> }.into_any(),
        AppRoute::CompleteProfile => view! { <CompleteProfilePage /> }.into_any(),

        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::Chat => view! { <ChatPage /> }.into_any(),
        AppRoute::Settings => view! { <SettingsPage /> }.into_any(),
        AppRoute::Profile => view! { <ProfilePage /> }.into_any(),

        AppRoute::LessonPlanner => view! { <LessonPlannerPage /> }.into_any(),
        AppRoute::CreateLessonPlan => view! { <LessonPlanFormPage /> }.into_any(),
        AppRoute::EditLessonPlan(id) => view! { <LessonPlanFormPage id=id /> }.into_any(),
        AppRoute::LessonPlanDetail(id) => view! { <LessonPlanDetailPage id=id /> }.into_any(),
        AppRoute::CheckLessonPlans => view! { <CheckLessonPlansPage /> }.into_any(),
        AppRoute::RejectionReasons => view! { <RejectionReasonsPage /> }.into_any(),

        AppRoute::AttendanceList(scope) => view! { <AttendanceListPage scope=scope /> }.into_any(),
        AppRoute::CreateAttendance(scope) => {
            view! { <CreateAttendancePage scope=scope /> }.into_any()
        }
        AppRoute::TakeAttendance(scope, count) => {
            view! { <TakeAttendancePage scope=scope count=count /> }.into_any()
        }
        AppRoute::ViewAttendance(scope, id) => {
            view! { <AttendanceRecordPage scope=scope id=id /> }.into_any()
        }

        AppRoute::ManageUsers => view! { <ManageUsersPage /> }.into_any(),
        AppRoute::LessonPlanReport => view! { <LessonPlanReportPage /> }.into_any(),
        AppRoute::AttendanceReport => view! { <AttendanceReportPage /> }.into_any(),

        AppRoute::HomeworkHelper => view! { <AssistantPage kind=AssistantKind::Homework /> }.into_any(),
        AppRoute::ParentAssistant => view! { <AssistantPage kind=AssistantKind::Parent /> }.into_any(),

        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                    <Link to="/dashboard" class="btn btn-primary mt-6">"Go to Dashboard"</Link>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 配置
    let config = AppConfig::load();
    log::info!("[App] api base {}", config.api_base_url);

    // 2. 请求网关：401 时清空会话并回到登录页
    let gateway = Rc::new(
        Gateway::new(FetchClient, config.api_base_url.clone())
            .with_unauthorized_hook(unauthorized_hook(BrowserStorage, BrowserNavigator)),
    );
    provide_context(config);

    // 3. 会话上下文，启动时从 LocalStorage 恢复
    let session = SessionContext::new(SessionManager::new(
        BrowserStorage,
        gateway.clone(),
        BrowserNavigator,
    ));
    provide_context(session);
    session.restore();

    provide_api(Api::new(gateway.clone()));

    // 4. 主题随身份切换
    let theme = ThemeContext::new(ThemeStore::new(BrowserStorage, gateway), session);
    provide_context(theme);

    view! {
        <div class=move || theme.theme.with(|t| format!("min-h-screen {}", t.class))>
            // 5. 路由器组件：注入会话信号实现守卫
            <Router session=Signal::from(session.session)>
                <RouterOutlet matcher=route_matcher />
            </Router>
        </div>
    }
}
