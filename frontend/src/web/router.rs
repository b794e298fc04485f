//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，所有对 window.history 的操作都集中在此模块。
//! 导航只负责更新地址与当前路由；访问控制由出口组件按守卫结果处理。

use leptos::prelude::*;
use schoolhub_shared::Session;
use wasm_bindgen::prelude::*;

use super::location::{current_path, current_search, encode_component, query_param};
use super::route::AppRoute;
use crate::guard::{self, CHECK_EMAIL_PATH, GuardDecision};

/// 当前完整地址（路径 + 查询串）
fn current_location() -> String {
    format!("{}{}", current_path(), current_search())
}

/// 推送 History 状态（内部工具函数）
fn push_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 替换 History 状态（内部工具函数，用于重定向）
fn replace_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 路由器服务
///
/// 通过 Signal 驱动界面更新，会话信号由外部注入。
#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    /// 当前完整地址，未登录跳转时作为 `from` 带回
    location: ReadSignal<String>,
    set_location: WriteSignal<String>,
    session: Signal<Session>,
}

impl RouterService {
    fn new(session: Signal<Session>) -> Self {
        let location = current_location();
        let (current_route, set_route) = signal(AppRoute::from_path(&location));
        let (location, set_location) = signal(location);

        Self {
            current_route,
            set_route,
            location,
            set_location,
            session,
        }
    }

    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    pub fn location(&self) -> ReadSignal<String> {
        self.location
    }

    /// 导航到站内路径（可带查询串）
    pub fn navigate(&self, path: &str) {
        self.go(path, true);
    }

    /// 重定向：替换当前历史记录
    pub fn redirect(&self, path: &str) {
        self.go(path, false);
    }

    fn go(&self, path: &str, use_push: bool) {
        if use_push {
            push_history_state(path);
        } else {
            replace_history_state(path);
        }
        self.set_location.set(path.to_string());
        self.set_route.set(AppRoute::from_path(path));
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let set_route = self.set_route;
        let set_location = self.set_location;

        let closure = Closure::<dyn Fn()>::new(move || {
            let location = current_location();
            set_route.set(AppRoute::from_path(&location));
            set_location.set(location);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 已登录用户停留在登录/注册页时，转到 `from` 或面板
    fn setup_auth_redirect(&self) {
        let router = *self;
        let session = self.session;

        Effect::new(move |_| {
            let is_auth = session.with(|s| !s.loading && s.is_authenticated());
            let route = router.current_route().get_untracked();
            if is_auth && route.should_redirect_when_authenticated() {
                let target = guard::return_target(query_param("from"));
                log::info!("[Router] already signed in, redirecting to {}", target);
                router.redirect(&target);
            }
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(session: Signal<Session>) -> RouterService {
    let router = RouterService::new(session);

    router.init_popstate_listener();
    router.setup_auth_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
#[component]
pub fn Router(
    /// 会话信号
    session: Signal<Session>,
    children: Children,
) -> impl IntoView {
    provide_router(session);

    children()
}

/// 路由出口组件
///
/// 对当前路由求守卫结果：放行时渲染匹配的页面，
/// 未登录/未验证时重定向，角色不符时原地显示拒绝信息。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();
    let session = router.session;

    // 只改查询串时路由不变，页面不重建
    let route = Memo::new(move |_| router.current_route().get());
    let decision = Memo::new(move |_| {
        let requested = router.location.get();
        session.with(|s| guard::evaluate(s, route.get().access(), &requested))
    });

    Effect::new(move |_| match decision.get() {
        GuardDecision::RedirectToLogin { from } => {
            log::info!("[Router] not signed in, redirecting to login");
            router.redirect(&guard::login_redirect(&from, encode_component));
        }
        GuardDecision::RedirectToVerify => {
            log::info!("[Router] email not verified, redirecting");
            router.redirect(CHECK_EMAIL_PATH);
        }
        _ => {}
    });

    move || match decision.get() {
        GuardDecision::Authorized => matcher(route.get()),
        GuardDecision::RoleDenied => view! { <AccessDenied /> }.into_any(),
        _ => view! { <PageLoading /> }.into_any(),
    }
}

#[component]
fn PageLoading() -> impl IntoView {
    view! {
        <div class="flex items-center justify-center min-h-screen">
            <span class="loading loading-spinner loading-lg"></span>
        </div>
    }
}

#[component]
fn AccessDenied() -> impl IntoView {
    view! {
        <div class="flex items-center justify-center min-h-screen">
            <div class="text-center">
                <h1 class="text-3xl font-bold text-error">"Access Denied"</h1>
                <p class="mt-4 opacity-70">"You do not have permission to view this page."</p>
                <Link to="/dashboard" class="btn btn-primary mt-6">"Back to Dashboard"</Link>
            </div>
        </div>
    }
}

/// 站内链接：拦截点击，走路由服务导航
#[component]
pub fn Link(
    #[prop(into)] to: String,
    #[prop(into, optional)] class: String,
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let target = to.clone();
    let on_click = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        router.navigate(&target);
    };

    view! {
        <a href=to class=class on:click=on_click>
            {children()}
        </a>
    }
}
