//! 会话管理
//!
//! `SessionManager` 负责会话状态的所有转换：启动恢复、登录、登出、
//! 刷新令牌、更新资料。它只通过注入的存储、HTTP 客户端和跳转器与外界交互，
//! 因此可以在原生测试中完整驱动。
//! `SessionContext` 把当前会话作为信号提供给组件树。

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::{
    ChangePasswordRequest, LogoutRequest, ProfileRequest, RefreshRequest, UpdateUserRequest,
};
use schoolhub_shared::{
    Identity, IdentityPatch, SESSION_STORAGE_KEYS, STORAGE_ACCESS_TOKEN_KEY,
    STORAGE_REFRESH_TOKEN_KEY, STORAGE_USER_KEY, Session,
};

use crate::error::{ApiError, ApiResult};
use crate::gateway::Gateway;
use crate::web::http::{FetchClient, HttpClient};
use crate::web::location::BrowserNavigator;
use crate::web::storage::{BrowserStorage, KeyValueStore};

/// 登出与会话失效后的默认落点
pub const LOGIN_PATH: &str = "/login";

/// 整页跳转
pub trait Navigator {
    fn hard_redirect(&self, path: &str);
}

/// 清除所有持久化的会话键
pub fn clear_persisted<S: KeyValueStore>(store: &S) {
    for key in SESSION_STORAGE_KEYS {
        store.remove(key);
    }
}

/// 网关的 401 钩子：清空会话键并整页跳转到登录页
///
/// 并发的多个 401 各自跳转一次，结果相同。
pub fn unauthorized_hook<S, N>(store: S, navigator: N) -> impl Fn() + 'static
where
    S: KeyValueStore + 'static,
    N: Navigator + 'static,
{
    move || {
        clear_persisted(&store);
        navigator.hard_redirect(LOGIN_PATH);
    }
}

pub struct SessionManager<S, C, N> {
    store: S,
    gateway: Rc<Gateway<C>>,
    navigator: N,
}

impl<S: Clone, C, N: Clone> Clone for SessionManager<S, C, N> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: self.gateway.clone(),
            navigator: self.navigator.clone(),
        }
    }
}

impl<S, C, N> SessionManager<S, C, N>
where
    S: KeyValueStore,
    C: HttpClient,
    N: Navigator,
{
    pub fn new(store: S, gateway: Rc<Gateway<C>>, navigator: N) -> Self {
        Self {
            store,
            gateway,
            navigator,
        }
    }

    pub fn gateway(&self) -> &Rc<Gateway<C>> {
        &self.gateway
    }

    fn persist_identity(&self, identity: &Identity) {
        match serde_json::to_string(identity) {
            Ok(json) => self.store.set(STORAGE_USER_KEY, &json),
            Err(e) => log::error!("failed to persist identity: {}", e),
        }
    }

    /// 启动恢复
    ///
    /// 存储中有身份和令牌时用令牌请求一次资料接口；任何失败都静默清空存储，
    /// 返回未登录会话。
    pub async fn restore(&self) -> Session {
        let stored_user = self.store.get(STORAGE_USER_KEY);
        let stored_access = self.store.get(STORAGE_ACCESS_TOKEN_KEY);
        let (Some(user_json), Some(access)) = (stored_user, stored_access) else {
            return Session::signed_out();
        };

        let identity = match serde_json::from_str::<Identity>(&user_json) {
            Ok(identity) => identity,
            Err(e) => {
                log::warn!("stored identity is unreadable, clearing session: {}", e);
                clear_persisted(&self.store);
                return Session::signed_out();
            }
        };

        match self.gateway.call_quietly(&ProfileRequest, Some(&access)).await {
            Ok(_) => {
                log::info!("session restored for {}", identity.email);
                let refresh = self.store.get(STORAGE_REFRESH_TOKEN_KEY);
                Session::authenticated(identity, access, refresh)
            }
            Err(e) => {
                log::info!("stored session rejected, clearing: {}", e);
                clear_persisted(&self.store);
                Session::signed_out()
            }
        }
    }

    /// 登录：整体覆盖内存与存储中的会话，没有刷新令牌时删除旧值
    pub fn login(&self, identity: Identity, access_token: String, refresh_token: Option<String>) -> Session {
        self.persist_identity(&identity);
        self.store.set(STORAGE_ACCESS_TOKEN_KEY, &access_token);
        match &refresh_token {
            Some(refresh) => self.store.set(STORAGE_REFRESH_TOKEN_KEY, refresh),
            None => self.store.remove(STORAGE_REFRESH_TOKEN_KEY),
        }
        Session::authenticated(identity, access_token, refresh_token)
    }

    /// 清空存储并整页跳转
    pub fn logout(&self, redirect_target: Option<&str>) {
        clear_persisted(&self.store);
        self.navigator
            .hard_redirect(redirect_target.unwrap_or(LOGIN_PATH));
    }

    /// 通知后端注销（尽力而为），然后登出
    pub async fn sign_out(&self, session: &Session) {
        if let Some(token) = session.access_token.as_deref() {
            let request = LogoutRequest {
                refresh_token: session.refresh_token.clone(),
            };
            if let Err(e) = self.gateway.call_quietly(&request, Some(token)).await {
                log::warn!("logout request failed: {}", e);
            }
        }
        self.logout(None);
    }

    /// 用刷新令牌换取新的访问令牌；任何失败都会登出，不做重试
    pub async fn refresh(&self, session: &Session) -> ApiResult<Session> {
        match self.try_refresh(session).await {
            Ok(next) => Ok(next),
            Err(e) => {
                log::warn!("token refresh failed: {}", e);
                self.logout(Some(LOGIN_PATH));
                Err(e)
            }
        }
    }

    async fn try_refresh(&self, session: &Session) -> ApiResult<Session> {
        let refresh_token = session
            .refresh_token
            .clone()
            .ok_or_else(|| ApiError::not_authenticated().in_op("session.refresh"))?;
        let response = self
            .gateway
            .call(&RefreshRequest { refresh_token }, None)
            .await
            .map_err(|e| e.in_op("session.refresh"))?;

        self.store
            .set(STORAGE_ACCESS_TOKEN_KEY, &response.access_token);
        let mut next = session.clone();
        next.access_token = Some(response.access_token);
        if let Some(rotated) = response.refresh_token {
            self.store.set(STORAGE_REFRESH_TOKEN_KEY, &rotated);
            next.refresh_token = Some(rotated);
        }
        Ok(next)
    }

    /// 提交资料修改，以服务端返回的用户为准替换身份
    pub async fn update_identity(&self, session: &Session, patch: IdentityPatch) -> ApiResult<Session> {
        let response = self
            .gateway
            .call(&UpdateUserRequest(patch), session.access_token.as_deref())
            .await
            .map_err(|e| e.in_op("session.update_identity"))?;
        Ok(self.set_identity(session, response.into_identity()))
    }

    /// 以权威来源（资料接口、OAuth 回调）替换身份
    pub fn set_identity(&self, session: &Session, identity: Identity) -> Session {
        self.persist_identity(&identity);
        Session {
            identity: Some(identity),
            ..session.clone()
        }
    }

    /// 重新拉取资料（例如邮箱验证完成之后）
    pub async fn reload_profile(&self, session: &Session) -> ApiResult<Session> {
        let response = self
            .gateway
            .call(&ProfileRequest, session.access_token.as_deref())
            .await
            .map_err(|e| e.in_op("session.reload_profile"))?;
        Ok(self.set_identity(session, response.into_identity()))
    }

    /// 修改密码，不改变本地状态
    pub async fn change_password(&self, session: &Session, current: &str, new: &str) -> ApiResult<()> {
        let request = ChangePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        self.gateway
            .call(&request, session.access_token.as_deref())
            .await
            .map(|_| ())
    }
}

// =========================================================
// Leptos 上下文
// =========================================================

pub type AppSessionManager = SessionManager<BrowserStorage, FetchClient, BrowserNavigator>;

/// 会话上下文
///
/// 包含读写信号，通过 Context 在组件间共享。只有这里会写入会话。
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub session: ReadSignal<Session>,
    set_session: WriteSignal<Session>,
    manager: StoredValue<AppSessionManager, LocalStorage>,
}

impl SessionContext {
    pub fn new(manager: AppSessionManager) -> Self {
        let (session, set_session) = signal(Session::restoring());
        Self {
            session,
            set_session,
            manager: StoredValue::new_local(manager),
        }
    }

    fn manager(&self) -> AppSessionManager {
        self.manager.get_value()
    }

    /// 认证状态信号（注入路由服务）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let session = self.session;
        Signal::derive(move || session.with(Session::is_authenticated))
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.with(|s| s.identity.clone())
    }

    pub fn token_untracked(&self) -> Option<String> {
        self.session.with_untracked(|s| s.access_token.clone())
    }

    /// 启动时恢复会话，期间 `loading = true`
    pub fn restore(self) {
        spawn_local(async move {
            let restored = self.manager().restore().await;
            self.set_session.set(restored);
        });
    }

    pub fn login(&self, identity: Identity, access_token: String, refresh_token: Option<String>) {
        let next = self.manager().login(identity, access_token, refresh_token);
        self.set_session.set(next);
    }

    pub fn logout(&self) {
        self.set_session.set(Session::signed_out());
        self.manager().logout(None);
    }

    pub async fn sign_out(self) {
        let current = self.session.get_untracked();
        self.set_session.set(Session::signed_out());
        self.manager().sign_out(&current).await;
    }

    pub async fn update_identity(self, patch: IdentityPatch) -> ApiResult<()> {
        let current = self.session.get_untracked();
        let next = self.manager().update_identity(&current, patch).await?;
        self.set_session.set(next);
        Ok(())
    }

    pub fn set_identity(&self, identity: Identity) {
        let current = self.session.get_untracked();
        self.set_session
            .set(self.manager().set_identity(&current, identity));
    }

    pub async fn reload_profile(self) -> ApiResult<()> {
        let current = self.session.get_untracked();
        let next = self.manager().reload_profile(&current).await?;
        self.set_session.set(next);
        Ok(())
    }

    pub async fn change_password(self, current_password: String, new_password: String) -> ApiResult<()> {
        let current = self.session.get_untracked();
        self.manager()
            .change_password(&current, &current_password, &new_password)
            .await
    }
}

/// 从 Context 获取会话上下文
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>().expect("SessionContext should be provided")
}
