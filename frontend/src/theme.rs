//! 主题存储
//!
//! 主题在本地按用户缓存一份，登录状态下同时同步到后端。
//! 切换主题立即生效；远端同步失败只记录日志，不回滚。

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::protocol::{GetThemeRequest, UpdateThemeRequest};
use schoolhub_shared::theme::storage_key;
use schoolhub_shared::{Session, Theme};

use crate::gateway::Gateway;
use crate::session::SessionContext;
use crate::web::http::{FetchClient, HttpClient};
use crate::web::storage::{BrowserStorage, KeyValueStore};

pub struct ThemeStore<S, C> {
    store: S,
    gateway: Rc<Gateway<C>>,
}

impl<S: Clone, C> Clone for ThemeStore<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: self.gateway.clone(),
        }
    }
}

impl<S: KeyValueStore, C: HttpClient> ThemeStore<S, C> {
    pub fn new(store: S, gateway: Rc<Gateway<C>>) -> Self {
        Self { store, gateway }
    }

    pub fn read_local(&self, user_id: Option<&str>) -> Option<Theme> {
        let raw = self.store.get(&storage_key(user_id))?;
        match serde_json::from_str(&raw) {
            Ok(theme) => Some(theme),
            Err(e) => {
                log::debug!("ignoring unreadable cached theme: {}", e);
                None
            }
        }
    }

    pub fn write_local(&self, user_id: Option<&str>, theme: &Theme) {
        match serde_json::to_string(theme) {
            Ok(json) => self.store.set(&storage_key(user_id), &json),
            Err(e) => log::error!("failed to cache theme: {}", e),
        }
    }

    /// 为当前会话选出主题：远端 → 本地缓存 → 默认
    pub async fn load_for(&self, session: &Session) -> Theme {
        let user_id = session.user_id();
        if let (Some(id), Some(token)) = (user_id, session.access_token.as_deref()) {
            match self.gateway.call(&GetThemeRequest, Some(token)).await {
                Ok(response) => {
                    if let Some(theme) = response.theme {
                        self.write_local(Some(id), &theme);
                        return theme;
                    }
                }
                Err(e) => log::warn!("failed to load theme from server: {}", e),
            }
        }
        self.read_local(user_id).unwrap_or_default()
    }

    /// 立即写入本地缓存；有身份时再尽力同步到后端
    pub async fn save(&self, session: &Session, theme: Theme) {
        self.write_local(session.user_id(), &theme);
        let Some(token) = session
            .access_token
            .as_deref()
            .filter(|_| session.is_authenticated())
        else {
            return;
        };
        if let Err(e) = self
            .gateway
            .call(&UpdateThemeRequest { theme }, Some(token))
            .await
        {
            log::warn!("failed to save theme to server: {}", e);
        }
    }
}

// =========================================================
// Leptos 上下文
// =========================================================

pub type AppThemeStore = ThemeStore<BrowserStorage, FetchClient>;

#[derive(Clone, Copy)]
pub struct ThemeContext {
    pub theme: ReadSignal<Theme>,
    set_theme: WriteSignal<Theme>,
    session: SessionContext,
    store: StoredValue<AppThemeStore, LocalStorage>,
}

impl ThemeContext {
    /// 创建上下文，并在身份变化（登录、登出）时重新加载主题
    pub fn new(store: AppThemeStore, session: SessionContext) -> Self {
        let (theme, set_theme) = signal(Theme::default());
        let ctx = Self {
            theme,
            set_theme,
            session,
            store: StoredValue::new_local(store),
        };

        let identity_key = Memo::new(move |_| {
            session
                .session
                .with(|s| (s.loading, s.user_id().map(str::to_string)))
        });
        Effect::new(move |_| {
            let (loading, user_id) = identity_key.get();
            if loading {
                return;
            }
            let current = session.session.get_untracked();
            let store = ctx.store.get_value();
            spawn_local(async move {
                let theme = store.load_for(&current).await;
                // 加载期间身份已切换则丢弃结果
                let still_current = session
                    .session
                    .with_untracked(|s| s.user_id().map(str::to_string) == user_id);
                if still_current {
                    set_theme.set(theme);
                }
            });
        });

        ctx
    }

    pub fn set_theme(&self, theme: Theme) {
        self.set_theme.set(theme.clone());
        let current = self.session.session.get_untracked();
        let store = self.store.get_value();
        spawn_local(async move {
            store.save(&current, theme).await;
        });
    }

    pub fn is_light(&self) -> bool {
        self.theme.with(Theme::is_light)
    }
}

pub fn use_theme() -> ThemeContext {
    use_context::<ThemeContext>().expect("ThemeContext should be provided")
}

#[cfg(test)]
mod tests;
