//! 应用配置
//!
//! 编译期从环境变量读取后端地址，其余为固定常量。

use leptos::prelude::*;
use std::time::Duration;

pub use schoolhub_shared::protocol::timeouts;

const DEFAULT_API_BASE_URL: &str = "https://mym-nexus.onrender.com/api";

/// 侧边栏未读数轮询间隔
pub const UNREAD_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// 邮箱验证状态轮询间隔
pub const VERIFICATION_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// OAuth 回调失败后返回登录页的延迟
pub const OAUTH_FAILURE_REDIRECT_DELAY: Duration = Duration::from_secs(2);
/// 管理报表每页条数
pub const REPORT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub socket_url: String,
}

impl AppConfig {
    /// 读取编译期配置
    pub fn load() -> Self {
        Self::from_base_url(option_env!("SCHOOLHUB_API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL))
    }

    pub fn from_base_url(base: &str) -> Self {
        let api_base_url = base.trim().trim_end_matches('/').to_string();
        let socket_url = socket_url_for(&api_base_url);
        Self {
            api_base_url,
            socket_url,
        }
    }

    /// OAuth 跳转入口的完整地址
    pub fn google_auth_url(&self) -> String {
        format!(
            "{}{}",
            self.api_base_url,
            schoolhub_shared::protocol::GOOGLE_AUTH_PATH
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::load()
    }
}

/// 从 Context 获取应用配置
pub fn use_config() -> AppConfig {
    use_context::<AppConfig>().unwrap_or_default()
}

/// 去掉 `/api` 后缀，并把 http(s) 换成 ws(s)
fn socket_url_for(api_base_url: &str) -> String {
    let origin = api_base_url.strip_suffix("/api").unwrap_or(api_base_url);
    if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        origin.to_string()
    }
}
