//! window.location 相关的工具函数

use web_sys::UrlSearchParams;

use crate::session::Navigator;

pub fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

pub fn current_search() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}

/// 读取当前 URL 的查询参数（已解码）
pub fn query_param(name: &str) -> Option<String> {
    UrlSearchParams::new_with_str(&current_search())
        .ok()?
        .get(name)
        .filter(|v| !v.is_empty())
}

pub fn encode_component(value: &str) -> String {
    js_sys::encode_uri_component(value).into()
}

/// 整页跳转，丢弃所有内存状态
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn hard_redirect(&self, path: &str) {
        log::info!("hard redirect to {}", path);
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_href(path) {
                log::error!("redirect failed: {:?}", e);
            }
        }
    }
}
