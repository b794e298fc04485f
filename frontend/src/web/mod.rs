//! 浏览器 API 封装模块
//!
//! 对 fetch、localStorage、定时器、WebSocket、History 等浏览器能力的薄封装。
//! 页面与业务逻辑只通过这里接触 web_sys。

pub mod http;
pub mod location;
pub mod logger;
pub mod observer;
pub mod route;
pub mod router;
pub mod socket;
pub mod storage;
pub mod timer;
