//! 定时器封装模块
//!
//! 基于 `gloo-timers`，句柄 drop 时自动清除定时器。

use std::time::Duration;

use gloo_timers::callback::Interval;
pub use gloo_timers::callback::Timeout;
use leptos::prelude::*;

fn millis(duration: Duration) -> u32 {
    duration.as_millis().min(u32::MAX as u128) as u32
}

/// 周期轮询：创建时立即执行一次，之后按间隔执行
///
/// 用于未读数和邮箱验证状态的轮询。
pub struct Poller {
    _interval: Interval,
}

impl Poller {
    pub fn start<F>(period: Duration, tick: F) -> Self
    where
        F: Fn() + 'static,
    {
        tick();
        Self {
            _interval: Interval::new(millis(period), tick),
        }
    }
}

/// 延迟执行一次
pub fn after<F>(delay: Duration, callback: F) -> Timeout
where
    F: FnOnce() + 'static,
{
    Timeout::new(millis(delay), callback)
}

/// 把定时器句柄挂到当前组件的 owner 上，组件卸载时随之释放
pub fn bind_to_owner<T: 'static>(handle: T) {
    let stored = StoredValue::new_local(Some(handle));
    on_cleanup(move || stored.set_value(None));
}
