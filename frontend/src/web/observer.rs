//! IntersectionObserver 封装
//!
//! 聊天列表顶部哨兵进入视口时触发向前翻页。

use js_sys::Array;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry};

pub struct VisibilityObserver {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array)>,
}

impl VisibilityObserver {
    /// 观察 `target`，它进入视口时调用 `on_visible`
    pub fn observe<F>(target: &Element, on_visible: F) -> Option<Self>
    where
        F: Fn() + 'static,
    {
        let callback = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
            let visible = entries.iter().any(|entry| {
                entry
                    .dyn_into::<IntersectionObserverEntry>()
                    .map(|e| e.is_intersecting())
                    .unwrap_or(false)
            });
            if visible {
                on_visible();
            }
        });

        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| log::warn!("IntersectionObserver unavailable: {:?}", e))
            .ok()?;
        observer.observe(target);

        Some(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for VisibilityObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
