//! 页面共用的小组件

use leptos::prelude::*;

use crate::components::icons::GraduationCap;

/// 内联错误提示，消息为 None 时不渲染
#[component]
pub fn ErrorAlert(#[prop(into)] message: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.with(Option::is_some)>
            <div role="alert" class="alert alert-error text-sm py-2">
                <svg xmlns="http://www.w3.org/2000/svg" class="stroke-current shrink-0 h-6 w-6" fill="none" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M10 14l2-2m0 0l2-2m-2 2l-2-2m2 2l2 2m7-2a9 9 0 11-18 0 9 9 0 0118 0z" /></svg>
                <span>{move || message.get().unwrap_or_default()}</span>
            </div>
        </Show>
    }
}

#[component]
pub fn SuccessAlert(#[prop(into)] message: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.with(Option::is_some)>
            <div role="alert" class="alert alert-success text-sm py-2">
                <span>{move || message.get().unwrap_or_default()}</span>
            </div>
        </Show>
    }
}

#[component]
pub fn Spinner(#[prop(into, optional)] label: String) -> impl IntoView {
    view! {
        <div class="flex items-center justify-center gap-2 py-8 text-base-content/60">
            <span class="loading loading-spinner loading-md"></span>
            {label}
        </div>
    }
}

/// 未登录页面的居中卡片
#[component]
pub fn AuthCard(
    #[prop(into)] title: String,
    #[prop(into, optional)] subtitle: String,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4 flex flex-col items-center gap-2">
                    <div class="p-3 bg-primary/10 rounded-2xl text-primary">
                        <GraduationCap attr:class="h-8 w-8" />
                    </div>
                    <h1 class="text-3xl font-bold">{title}</h1>
                    {(!subtitle.is_empty()).then(|| view! {
                        <p class="text-base-content/70">{subtitle}</p>
                    })}
                </div>
                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <div class="card-body">{children()}</div>
                </div>
            </div>
        </div>
    }
}

/// 提交按钮：进行中时禁用并显示转圈
#[component]
pub fn SubmitButton(
    #[prop(into)] busy: Signal<bool>,
    #[prop(into)] label: String,
    #[prop(into)] busy_label: String,
    #[prop(into, optional)] class: String,
) -> impl IntoView {
    let class = if class.is_empty() {
        "btn btn-primary".to_string()
    } else {
        class
    };
    view! {
        <button type="submit" class=class disabled=move || busy.get()>
            {move || if busy.get() {
                view! { <span class="loading loading-spinner"></span> {busy_label.clone()} }.into_any()
            } else {
                label.clone().into_any()
            }}
        </button>
    }
}

/// 破坏性操作的确认框
///
/// `open` 由调用方控制；确认后调用 `on_confirm`，由调用方在完成后关闭。
#[component]
pub fn ConfirmDialog(
    open: RwSignal<bool>,
    #[prop(into)] title: String,
    #[prop(into)] message: Signal<String>,
    #[prop(into)] busy: Signal<bool>,
    #[prop(into)] on_confirm: Callback<()>,
    #[prop(into, optional)] confirm_label: Option<String>,
) -> impl IntoView {
    let dialog_ref = NodeRef::<leptos::html::Dialog>::new();
    let confirm_label = confirm_label.unwrap_or_else(|| "Delete".to_string());

    Effect::new(move |_| {
        if let Some(dialog) = dialog_ref.get() {
            if open.get() {
                if !dialog.open() {
                    let _ = dialog.show_modal();
                }
            } else if dialog.open() {
                dialog.close();
            }
        }
    });

    view! {
        <dialog class="modal" node_ref=dialog_ref on:close=move |_| open.set(false)>
            <div class="modal-box">
                <h3 class="font-bold text-lg">{title}</h3>
                <p class="py-4 text-base-content/70">{move || message.get()}</p>
                <div class="modal-action">
                    <button class="btn btn-ghost" on:click=move |_| open.set(false) disabled=move || busy.get()>
                        "Cancel"
                    </button>
                    <button class="btn btn-error" on:click=move |_| on_confirm.run(()) disabled=move || busy.get()>
                        {move || if busy.get() {
                            view! { <span class="loading loading-spinner"></span> }.into_any()
                        } else {
                            confirm_label.clone().into_any()
                        }}
                    </button>
                </div>
            </div>
        </dialog>
    }
}

/// 分页器（管理报表）
#[component]
pub fn Pager(page: RwSignal<u32>, #[prop(into)] is_last: Signal<bool>, #[prop(into)] busy: Signal<bool>) -> impl IntoView {
    view! {
        <div class="join">
            <button
                class="join-item btn btn-sm"
                disabled=move || busy.get() || page.get() <= 1
                on:click=move |_| page.update(|p| *p = p.saturating_sub(1).max(1))
            >
                "«"
            </button>
            <button class="join-item btn btn-sm btn-disabled">{move || format!("Page {}", page.get())}</button>
            <button
                class="join-item btn btn-sm"
                disabled=move || busy.get() || is_last.get()
                on:click=move |_| page.update(|p| *p += 1)
            >
                "»"
            </button>
        </div>
    }
}
