//! 聊天页面
//!
//! 视图只持有 `ChatRoom` 的句柄和一个版本号信号：控制器状态每变一次就递增版本号，
//! 渲染闭包据此重新读取快照。

use std::rc::{Rc, Weak};
use std::time::Duration;

use leptos::html::Div;
use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::chat::{ReplyRef, TYPING_EXPIRY_MS};
use schoolhub_shared::protocol::ChatUsersRequest;
use schoolhub_shared::{ChatMessage, Identity, PUBLIC_ROOM};

use crate::api::use_api;
use crate::chat::ChatRoom;
use crate::components::common::{ConfirmDialog, ErrorAlert, Spinner};
use crate::components::icons::{Reply, Send, Trash2};
use crate::components::layout::AppLayout;
use crate::config::use_config;
use crate::session::use_session;
use crate::web::http::FetchClient;
use crate::web::observer::VisibilityObserver;
use crate::web::socket::SocketHandle;
use crate::web::timer::{Timeout, after};

type AppChatRoom = ChatRoom<FetchClient, SocketHandle>;

/// 一条消息的渲染快照
#[derive(Clone, PartialEq)]
struct MessageRow {
    key: String,
    server_id: Option<String>,
    sender: String,
    time: String,
    content: String,
    mine: bool,
    reply: Option<(String, String)>,
    message: ChatMessage,
}

/// 状态更新后的滚动方式
#[derive(Clone, Copy)]
enum ScrollIntent {
    Bottom,
    /// 向前翻页后保持视口位置
    Keep { height: i32, top: i32 },
}

fn snapshot(room: &AppChatRoom, me: Option<&str>) -> Vec<MessageRow> {
    room.with_state(|s| {
        s.timeline
            .messages()
            .iter()
            .map(|m| {
                let reply = m.reply_to.as_ref().map(|r| match s.timeline.resolve_reply(r) {
                    Some(target) => (target.sender_name().to_string(), target.content.clone()),
                    None => match r {
                        ReplyRef::Message(inner) => (inner.sender_name().to_string(), inner.content.clone()),
                        ReplyRef::Id(_) => ("Unknown sender".to_string(), "Original message unavailable".to_string()),
                    },
                });
                MessageRow {
                    key: format!("{}-{}", m.key(), m.is_confirmed()),
                    server_id: m.server_id.clone(),
                    sender: m.sender_name().to_string(),
                    time: m.timestamp.display_time(),
                    content: m.content.clone(),
                    mine: me.is_some() && m.sender_id() == me,
                    reply,
                    message: m.clone(),
                }
            })
            .collect()
    })
}

/// 距底部不超过该距离时，新消息到达会跟随滚动
const FOLLOW_THRESHOLD_PX: i32 = 80;

fn is_near_bottom(scroll_height: i32, scroll_top: i32, client_height: i32) -> bool {
    scroll_height - scroll_top - client_height <= FOLLOW_THRESHOLD_PX
}

/// 列表是否停在底部；尚未挂载时视为在底部
fn following(list: NodeRef<Div>) -> bool {
    list.get_untracked()
        .is_none_or(|el| is_near_bottom(el.scroll_height(), el.scroll_top(), el.client_height()))
}

fn scroll(list: NodeRef<Div>, intent: ScrollIntent) {
    request_animation_frame(move || {
        let Some(el) = list.get_untracked() else {
            return;
        };
        match intent {
            ScrollIntent::Bottom => el.set_scroll_top(el.scroll_height()),
            ScrollIntent::Keep { height, top } => el.set_scroll_top(el.scroll_height() - height + top),
        }
    });
}

#[component]
pub fn ChatPage() -> impl IntoView {
    let session = use_session();
    let config = use_config();
    let api = use_api();

    let me: Option<Identity> = session.identity();
    let my_id = me.as_ref().map(|m| m.id.clone());
    let token = session.token_untracked();

    let room: Rc<AppChatRoom> = Rc::new(ChatRoom::new(
        api.gateway().clone(),
        PUBLIC_ROOM,
        me,
        token.clone(),
    ));
    let room_store = StoredValue::new_local(room.clone());

    let (version, set_version) = signal(0u64);
    let bump = move || set_version.update(|v| *v = v.wrapping_add(1));
    let (channel_error, set_channel_error) = signal(Option::<String>::None);
    let (input, set_input) = signal(String::new());
    let (members, set_members) = signal(Vec::<Identity>::new());
    let list_ref = NodeRef::<Div>::new();
    let sentinel_ref = NodeRef::<Div>::new();
    let typing_timer = StoredValue::new_local(Option::<Timeout>::None);

    // --- 实时通道 ---
    if let Some(token) = token.clone() {
        let weak: Weak<AppChatRoom> = Rc::downgrade(&room);
        let on_event = move |event| {
            let Some(room) = weak.upgrade() else {
                return;
            };
            // 正在翻看更早的消息时不打断阅读位置
            let follow = following(list_ref);
            if let Some(generation) = room.on_event(event) {
                let weak = Rc::downgrade(&room);
                let timer = after(Duration::from_millis(u64::from(TYPING_EXPIRY_MS)), move || {
                    if weak.upgrade().is_some_and(|r| r.expire_typing(generation)) {
                        bump();
                    }
                });
                typing_timer.try_update_value(|t| *t = Some(timer));
            }
            bump();
            if follow {
                scroll(list_ref, ScrollIntent::Bottom);
            }
        };
        match SocketHandle::connect(&config.socket_url, &token, on_event) {
            Ok(handle) => room.attach(handle),
            Err(e) => {
                log::warn!("[Chat] realtime channel unavailable: {}", e);
                set_channel_error.set(Some("Realtime connection unavailable. Messages may be delayed.".to_string()));
            }
        }
    }

    // --- 首屏历史与成员 ---
    {
        let room = room.clone();
        spawn_local(async move {
            room.load_history().await;
            bump();
            scroll(list_ref, ScrollIntent::Bottom);
        });
    }
    {
        let api = api.clone();
        spawn_local(async move {
            match api.call(&ChatUsersRequest, token.as_deref()).await {
                Ok(response) => set_members.set(response.users),
                Err(e) => log::debug!("[Chat] member list unavailable: {}", e),
            }
        });
    }

    // --- 顶部哨兵触发向前翻页 ---
    let observer = StoredValue::new_local(Option::<VisibilityObserver>::None);
    Effect::new(move |_| {
        let Some(sentinel) = sentinel_ref.get() else {
            return;
        };
        let handle = VisibilityObserver::observe(&sentinel, move || {
            let Some(room) = room_store.try_get_value() else {
                return;
            };
            let before = list_ref
                .get_untracked()
                .map(|el| ScrollIntent::Keep { height: el.scroll_height(), top: el.scroll_top() });
            spawn_local(async move {
                if room.load_more().await {
                    bump();
                    if let Some(intent) = before {
                        scroll(list_ref, intent);
                    }
                }
            });
        });
        observer.set_value(handle);
    });

    on_cleanup(move || {
        room_store.try_with_value(|room| room.detach());
    });

    // --- 视图数据 ---
    let rows = Memo::new(move |_| {
        version.get();
        room_store
            .try_with_value(|room| snapshot(room, my_id.as_deref()))
            .unwrap_or_default()
    });
    let read_state = move |f: fn(&crate::chat::ChatState) -> bool| {
        version.get();
        room_store
            .try_with_value(|room| room.with_state(f))
            .unwrap_or(false)
    };
    let history_loaded = move || read_state(|s| s.history_loaded);
    let loading_more = move || read_state(|s| s.timeline.is_loading_more());
    let has_more = move || read_state(|s| s.timeline.has_more());
    let peer_typing = move || read_state(|s| s.typing.is_active());
    let reply_preview = move || {
        version.get();
        room_store
            .try_with_value(|room| {
                room.with_state(|s| {
                    s.reply_to
                        .as_ref()
                        .map(|m| (m.sender_name().to_string(), m.content.clone()))
                })
            })
            .flatten()
    };

    // --- 交互 ---
    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let sent = room_store
            .try_with_value(|room| room.send(&input.get_untracked()))
            .unwrap_or(false);
        if sent {
            set_input.set(String::new());
            bump();
            scroll(list_ref, ScrollIntent::Bottom);
        }
    };
    let on_input = move |ev: leptos::ev::Event| {
        set_input.set(event_target_value(&ev));
        room_store.try_with_value(|room| room.on_input(js_sys::Date::now() as i64));
    };
    let set_reply = move |target: Option<ChatMessage>| {
        room_store.try_with_value(|room| room.set_reply(target));
        bump();
    };

    let pending_delete = RwSignal::new(Option::<String>::None);
    let confirm_open = RwSignal::new(false);
    let (deleting, set_deleting) = signal(false);
    let (delete_error, set_delete_error) = signal(Option::<String>::None);
    Effect::new(move |_| {
        if !confirm_open.get() {
            pending_delete.set(None);
        }
    });

    let on_confirm_delete = Callback::new(move |()| {
        let Some(id) = pending_delete.get_untracked() else {
            return;
        };
        let Some(room) = room_store.try_get_value() else {
            return;
        };
        set_deleting.set(true);
        set_delete_error.set(None);
        spawn_local(async move {
            if let Err(e) = room.delete(&id).await {
                log::warn!("[Chat] delete failed: {}", e);
                set_delete_error.set(Some(e.user_message().to_string()));
            }
            bump();
            set_deleting.set(false);
            confirm_open.set(false);
        });
    });

    view! {
        <AppLayout title="Chat">
            <div class="flex flex-col lg:flex-row gap-4 h-[calc(100vh-10rem)]">
                <div class="card bg-base-100 shadow flex-1 min-h-0">
                    <div class="card-body p-4 min-h-0 flex flex-col">
                        <ErrorAlert message=channel_error />
                        <ErrorAlert message=delete_error />

                        <div node_ref=list_ref class="flex-1 overflow-y-auto min-h-0 pr-2">
                            <div node_ref=sentinel_ref class="h-1"></div>
                            <Show when=loading_more>
                                <Spinner label="Loading older messages" />
                            </Show>
                            <Show when=move || history_loaded() && !has_more() && !rows.with(Vec::is_empty)>
                                <p class="text-center text-xs opacity-50 py-2">"Beginning of conversation"</p>
                            </Show>
                            <Show when=history_loaded fallback=|| view! { <Spinner label="Loading messages" /> }>
                                <Show
                                    when=move || !rows.with(Vec::is_empty)
                                    fallback=|| view! { <p class="text-center opacity-60 py-12">"No messages yet. Say hello!"</p> }
                                >
                                    <For
                                        each=move || rows.get()
                                        key=|row| row.key.clone()
                                        children=move |row| {
                                            view! {
                                                <MessageBubble
                                                    row=row
                                                    on_reply=move |m| set_reply(Some(m))
                                                    on_delete=move |id| {
                                                        pending_delete.set(Some(id));
                                                        confirm_open.set(true);
                                                    }
                                                />
                                            }
                                        }
                                    />
                                </Show>
                            </Show>
                        </div>

                        <Show when=peer_typing>
                            <p class="text-xs italic opacity-60">"Someone is typing..."</p>
                        </Show>

                        {move || reply_preview().map(|(name, content)| view! {
                            <div class="alert py-2 text-sm">
                                <Reply attr:class="h-4 w-4" />
                                <div class="flex-1 min-w-0">
                                    <p class="font-semibold">{format!("Replying to {}", name)}</p>
                                    <p class="truncate opacity-70">{content}</p>
                                </div>
                                <button class="btn btn-ghost btn-xs" on:click=move |_| set_reply(None)>"✕"</button>
                            </div>
                        })}

                        <form class="join w-full mt-2" on:submit=on_submit>
                            <input
                                type="text"
                                class="input input-bordered join-item flex-1"
                                placeholder="Type a message..."
                                on:input=on_input
                                prop:value=input
                            />
                            <button type="submit" class="btn btn-primary join-item" disabled=move || input.with(|t| t.trim().is_empty())>
                                <Send attr:class="h-4 w-4" />
                            </button>
                        </form>
                    </div>
                </div>

                <aside class="card bg-base-100 shadow lg:w-64 hidden lg:flex">
                    <div class="card-body p-4">
                        <h2 class="card-title text-base">"Members"</h2>
                        <ul class="flex flex-col gap-2 overflow-y-auto">
                            {move || members.get().into_iter().map(|m| view! {
                                <li class="flex items-center gap-2">
                                    <div class="avatar placeholder">
                                        <div class="bg-neutral text-neutral-content w-8 rounded-full">
                                            <span class="text-xs">{m.initial()}</span>
                                        </div>
                                    </div>
                                    <div class="min-w-0">
                                        <p class="text-sm truncate">{m.display_name().to_string()}</p>
                                        <p class="text-xs opacity-60">{m.role.as_str()}</p>
                                    </div>
                                </li>
                            }).collect_view()}
                        </ul>
                    </div>
                </aside>
            </div>

            <ConfirmDialog
                open=confirm_open
                title="Delete message?"
                message=Signal::derive(|| "This message will be removed for everyone.".to_string())
                busy=deleting
                on_confirm=on_confirm_delete
            />
        </AppLayout>
    }
}

#[component]
fn MessageBubble(
    row: MessageRow,
    on_reply: impl Fn(ChatMessage) + 'static,
    on_delete: impl Fn(String) + 'static,
) -> impl IntoView {
    let side = if row.mine { "chat chat-end" } else { "chat chat-start" };
    let bubble = if row.mine { "chat-bubble chat-bubble-primary" } else { "chat-bubble" };
    let pending = row.server_id.is_none();
    let deletable = row.mine.then(|| row.server_id.clone()).flatten();
    let message = row.message.clone();

    view! {
        <div class=side>
            <div class="chat-header text-xs opacity-70 flex gap-2">
                {row.sender.clone()}
                <time>{row.time.clone()}</time>
            </div>
            <div class=format!("{} whitespace-pre-wrap", bubble) class:opacity-60=pending>
                {row.reply.clone().map(|(name, content)| view! {
                    <div class="border-l-2 border-current/40 pl-2 mb-1 text-xs opacity-80">
                        <p class="font-semibold">{name}</p>
                        <p class="truncate">{content}</p>
                    </div>
                })}
                {row.content.clone()}
            </div>
            <div class="chat-footer flex gap-1 mt-1">
                {pending.then(|| view! { <span class="text-xs opacity-50">"Sending..."</span> })}
                <button class="btn btn-ghost btn-xs" title="Reply" on:click=move |_| on_reply(message.clone())>
                    <Reply attr:class="h-3 w-3" />
                </button>
                {deletable.map(|id| view! {
                    <button class="btn btn-ghost btn-xs text-error" title="Delete" on:click=move |_| on_delete(id.clone())>
                        <Trash2 attr:class="h-3 w-3" />
                    </button>
                })}
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_only_when_close_to_bottom() {
        // 内容 1000，视口 400
        assert!(is_near_bottom(1000, 600, 400));
        assert!(is_near_bottom(1000, 540, 400));
        assert!(!is_near_bottom(1000, 300, 400));
        assert!(!is_near_bottom(1000, 0, 400));
        // 内容不足一屏
        assert!(is_near_bottom(300, 0, 400));
    }
}
