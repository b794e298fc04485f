//! 聊天室控制器
//!
//! 持有时间线、输入提示和回复目标，把 REST 调用与实时通道事件合并进去。
//! 状态放在 `RefCell` 里，借用从不跨越 await；视图在每次变更后重新读取。

use std::cell::RefCell;
use std::rc::Rc;

use schoolhub_shared::chat::{Reconciled, SenderSnapshot, TypingIndicator};
use schoolhub_shared::protocol::{ChatMessagesRequest, DeleteMessageRequest};
use schoolhub_shared::{ChatMessage, ChatTimeline, ClientEvent, Identity, OutgoingMessage, ServerEvent};

use crate::error::ApiResult;
use crate::gateway::Gateway;
use crate::web::http::HttpClient;

/// 实时通道的发送端
pub trait ChannelSink {
    fn emit(&self, event: &ClientEvent);
}

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub timeline: ChatTimeline,
    pub typing: TypingIndicator,
    pub reply_to: Option<ChatMessage>,
    pub history_loaded: bool,
}

pub struct ChatRoom<C, K> {
    gateway: Rc<Gateway<C>>,
    sink: RefCell<Option<K>>,
    room: String,
    me: Option<Identity>,
    token: Option<String>,
    state: RefCell<ChatState>,
}

impl<C: HttpClient, K: ChannelSink> ChatRoom<C, K> {
    pub fn new(gateway: Rc<Gateway<C>>, room: &str, me: Option<Identity>, token: Option<String>) -> Self {
        Self {
            gateway,
            sink: RefCell::new(None),
            room: room.to_string(),
            me,
            token,
            state: RefCell::new(ChatState::default()),
        }
    }

    fn my_id(&self) -> Option<&str> {
        self.me.as_ref().map(|me| me.id.as_str())
    }

    fn emit(&self, event: ClientEvent) {
        match self.sink.borrow().as_ref() {
            Some(sink) => sink.emit(&event),
            None => log::debug!("channel not attached, dropping event"),
        }
    }

    /// 挂上通道并加入房间
    pub fn attach(&self, sink: K) {
        *self.sink.borrow_mut() = Some(sink);
        self.emit(ClientEvent::JoinRoom(self.room.clone()));
    }

    /// 卸下通道（drop 即断开）
    pub fn detach(&self) {
        self.sink.borrow_mut().take();
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&ChatState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// 首屏历史；任何失败都清空列表并停止翻页
    pub async fn load_history(&self) {
        let request = ChatMessagesRequest {
            room: self.room.clone(),
            with_user: None,
            before: None,
        };
        let result = self.gateway.call(&request, self.token.as_deref()).await;
        let mut state = self.state.borrow_mut();
        state.history_loaded = true;
        match result {
            Ok(page) => state.timeline.replace_history(page.messages),
            Err(e) => {
                log::warn!("failed to load chat history: {}", e);
                state.timeline.fail_history();
            }
        }
    }

    /// 向前翻页；条件不满足时不发请求，返回是否发出了请求
    pub async fn load_more(&self) -> bool {
        let Some(cursor) = self.state.borrow_mut().timeline.begin_load_more() else {
            return false;
        };
        let request = ChatMessagesRequest {
            room: self.room.clone(),
            with_user: None,
            before: Some(cursor),
        };
        let result = self.gateway.call(&request, self.token.as_deref()).await;
        let mut state = self.state.borrow_mut();
        match result {
            Ok(page) => state.timeline.prepend_older(page.messages),
            Err(e) => {
                log::warn!("failed to load older messages: {}", e);
                state.timeline.abort_load_more();
            }
        }
        true
    }

    /// 发送；空白输入忽略。乐观条目立即追加，回复目标随即清空
    pub fn send(&self, input: &str) -> bool {
        let Some(me) = self.me.as_ref() else {
            return false;
        };
        let reply_to = self.state.borrow().reply_to.clone();
        let Some(outgoing) = OutgoingMessage::new(input, &self.room, reply_to.as_ref()) else {
            return false;
        };

        {
            let mut state = self.state.borrow_mut();
            let local = outgoing.to_local(SenderSnapshot::from(me), reply_to);
            state.timeline.push_local(local);
            state.reply_to = None;
        }
        self.emit(ClientEvent::ChatMessage(outgoing));
        true
    }

    pub fn set_reply(&self, target: Option<ChatMessage>) {
        self.state.borrow_mut().reply_to = target;
    }

    /// 本端输入时调用，至多每秒发出一次 userTyping
    pub fn on_input(&self, now_ms: i64) {
        let Some(id) = self.my_id().map(str::to_string) else {
            return;
        };
        if self.state.borrow_mut().typing.should_emit(now_ms) {
            self.emit(ClientEvent::UserTyping(id));
        }
    }

    /// 处理服务端事件；对方输入时返回提示的代数，调用方据此安排过期
    pub fn on_event(&self, event: ServerEvent) -> Option<u64> {
        let me = self.my_id();
        let mut state = self.state.borrow_mut();
        match event {
            ServerEvent::ChatMessage(msg) => {
                if msg.room != self.room && !msg.room.is_empty() {
                    return None;
                }
                if state.timeline.apply_incoming(msg, me) == Reconciled::Ignored {
                    log::debug!("ignored chat echo");
                }
                None
            }
            ServerEvent::MessageDeleted(id) => {
                state.timeline.remove(&id);
                None
            }
            ServerEvent::UserTyping(user_id) => state.typing.on_remote(&user_id, me),
        }
    }

    pub fn expire_typing(&self, generation: u64) -> bool {
        self.state.borrow_mut().typing.expire(generation)
    }

    /// 删除消息（调用方负责确认）；失败时保留消息并返回错误
    pub async fn delete(&self, message_id: &str) -> ApiResult<()> {
        let request = DeleteMessageRequest {
            id: message_id.to_string(),
        };
        self.gateway.call(&request, self.token.as_deref()).await?;
        self.state.borrow_mut().timeline.remove(message_id);
        self.emit(ClientEvent::DeleteMessage {
            message_id: message_id.to_string(),
            room: self.room.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests;
