//! 聊天消息模型与时间线
//!
//! `ChatTimeline` 负责乐观发送、服务端回显确认、删除与向前翻页的合并逻辑。
//! 它不做任何 I/O，页面层把网络事件喂给它，再根据结果重绘。

use crate::date::Timestamp;
use crate::identity::Identity;
use crate::CHAT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 对方停止输入后提示保留的时长
pub const TYPING_EXPIRY_MS: u32 = 3_000;
/// 本端发送 userTyping 的最小间隔
pub const TYPING_THROTTLE_MS: i64 = 1_000;

// =========================================================
// 消息
// =========================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderSnapshot {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl From<&Identity> for SenderSnapshot {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            full_name: identity.full_name.clone(),
            email: identity.email.clone(),
            profile_picture: identity.avatar.clone(),
        }
    }
}

/// 被回复的消息：可能只是 id，也可能是完整嵌入的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyRef {
    Id(String),
    Message(Box<ChatMessage>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// 服务端确认后才有的 id
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    /// 客户端生成的关联 id，由服务端原样回显
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// 仅用于渲染的稳定键，由时间线分配
    #[serde(skip)]
    pub local_id: u64,
    #[serde(default)]
    pub sender: Option<SenderSnapshot>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Timestamp::now")]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub room: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyRef>,
}

impl ChatMessage {
    pub fn is_confirmed(&self) -> bool {
        self.server_id.is_some()
    }

    pub fn sender_id(&self) -> Option<&str> {
        self.sender.as_ref().map(|s| s.id.as_str())
    }

    pub fn sender_name(&self) -> &str {
        self.sender
            .as_ref()
            .map(|s| s.full_name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown sender")
    }

    /// 列表渲染键
    pub fn key(&self) -> String {
        format!("m{}", self.local_id)
    }
}

/// 发往服务端的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub content: String,
    pub room: String,
    pub reply_to: Option<String>,
    pub timestamp: Timestamp,
    pub client_id: String,
}

impl OutgoingMessage {
    /// 空白内容返回 None
    pub fn new(content: &str, room: &str, reply_to: Option<&ChatMessage>) -> Option<Self> {
        if content.trim().is_empty() {
            return None;
        }
        Some(Self {
            content: content.to_string(),
            room: room.to_string(),
            reply_to: reply_to.and_then(|m| m.server_id.clone()),
            timestamp: Timestamp::now(),
            client_id: Uuid::new_v4().to_string(),
        })
    }

    /// 生成本地乐观条目
    pub fn to_local(&self, sender: SenderSnapshot, reply_to: Option<ChatMessage>) -> ChatMessage {
        ChatMessage {
            server_id: None,
            client_id: Some(self.client_id.clone()),
            local_id: 0,
            sender: Some(sender),
            content: self.content.clone(),
            timestamp: self.timestamp,
            room: self.room.clone(),
            reply_to: reply_to.map(|m| ReplyRef::Message(Box::new(m))),
        }
    }
}

// =========================================================
// 实时通道事件
// =========================================================

/// 客户端 → 服务端
///
/// 以 `{"event", "data"}` 形式序列化，线上帧格式见 [`wire`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinRoom(String),
    ChatMessage(OutgoingMessage),
    /// 删除成功后通知房间内其他人，服务端以 `messageDeleted` 广播
    DeleteMessage {
        #[serde(rename = "messageId")]
        message_id: String,
        room: String,
    },
    UserTyping(String),
}

/// 服务端 → 客户端
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    ChatMessage(ChatMessage),
    MessageDeleted(String),
    UserTyping(String),
}

// =========================================================
// 时间线
// =========================================================

/// 回显合并的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// 无发送者或重复消息
    Ignored,
    /// 替换了本地乐观条目
    Confirmed,
    Appended,
}

#[derive(Debug, Clone)]
pub struct ChatTimeline {
    messages: Vec<ChatMessage>,
    has_more: bool,
    loading_more: bool,
    next_local_id: u64,
}

impl Default for ChatTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTimeline {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            has_more: true,
            loading_more: false,
            next_local_id: 1,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    fn assign_key(&mut self, mut msg: ChatMessage) -> ChatMessage {
        msg.local_id = self.next_local_id;
        self.next_local_id += 1;
        msg
    }

    fn holds(&self, server_id: &str) -> bool {
        self.messages
            .iter()
            .any(|m| m.server_id.as_deref() == Some(server_id))
    }

    pub fn find(&self, server_id: &str) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .find(|m| m.server_id.as_deref() == Some(server_id))
    }

    /// 解析回复引用：嵌入的消息直接返回，id 则在时间线中查找
    pub fn resolve_reply<'a>(&'a self, reply: &'a ReplyRef) -> Option<&'a ChatMessage> {
        match reply {
            ReplyRef::Message(m) => Some(m.as_ref()),
            ReplyRef::Id(id) => self.find(id),
        }
    }

    /// 追加乐观条目
    pub fn push_local(&mut self, msg: ChatMessage) {
        let msg = self.assign_key(msg);
        self.messages.push(msg);
    }

    /// 合并一条服务端推送的消息
    ///
    /// 1. 无发送者、或 id 已存在 → 忽略
    /// 2. clientId 命中未确认条目 → 原位替换
    /// 3. 无 clientId 且发送者是自己 → 替换最早的 (毫秒时间戳, 发送者) 相同的未确认条目
    /// 4. 其余追加
    pub fn apply_incoming(&mut self, msg: ChatMessage, me: Option<&str>) -> Reconciled {
        let Some(sender_id) = msg.sender_id().map(str::to_string) else {
            return Reconciled::Ignored;
        };
        if let Some(id) = msg.server_id.as_deref() {
            if self.holds(id) {
                return Reconciled::Ignored;
            }
        }

        let pending = |m: &ChatMessage| !m.is_confirmed();
        let slot = match msg.client_id.as_deref() {
            Some(cid) => self
                .messages
                .iter()
                .position(|m| pending(m) && m.client_id.as_deref() == Some(cid)),
            None if me == Some(sender_id.as_str()) => {
                let ms = msg.timestamp.as_millis();
                self.messages.iter().position(|m| {
                    pending(m)
                        && m.timestamp.as_millis() == ms
                        && m.sender_id() == Some(sender_id.as_str())
                })
            }
            None => None,
        };

        match slot {
            Some(idx) => {
                let local_id = self.messages[idx].local_id;
                self.messages[idx] = ChatMessage { local_id, ..msg };
                Reconciled::Confirmed
            }
            None => {
                let msg = self.assign_key(msg);
                self.messages.push(msg);
                Reconciled::Appended
            }
        }
    }

    /// 按服务端 id 删除，不存在时无操作
    pub fn remove(&mut self, server_id: &str) -> bool {
        let before = self.messages.len();
        self.messages
            .retain(|m| m.server_id.as_deref() != Some(server_id));
        self.messages.len() != before
    }

    /// 首屏历史到达
    ///
    /// 请求期间经通道到达的消息（含未确认的乐观条目）保持原顺序接在历史之后；
    /// 历史中已有的 id、以及 clientId 已被历史确认的乐观条目不再重复保留。
    pub fn replace_history(&mut self, page: Vec<ChatMessage>) {
        self.has_more = page.len() == CHAT_PAGE_SIZE;
        self.loading_more = false;

        let in_page = |m: &ChatMessage| {
            page.iter().any(|p| match (&m.server_id, &m.client_id) {
                (Some(id), _) => p.server_id.as_ref() == Some(id),
                (None, Some(cid)) => p.client_id.as_ref() == Some(cid),
                (None, None) => false,
            })
        };
        let live: Vec<ChatMessage> = std::mem::take(&mut self.messages)
            .into_iter()
            .filter(|m| !in_page(m))
            .collect();

        let mut merged: Vec<ChatMessage> = page.into_iter().map(|m| self.assign_key(m)).collect();
        merged.extend(live);
        self.messages = merged;
    }

    /// 首屏历史失败：清空并停止翻页
    pub fn fail_history(&mut self) {
        self.messages.clear();
        self.has_more = false;
        self.loading_more = false;
    }

    /// 最早一条消息的分页游标
    pub fn oldest_cursor(&self) -> Option<String> {
        self.messages.first().map(|m| m.timestamp.to_cursor())
    }

    /// 尝试开始加载更早的消息，条件满足时返回游标并置位加载标记
    pub fn begin_load_more(&mut self) -> Option<String> {
        if !self.has_more || self.loading_more {
            return None;
        }
        let cursor = self.oldest_cursor()?;
        self.loading_more = true;
        Some(cursor)
    }

    /// 把更早的一页插到头部，跳过已持有的消息，不改动已有部分
    pub fn prepend_older(&mut self, page: Vec<ChatMessage>) {
        self.loading_more = false;
        if page.len() < CHAT_PAGE_SIZE {
            self.has_more = false;
        }
        let fresh: Vec<ChatMessage> = page
            .into_iter()
            .filter(|m| m.server_id.as_deref().is_none_or(|id| !self.holds(id)))
            .collect();
        let fresh: Vec<ChatMessage> = fresh.into_iter().map(|m| self.assign_key(m)).collect();
        self.messages.splice(0..0, fresh);
    }

    /// 更早一页失败：只清除加载标记
    pub fn abort_load_more(&mut self) {
        self.loading_more = false;
    }
}

// =========================================================
// 输入提示
// =========================================================

/// 对方输入提示与本端节流
///
/// 每次收到对方的 userTyping 都会递增代数，过期回调只有在代数未变时才生效。
#[derive(Debug, Clone, Default)]
pub struct TypingIndicator {
    active: bool,
    generation: u64,
    last_emitted_ms: Option<i64>,
}

impl TypingIndicator {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 处理收到的 userTyping；来自自己时返回 None，否则返回本次代数
    pub fn on_remote(&mut self, user_id: &str, me: Option<&str>) -> Option<u64> {
        if me == Some(user_id) {
            return None;
        }
        self.active = true;
        self.generation += 1;
        Some(self.generation)
    }

    /// 过期回调；被更新的事件取代时返回 false
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.active = false;
        true
    }

    /// 本端输入时是否应当发出 userTyping（至多每秒一次）
    pub fn should_emit(&mut self, now_ms: i64) -> bool {
        match self.last_emitted_ms {
            Some(last) if now_ms - last < TYPING_THROTTLE_MS => false,
            _ => {
                self.last_emitted_ms = Some(now_ms);
                true
            }
        }
    }
}

pub mod wire;

#[cfg(test)]
mod tests;
