//! Socket.IO v4 帧编解码
//!
//! 通道跑在 Engine.IO 4 的 websocket 传输上：每个文本帧以一位 Engine.IO 包类型开头，
//! 消息包（`4`）内再以一位 Socket.IO 包类型开头。只处理默认命名空间的文本事件。
//!
//! 连接流程：服务端 `0{...}` → 客户端 `40{"token":..}` → 服务端 `40{"sid":..}`，
//! 此后双方以 `42["name",data]` 交换事件，服务端 `2` 心跳由客户端 `3` 应答。

use serde_json::Value;

use super::{ClientEvent, ServerEvent};

/// 拼接在通道地址之后的握手路径
pub const HANDSHAKE_PATH: &str = "/socket.io/?EIO=4&transport=websocket";
/// 心跳应答
pub const PONG: &str = "3";
/// 离开默认命名空间
pub const DISCONNECT: &str = "41";

/// 解码后的入站帧
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Engine.IO 握手完成，应发送 CONNECT
    Open,
    /// 服务端心跳，应回 PONG
    Ping,
    /// 默认命名空间已连接
    Connected,
    /// 连接被拒，通常是令牌无效
    ConnectError(String),
    /// 服务端关闭了连接或命名空间
    Closed,
    Event(ServerEvent),
    /// 无法识别或本端不处理的帧
    Unsupported(String),
}

/// 携带访问令牌的 CONNECT 包
pub fn connect_packet(token: &str) -> String {
    format!("40{}", serde_json::json!({ "token": token }))
}

/// 编码为 `42["name",data]`
pub fn encode_event(event: &ClientEvent) -> serde_json::Result<String> {
    let mut envelope = serde_json::to_value(event)?;
    let mut field = |key: &str| envelope.get_mut(key).map(Value::take).unwrap_or_default();
    let name = field("event");
    let data = field("data");
    Ok(format!("42{}", Value::Array(vec![name, data])))
}

pub fn decode(frame: &str) -> Inbound {
    if frame.starts_with('0') {
        return Inbound::Open;
    }
    if frame.starts_with('1') {
        return Inbound::Closed;
    }
    if frame == "2" {
        return Inbound::Ping;
    }
    match frame.strip_prefix('4') {
        Some(packet) => decode_packet(packet),
        None => Inbound::Unsupported(format!("engine packet {:?}", frame)),
    }
}

fn decode_packet(packet: &str) -> Inbound {
    if packet.starts_with('0') {
        return Inbound::Connected;
    }
    if packet.starts_with('1') {
        return Inbound::Closed;
    }
    if let Some(body) = packet.strip_prefix('4') {
        return Inbound::ConnectError(connect_error_message(body));
    }
    match packet.strip_prefix('2') {
        Some(body) => match decode_event(body) {
            Ok(event) => Inbound::Event(event),
            Err(reason) => Inbound::Unsupported(reason),
        },
        None => Inbound::Unsupported(format!("socket packet {:?}", packet)),
    }
}

/// `["name",data]`，其前可能带确认 id
fn decode_event(body: &str) -> Result<ServerEvent, String> {
    if body.starts_with('/') {
        return Err("event outside the default namespace".to_string());
    }
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
    let args: Vec<Value> = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let mut args = args.into_iter();
    let name = args.next().ok_or("event without a name")?;
    let data = args.next().unwrap_or(Value::Null);
    serde_json::from_value(serde_json::json!({ "event": name, "data": data }))
        .map_err(|e| e.to_string())
}

fn connect_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// 出站事件队列：命名空间连接确认前缓存，确认后按发送顺序放行
#[derive(Debug, Default)]
pub struct OutboundQueue {
    connected: bool,
    backlog: Vec<String>,
}

impl OutboundQueue {
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// 已连接时原样返回，否则缓存
    pub fn push(&mut self, frame: String) -> Option<String> {
        if self.connected {
            return Some(frame);
        }
        self.backlog.push(frame);
        None
    }

    /// 标记已连接，取出缓存的帧
    pub fn mark_connected(&mut self) -> Vec<String> {
        self.connected = true;
        std::mem::take(&mut self.backlog)
    }
}
