//! 实时通道（Socket.IO over WebSocket）
//!
//! 帧编解码在 `schoolhub_shared::chat::wire`。写入经由无界通道交给写任务，
//! 写任务在命名空间连接确认前缓存事件；读取循环负责握手、心跳应答，
//! 并把解析后的事件交给回调。`SocketHandle` drop 时断开连接。

use futures::channel::mpsc::{self, UnboundedSender};
use futures::future::{AbortHandle, Abortable};
use futures::{SinkExt, StreamExt};
use gloo_net::websocket::{Message, futures::WebSocket};
use leptos::task::spawn_local;
use schoolhub_shared::chat::wire::{self, Inbound, OutboundQueue};
use schoolhub_shared::{ClientEvent, ServerEvent};

use crate::chat::ChannelSink;

enum Outbound {
    /// 协议控制帧，立即发送
    Control(String),
    /// 事件帧，连接确认前缓存
    Event(String),
    /// 默认命名空间已连接
    Ready,
}

pub struct SocketHandle {
    outgoing: UnboundedSender<Outbound>,
    reader: AbortHandle,
}

impl SocketHandle {
    /// 打开 `<socket_url>/socket.io/?EIO=4&transport=websocket`，令牌随 CONNECT 包发送
    pub fn connect<F>(socket_url: &str, token: &str, on_event: F) -> Result<Self, String>
    where
        F: Fn(ServerEvent) + 'static,
    {
        let url = format!("{}{}", socket_url, wire::HANDSHAKE_PATH);
        let socket = WebSocket::open(&url).map_err(|e| e.to_string())?;
        let (mut write, mut read) = socket.split();
        let (outgoing, mut rx) = mpsc::unbounded::<Outbound>();

        spawn_local(async move {
            let mut queue = OutboundQueue::default();
            while let Some(item) = rx.next().await {
                let frames = match item {
                    Outbound::Control(frame) => vec![frame],
                    Outbound::Event(frame) => queue.push(frame).into_iter().collect(),
                    Outbound::Ready => queue.mark_connected(),
                };
                for frame in frames {
                    if let Err(e) = write.send(Message::Text(frame)).await {
                        log::warn!("socket write failed: {}", e);
                        return;
                    }
                }
            }
            let _ = write.close().await;
            log::debug!("socket writer closed");
        });

        let control = outgoing.clone();
        let token = token.to_string();
        let (reader, registration) = AbortHandle::new_pair();
        let read_loop = async move {
            while let Some(frame) = read.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Bytes(_)) => continue,
                    Err(e) => {
                        log::warn!("socket read failed: {}", e);
                        break;
                    }
                };
                let reply = match wire::decode(&text) {
                    Inbound::Open => Some(Outbound::Control(wire::connect_packet(&token))),
                    Inbound::Ping => Some(Outbound::Control(wire::PONG.to_string())),
                    Inbound::Connected => {
                        log::info!("socket joined default namespace");
                        Some(Outbound::Ready)
                    }
                    Inbound::ConnectError(reason) => {
                        log::warn!("socket connect rejected: {}", reason);
                        break;
                    }
                    Inbound::Closed => {
                        log::info!("socket closed by server");
                        break;
                    }
                    Inbound::Event(event) => {
                        on_event(event);
                        None
                    }
                    Inbound::Unsupported(reason) => {
                        log::debug!("ignoring socket frame: {}", reason);
                        None
                    }
                };
                if let Some(reply) = reply {
                    if control.unbounded_send(reply).is_err() {
                        break;
                    }
                }
            }
        };
        spawn_local(async move {
            let _ = Abortable::new(read_loop, registration).await;
        });

        log::info!("socket connecting to {}", socket_url);
        Ok(Self { outgoing, reader })
    }
}

impl ChannelSink for SocketHandle {
    fn emit(&self, event: &ClientEvent) {
        match wire::encode_event(event) {
            Ok(frame) => {
                if self.outgoing.unbounded_send(Outbound::Event(frame)).is_err() {
                    log::warn!("socket already closed, dropping event");
                }
            }
            Err(e) => log::error!("failed to encode socket event: {}", e),
        }
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        let _ = self
            .outgoing
            .unbounded_send(Outbound::Control(wire::DISCONNECT.to_string()));
        self.outgoing.close_channel();
        self.reader.abort();
    }
}
