//! 消息类型定义
//!
//! 每帧负载是一个带 `type` 标签的 JSON 对象。

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::moves::Move;

/// 双方之间传递的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// 握手：主机在接受连接后立即发送，`color` 为分配给加入方的颜色
    Handshake { color: Color },
    /// 走棋
    Move {
        #[serde(rename = "move")]
        mv: Move,
    },
    /// 对局结束通知（无需应答）
    GameOver { message: String },
}

impl Message {
    /// 消息类型标签
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Handshake { .. } => "handshake",
            Message::Move { .. } => "move",
            Message::GameOver { .. } => "game_over",
        }
    }

    /// 从 JSON 字节解码
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
