//! 会话错误类型

use std::time::Duration;

use protocol::ProtocolError;
use thiserror::Error;

/// 联机会话错误
#[derive(Error, Debug)]
pub enum NetError {
    /// 绑定监听地址失败
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: ProtocolError,
    },

    /// 接受连接失败
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] ProtocolError),

    /// 连接主机失败（含连接超时）
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: ProtocolError,
    },

    /// 握手失败：首帧缺失或不是握手消息
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// 帧负载无法解码为已知消息
    #[error("Failed to decode frame: {0}")]
    FrameDecode(#[source] ProtocolError),

    /// 等待对手走棋超时
    #[error("Timed out after {0:?} waiting for opponent move")]
    Timeout(Duration),

    /// 已建立的连接断开
    #[error("Connection lost")]
    ConnectionLost,

    /// 本地输入已结束
    #[error("Local input closed")]
    InputClosed,

    /// 本地输入读取失败
    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),

    /// 无法创建网络运行时
    #[error("Failed to start network runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl NetError {
    /// 是否为等待超时（调用方自行决定是否判负）
    pub fn is_timeout(&self) -> bool {
        matches!(self, NetError::Timeout(_))
    }
}

/// 会话操作结果类型
pub type Result<T> = std::result::Result<T, NetError>;
