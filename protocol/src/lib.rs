//! 黑白棋联机对战共享协议库
//!
//! 包含:
//! - 执子颜色、走法坐标与代数记谱
//! - 消息类型定义 (Message)
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - 长度前缀帧编解码 (FrameReader, FrameWriter)

mod color;
mod constants;
mod error;
mod message;
mod moves;
mod transport;

pub use color::Color;
pub use constants::*;
pub use error::{ProtocolError, Result};
pub use message::Message;
pub use moves::{format_moves, Move};
pub use transport::{
    encode_frame, Connection, Connector, FrameReader, FrameWriter, Listener, TcpConnection,
    TcpConnector, TcpListener,
};
