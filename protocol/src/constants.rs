//! 协议常量定义

use std::time::Duration;

/// 棋盘边长（8x8）
pub const BOARD_SIZE: i32 = 8;

/// 默认端口
pub const DEFAULT_PORT: u16 = 12345;

/// 主机默认绑定地址（所有网卡）
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// 加入方默认连接地址
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// 帧头大小: 4 字节大端长度
pub const FRAME_HEADER_SIZE: usize = 4;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 握手超时（秒）
pub const HANDSHAKE_TIMEOUT_SECS: u64 = 30;

/// 等待对手走棋的默认超时（秒）
pub const MOVE_TIMEOUT_SECS: u64 = 300;

/// 单次发送的写超时（秒）
pub const WRITE_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
