//! 黑白棋双人联机对战
//!
//! 包含:
//! - 连接管理（主机监听 / 加入方连接 / 握手）
//! - 后台接收任务与单槽信箱
//! - 同步的走法收发接口
//! - 主机、加入方、纯接收三种走法来源
//! - 联机配置

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod mailbox;
mod receiver;
pub mod session;
pub mod state;

pub use board::{Board, OpenBoard};
pub use config::NetworkConfig;
pub use engine::{HostEngine, JoinerEngine, MoveSource, ReceiverEngine};
pub use error::{NetError, Result};
pub use input::{parse_input, read_legal_move, ConsoleInput, InputSource, ScriptedInput};
pub use mailbox::{Mailbox, WaitOutcome};
pub use session::{HostListener, Role, Session};
pub use state::SessionState;
