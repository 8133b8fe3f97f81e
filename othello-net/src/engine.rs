//! 联机走法来源
//!
//! 对局循环对每种走法来源只调用 [`MoveSource::get_move`]，
//! 不关心走法来自本地玩家、AI 还是网络对手。
//!
//! - [`HostEngine`]：主机方，本方颜色时读取本地输入并发送，否则等待对手
//! - [`JoinerEngine`]：加入方，与主机对称
//! - [`ReceiverEngine`]：始终等待网络走法

use std::sync::Arc;

use tracing::info;

use protocol::{Color, Move};

use crate::board::Board;
use crate::config::NetworkConfig;
use crate::error::Result;
use crate::input::{read_legal_move, InputSource};
use crate::session::Session;

/// 走法来源
pub trait MoveSource {
    /// 为 `color` 取得下一步
    fn get_move(&mut self, board: &dyn Board, color: Color) -> Result<Move>;
}

/// 主机与加入方共用的回合逻辑
struct NetworkPlayer {
    session: Arc<Session>,
    input: Box<dyn InputSource>,
}

impl NetworkPlayer {
    fn get_move(&mut self, board: &dyn Board, color: Color) -> Result<Move> {
        if color == self.session.local_color() {
            let legal_moves = board.legal_moves(color);
            let mv = read_legal_move(self.input.as_mut(), color, &legal_moves)?;
            self.session.send_move(mv);
            Ok(mv)
        } else {
            wait_remote(&self.session, color)
        }
    }
}

fn wait_remote(session: &Session, color: Color) -> Result<Move> {
    info!(%color, "waiting for opponent's move");
    session.wait_for_opponent()
}

/// 主机方走法来源（执先手）
pub struct HostEngine {
    player: NetworkPlayer,
}

impl HostEngine {
    /// 使用已建立的主机会话
    pub fn new(session: Arc<Session>, input: Box<dyn InputSource>) -> Self {
        Self {
            player: NetworkPlayer { session, input },
        }
    }

    /// 监听并等待加入方，握手完成后返回
    pub fn start(config: &NetworkConfig, input: Box<dyn InputSource>) -> Result<Self> {
        let session = Arc::new(Session::host(config)?);
        info!("You are playing as {}", session.local_color());
        Ok(Self::new(session, input))
    }

    /// 共享的会话，用于创建 [`ReceiverEngine`]
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.player.session)
    }
}

impl MoveSource for HostEngine {
    fn get_move(&mut self, board: &dyn Board, color: Color) -> Result<Move> {
        self.player.get_move(board, color)
    }
}

/// 加入方走法来源（颜色由握手决定）
pub struct JoinerEngine {
    player: NetworkPlayer,
}

impl JoinerEngine {
    /// 使用已建立的加入方会话
    pub fn new(session: Arc<Session>, input: Box<dyn InputSource>) -> Self {
        Self {
            player: NetworkPlayer { session, input },
        }
    }

    /// 连接主机并完成握手
    pub fn start(config: &NetworkConfig, input: Box<dyn InputSource>) -> Result<Self> {
        let session = Arc::new(Session::join(config)?);
        info!("You are playing as {}", session.local_color());
        Ok(Self::new(session, input))
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.player.session)
    }
}

impl MoveSource for JoinerEngine {
    fn get_move(&mut self, board: &dyn Board, color: Color) -> Result<Move> {
        self.player.get_move(board, color)
    }
}

/// 只接收网络走法的来源，用于对方颜色
pub struct ReceiverEngine {
    session: Arc<Session>,
}

impl ReceiverEngine {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

impl MoveSource for ReceiverEngine {
    fn get_move(&mut self, _board: &dyn Board, color: Color) -> Result<Move> {
        wait_remote(&self.session, color)
    }
}
