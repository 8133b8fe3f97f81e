//! 连接管理器
//!
//! 一方监听（主机），一方连接（加入方）。主机接受连接后立即发送握手，
//! 为加入方分配后手颜色；之后由后台接收任务把对手走法放入单槽信箱，
//! 对局线程通过阻塞的 [`Session::wait_for_move`] 取走。
//!
//! 对外接口全部是同步的：会话内部持有一个小型 tokio 运行时，
//! 因此不要在异步上下文中创建或丢弃会话。

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use protocol::{
    Color, Connection, Connector, FrameReader, FrameWriter, Listener, Message, Move, TcpConnector,
    TcpListener,
};

use crate::config::NetworkConfig;
use crate::error::{NetError, Result};
use crate::mailbox::{Mailbox, WaitOutcome};
use crate::receiver;
use crate::state::{SessionState, StateCell};

/// 会话中的角色，由调用的建立方式决定，与颜色无关
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// 监听方
    Host,
    /// 连接方
    Joiner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Joiner => f.write_str("joiner"),
        }
    }
}

/// 接收任务与对局线程共享的状态
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) state: StateCell,
    pub(crate) mailbox: Mailbox,
    game_over: Mutex<Option<String>>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 标记会话关闭并唤醒等待者
    pub(crate) fn mark_closed(&self) -> bool {
        let transitioned = self.state.close();
        self.mailbox.close();
        transitioned
    }

    pub(crate) fn record_game_over(&self, message: String) {
        *lock(&self.game_over) = Some(message);
    }

    pub(crate) fn game_over_message(&self) -> Option<String> {
        lock(&self.game_over).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 加入方读取首帧，必须是握手消息
async fn read_handshake<C: Connection>(
    conn: &mut C,
    handshake_timeout: Duration,
) -> Result<Color> {
    let msg: Message = timeout(handshake_timeout, conn.recv())
        .await
        .map_err(|_| NetError::Handshake("timed out waiting for handshake".into()))?
        .map_err(|e| NetError::Handshake(e.to_string()))?;

    match msg {
        Message::Handshake { color } => Ok(color),
        other => Err(NetError::Handshake(format!(
            "expected handshake, got {}",
            other.kind()
        ))),
    }
}

fn build_runtime() -> Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("othello-net")
        .enable_all()
        .build()
        .map_err(NetError::Runtime)
}

/// 已绑定、尚未接受连接的主机
pub struct HostListener {
    runtime: Runtime,
    listener: TcpListener,
    shared: Arc<Shared>,
    config: NetworkConfig,
}

impl HostListener {
    /// 实际监听地址（绑定端口 0 时可由此得知端口）
    pub fn local_addr(&self) -> Option<String> {
        self.listener.local_addr()
    }

    /// 接受唯一一个连接并发送握手
    pub fn accept(self) -> Result<Session> {
        let HostListener {
            runtime,
            mut listener,
            shared,
            config,
        } = self;

        let mut conn = runtime
            .block_on(listener.accept())
            .map_err(NetError::Accept)?;
        let peer_addr = conn.peer_addr();
        info!(peer = ?peer_addr, "client connected");

        shared.state.advance(SessionState::Handshaking);
        let handshake = Message::Handshake {
            color: Color::SECOND,
        };
        runtime
            .block_on(conn.send(&handshake))
            .map_err(|e| NetError::Handshake(format!("failed to send handshake: {}", e)))?;
        debug!(color = %Color::SECOND, "handshake sent");

        let (reader, writer) = conn.split();

        let local_addr = listener.local_addr();
        let session = Session {
            runtime,
            role: Role::Host,
            local_color: Color::FIRST,
            shared,
            writer: Mutex::new(Some(writer)),
            listener: Mutex::new(Some(listener)),
            receiver: Mutex::new(None),
            peer_addr,
            local_addr,
            move_timeout: config.move_timeout(),
            write_timeout: config.write_timeout(),
        };
        session.start_receiver(reader);
        info!(color = %Color::FIRST, "playing as host");
        Ok(session)
    }
}

/// 一条已建立的联机会话
pub struct Session {
    runtime: Runtime,
    role: Role,
    local_color: Color,
    shared: Arc<Shared>,
    writer: Mutex<Option<FrameWriter<OwnedWriteHalf>>>,
    listener: Mutex<Option<TcpListener>>,
    receiver: Mutex<Option<JoinHandle<()>>>,
    peer_addr: Option<String>,
    local_addr: Option<String>,
    move_timeout: Duration,
    write_timeout: Duration,
}

impl Session {
    /// 绑定监听地址，返回等待接受连接的主机
    pub fn listen(config: &NetworkConfig) -> Result<HostListener> {
        let runtime = build_runtime()?;
        let shared = Arc::new(Shared::new());
        let addr = config.bind_addr();

        shared.state.advance(SessionState::Listening);
        let listener = runtime
            .block_on(TcpListener::bind(&addr))
            .map_err(|source| NetError::Bind {
                addr: addr.clone(),
                source,
            })?
            .with_max_frame_size(config.max_frame_size);
        info!(addr = ?listener.local_addr(), "waiting for client connection");

        Ok(HostListener {
            runtime,
            listener,
            shared,
            config: config.clone(),
        })
    }

    /// 作为主机：绑定、接受一个连接、发送握手（本方执先手）
    pub fn host(config: &NetworkConfig) -> Result<Session> {
        Self::listen(config)?.accept()
    }

    /// 作为加入方：连接主机并等待握手分配颜色
    pub fn join(config: &NetworkConfig) -> Result<Session> {
        let runtime = build_runtime()?;
        let shared = Arc::new(Shared::new());
        let addr = config.server_addr();

        shared.state.advance(SessionState::Dialing);
        info!(%addr, "connecting to host");
        let connector = TcpConnector::new(config.connect_timeout(), config.max_frame_size);
        let mut conn = runtime
            .block_on(connector.connect(&addr))
            .map_err(|source| NetError::Connect {
                addr: addr.clone(),
                source,
            })?;
        let peer_addr = conn.peer_addr();
        info!(%addr, "connected to host");

        shared.state.advance(SessionState::Handshaking);
        let local_color =
            runtime.block_on(read_handshake(&mut conn, config.handshake_timeout()))?;
        let (reader, writer) = conn.split();
        info!(color = %local_color, "handshake received");

        let session = Session {
            runtime,
            role: Role::Joiner,
            local_color,
            shared,
            writer: Mutex::new(Some(writer)),
            listener: Mutex::new(None),
            receiver: Mutex::new(None),
            peer_addr,
            local_addr: None,
            move_timeout: config.move_timeout(),
            write_timeout: config.write_timeout(),
        };
        session.start_receiver(reader);
        Ok(session)
    }

    fn start_receiver(&self, reader: FrameReader<OwnedReadHalf>) {
        self.shared.state.advance(SessionState::Connected);
        let handle = self
            .runtime
            .spawn(receiver::run(reader, Arc::clone(&self.shared)));
        *lock(&self.receiver) = Some(handle);
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// 本方颜色
    pub fn local_color(&self) -> Color {
        self.local_color
    }

    /// 对方颜色
    pub fn remote_color(&self) -> Color {
        self.local_color.opponent()
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.get()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    pub fn peer_addr(&self) -> Option<&str> {
        self.peer_addr.as_deref()
    }

    /// 主机的监听地址
    pub fn local_addr(&self) -> Option<&str> {
        self.local_addr.as_deref()
    }

    /// 默认的等待走棋超时
    pub fn move_timeout(&self) -> Duration {
        self.move_timeout
    }

    /// 对方发来的对局结束通知
    pub fn game_over_message(&self) -> Option<String> {
        self.shared.game_over_message()
    }

    fn send(&self, msg: &Message) -> bool {
        if self.shared.state.is_closed() {
            debug!(kind = msg.kind(), "session closed, message dropped");
            return false;
        }

        let mut writer = lock(&self.writer);
        let Some(writer) = writer.as_mut() else {
            return false;
        };

        // 对方长期不读时写入会阻塞，限时避免占住写端导致 close 无法返回
        let written = self
            .runtime
            .block_on(async { timeout(self.write_timeout, writer.write_frame(msg)).await });
        match written {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, kind = msg.kind(), "failed to send, closing session");
                self.shared.mark_closed();
                false
            }
            Err(_) => {
                warn!(
                    kind = msg.kind(),
                    timeout = ?self.write_timeout,
                    "send timed out, closing session"
                );
                self.shared.mark_closed();
                false
            }
        }
    }

    /// 发送本方走法
    ///
    /// 写失败时会话转为关闭，不向调用方报错；返回值表示是否成功写出。
    /// 会话关闭后调用不做任何事。
    pub fn send_move(&self, mv: Move) -> bool {
        let sent = self.send(&Message::Move { mv });
        if sent {
            info!(%mv, "sent move");
        }
        sent
    }

    /// 通知对方对局结束，语义同 [`Session::send_move`]
    pub fn send_game_over(&self, message: impl Into<String>) -> bool {
        self.send(&Message::GameOver {
            message: message.into(),
        })
    }

    /// 阻塞等待对手的下一步
    ///
    /// 超时返回 [`NetError::Timeout`]，信箱状态不受影响，之后到达的走法
    /// 仍会交给下一次调用。会话已关闭（主动关闭或连接断开）且没有待取走法时
    /// 不再等满时限，立即以 [`NetError::Timeout`] 结束；需要区分原因时调用
    /// [`Session::ensure_connected`]。
    pub fn wait_for_move(&self, timeout: Duration) -> Result<Move> {
        match self.shared.mailbox.wait(timeout) {
            WaitOutcome::Received(mv) => Ok(mv),
            WaitOutcome::TimedOut | WaitOutcome::Closed => Err(NetError::Timeout(timeout)),
        }
    }

    /// 会话已关闭时返回 [`NetError::ConnectionLost`]
    pub fn ensure_connected(&self) -> Result<()> {
        if self.shared.state.is_closed() {
            Err(NetError::ConnectionLost)
        } else {
            Ok(())
        }
    }

    /// 以配置的默认超时等待对手的下一步
    pub fn wait_for_opponent(&self) -> Result<Move> {
        self.wait_for_move(self.move_timeout)
    }

    /// 关闭会话，可重复调用
    ///
    /// 会唤醒正在等待走法的线程，停止接收任务并关闭连接与监听套接字。
    pub fn close(&self) {
        if self.shared.mark_closed() {
            info!(role = %self.role, "closing session");
        }

        if let Some(handle) = lock(&self.receiver).take() {
            handle.abort();
        }
        if let Some(mut writer) = lock(&self.writer).take() {
            if let Err(e) = self.runtime.block_on(writer.shutdown()) {
                debug!(error = %e, "shutdown after close");
            }
        }
        lock(&self.listener).take();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("local_color", &self.local_color)
            .field("state", &self.state())
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}
