//! 单槽信箱
//!
//! 后台接收任务写入对手最新的一步，对局线程阻塞读取。槽位最多保存一步，
//! 未取走时再次写入会覆盖旧值；读取成功后清空槽位。

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use protocol::Move;

/// 一次等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// 取到一步走法
    Received(Move),
    /// 截止时间已到
    TimedOut,
    /// 信箱已关闭且没有待取的走法
    Closed,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<Move>,
    closed: bool,
}

/// 单槽信箱
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<Slot>,
    signal: Condvar,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 放入一步走法（覆盖未取走的旧值），返回被覆盖的旧值
    pub fn deposit(&self, mv: Move) -> Option<Move> {
        let replaced = {
            let mut slot = self.lock();
            slot.pending.replace(mv)
        };
        self.signal.notify_all();
        replaced
    }

    /// 非阻塞地取走待取的走法
    pub fn try_take(&self) -> Option<Move> {
        self.lock().pending.take()
    }

    /// 关闭信箱并唤醒所有等待者
    pub fn close(&self) {
        self.lock().closed = true;
        self.signal.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// 阻塞等待直到取到走法、信箱关闭或超时
    ///
    /// 关闭前已放入的走法仍会先被取走。虚假唤醒不会缩短等待时间。
    pub fn wait(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.lock();

        loop {
            if let Some(mv) = slot.pending.take() {
                return WaitOutcome::Received(mv);
            }
            if slot.closed {
                return WaitOutcome::Closed;
            }

            slot = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::TimedOut;
                    }
                    self.signal
                        .wait_timeout(slot, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                // 超时过大，视为无限等待
                None => self
                    .signal
                    .wait(slot)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}
