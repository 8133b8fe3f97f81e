//! 会话生命周期状态

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// 会话状态
///
/// 只能向前推进：一旦 `Closed` 就不会再回到 `Connected`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Listening = 1,
    Dialing = 2,
    Handshaking = 3,
    Connected = 4,
    Closed = 5,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Idle,
            1 => SessionState::Listening,
            2 => SessionState::Dialing,
            3 => SessionState::Handshaking,
            4 => SessionState::Connected,
            _ => SessionState::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Listening => "listening",
            SessionState::Dialing => "dialing",
            SessionState::Handshaking => "handshaking",
            SessionState::Connected => "connected",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// 原子状态单元
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(SessionState::Idle as u8))
    }

    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// 推进到 `next`，若当前状态不早于 `next` 则不变并返回 false
    pub fn advance(&self, next: SessionState) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < next as u8).then_some(next as u8)
            })
            .is_ok()
    }

    /// 标记关闭，返回本次调用是否完成了状态转换
    pub fn close(&self) -> bool {
        self.advance(SessionState::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.get() == SessionState::Closed
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        let state = StateCell::new();
        assert_eq!(state.get(), SessionState::Idle);

        assert!(state.advance(SessionState::Dialing));
        assert!(state.advance(SessionState::Handshaking));
        assert!(!state.advance(SessionState::Dialing));
        assert!(state.advance(SessionState::Connected));
        assert_eq!(state.get(), SessionState::Connected);

        assert!(state.close());
        assert!(!state.close());
        assert!(!state.advance(SessionState::Connected));
        assert!(state.is_closed());
    }
}
