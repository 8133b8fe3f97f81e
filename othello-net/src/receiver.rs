//! 后台接收任务
//!
//! 持续读取帧并分类：走法放入信箱，对局结束通知记录后退出，
//! 无法解码的帧记录后跳过，读失败则标记会话关闭。

use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use protocol::{FrameReader, Message};

use crate::error::NetError;
use crate::session::Shared;

/// 把一帧负载解码为消息
pub(crate) fn decode_message(payload: &[u8]) -> Result<Message, NetError> {
    Message::from_bytes(payload).map_err(|e| NetError::FrameDecode(e.into()))
}

/// 接收循环，会话建立后启动一次
pub(crate) async fn run<R>(mut reader: FrameReader<R>, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin + Send,
{
    loop {
        let decoded = match reader.read_payload().await {
            Ok(payload) => decode_message(payload),
            Err(e) => {
                if shared.state.is_closed() {
                    debug!("receiver stopped after session close");
                } else {
                    warn!(error = %e, "connection lost, closing session");
                    shared.mark_closed();
                }
                return;
            }
        };

        match decoded {
            Ok(Message::Move { mv }) => {
                info!(%mv, "received opponent move");
                if let Some(replaced) = shared.mailbox.deposit(mv) {
                    warn!(%replaced, "unconsumed opponent move overwritten");
                }
            }
            Ok(Message::GameOver { message }) => {
                info!(%message, "game over");
                shared.record_game_over(message);
                return;
            }
            Ok(other) => {
                warn!(kind = other.kind(), "unexpected message after handshake, ignored");
            }
            Err(e) => {
                warn!(error = %e, "ignoring undecodable frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use protocol::{encode_frame, Move, MAX_FRAME_SIZE};
    use tokio::io::AsyncWriteExt;

    use crate::mailbox::WaitOutcome;

    fn frame(payload: &[u8]) -> Vec<u8> {
        encode_frame(payload, MAX_FRAME_SIZE).unwrap()
    }

    #[tokio::test]
    async fn test_skips_bogus_frames() {
        let (mut peer, local) = tokio::io::duplex(256);
        let shared = Arc::new(Shared::new());
        let task = tokio::spawn(run(FrameReader::new(local), Arc::clone(&shared)));

        peer.write_all(&frame(br#"{"type":"bogus"}"#)).await.unwrap();
        peer.write_all(&frame(b"\xff\xfe")).await.unwrap();
        peer.write_all(&frame(br#"{"type":"move","move":[2,3]}"#))
            .await
            .unwrap();

        let waiter = Arc::clone(&shared);
        let outcome = tokio::task::spawn_blocking(move || waiter.mailbox.wait(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Received(Move::new(2, 3)));
        assert!(!shared.state.is_closed());

        drop(peer);
        task.await.unwrap();
        assert!(shared.state.is_closed());
        assert!(shared.mailbox.is_closed());
    }

    #[tokio::test]
    async fn test_game_over_stops_loop() {
        let (mut peer, local) = tokio::io::duplex(256);
        let shared = Arc::new(Shared::new());
        let task = tokio::spawn(run(FrameReader::new(local), Arc::clone(&shared)));

        peer.write_all(&frame(br#"{"type":"game_over","message":"resigned"}"#))
            .await
            .unwrap();
        task.await.unwrap();

        assert_eq!(shared.game_over_message().as_deref(), Some("resigned"));
        // 对局结束不关闭会话，也不唤醒等待者
        assert!(!shared.state.is_closed());
        assert!(!shared.mailbox.is_closed());
    }

    #[tokio::test]
    async fn test_oversized_header_closes_session() {
        let (mut peer, local) = tokio::io::duplex(256);
        let shared = Arc::new(Shared::new());

        let waiter = Arc::clone(&shared);
        let wait_task = tokio::task::spawn_blocking(move || {
            let start = std::time::Instant::now();
            (waiter.mailbox.wait(Duration::from_secs(30)), start.elapsed())
        });

        let task = tokio::spawn(run(
            FrameReader::new(local).max_frame_size(16),
            Arc::clone(&shared),
        ));
        peer.write_all(&1000u32.to_be_bytes()).await.unwrap();
        task.await.unwrap();

        // 对端仍未断开，关闭只因帧头超限
        assert!(shared.state.is_closed());
        assert!(shared.mailbox.is_closed());

        let (outcome, elapsed) = wait_task.await.unwrap();
        assert_eq!(outcome, WaitOutcome::Closed);
        assert!(elapsed < Duration::from_secs(5));
        drop(peer);
    }

    #[test]
    fn test_decode_message_error() {
        assert!(matches!(
            decode_message(br#"{"type":"bogus"}"#),
            Err(NetError::FrameDecode(_))
        ));
    }
}
