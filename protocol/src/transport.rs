//! 传输层抽象
//!
//! 提供 Connector/Connection/Listener traits 使上层会话与具体传输实现解耦，
//! 以及长度前缀帧的读写器。
//!
//! 帧格式: `[4 字节大端长度][长度个字节的 UTF-8 JSON 负载]`

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{ProtocolError, Result};
use crate::{CONNECT_TIMEOUT, FRAME_HEADER_SIZE, MAX_FRAME_SIZE};

/// 连接抽象 trait（核心抽象，用于会话层）
#[async_trait]
pub trait Connection: Send + Sync {
    /// 发送消息
    async fn send<M: Serialize + Send + Sync>(&mut self, msg: &M) -> Result<()>;

    /// 接收消息
    async fn recv<M: DeserializeOwned>(&mut self) -> Result<M>;

    /// 获取远端地址
    fn peer_addr(&self) -> Option<String>;
}

/// 连接器 trait（加入方使用）
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// 建立连接
    async fn connect(&self, addr: &str) -> Result<Self::Conn>;
}

/// 监听器 trait（主机使用）
#[async_trait]
pub trait Listener: Send + Sync + Sized {
    type Conn: Connection;

    /// 绑定地址
    async fn bind(addr: &str) -> Result<Self>;

    /// 接受连接
    async fn accept(&mut self) -> Result<Self::Conn>;

    /// 获取本地地址
    fn local_addr(&self) -> Option<String>;
}

// ============================================================================
// TCP 实现
// ============================================================================

/// TCP 连接器
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
    max_frame_size: usize,
}

impl TcpConnector {
    /// 指定连接超时与最大帧大小
    pub fn new(connect_timeout: Duration, max_frame_size: usize) -> Self {
        Self {
            connect_timeout,
            max_frame_size,
        }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(CONNECT_TIMEOUT, MAX_FRAME_SIZE)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Conn = TcpConnection;

    async fn connect(&self, addr: &str) -> Result<Self::Conn> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::ConnectionTimeout)?
            .map_err(ProtocolError::Io)?;

        TcpConnection::with_max_frame_size(stream, self.max_frame_size)
    }
}

/// TCP 连接
pub struct TcpConnection {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
    peer_addr: Option<String>,
}

impl TcpConnection {
    /// 从 TcpStream 创建，并指定最大帧大小
    pub fn with_max_frame_size(stream: TcpStream, max_frame_size: usize) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: FrameReader::new(read_half).max_frame_size(max_frame_size),
            writer: FrameWriter::new(write_half).max_frame_size(max_frame_size),
            peer_addr,
        })
    }

    /// 分离读写端
    pub fn split(self) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
        (self.reader, self.writer)
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn send<M: Serialize + Send + Sync>(&mut self, msg: &M) -> Result<()> {
        self.writer.write_frame(msg).await
    }

    async fn recv<M: DeserializeOwned>(&mut self) -> Result<M> {
        self.reader.read_frame().await
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

/// TCP 监听器
pub struct TcpListener {
    listener: tokio::net::TcpListener,
    max_frame_size: usize,
}

impl TcpListener {
    /// 指定接受的连接所用的最大帧大小
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }
}

#[async_trait]
impl Listener for TcpListener {
    type Conn = TcpConnection;

    async fn bind(addr: &str) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ProtocolError::Io)?;
        Ok(Self {
            listener,
            max_frame_size: MAX_FRAME_SIZE,
        })
    }

    async fn accept(&mut self) -> Result<Self::Conn> {
        let (stream, _addr) = self.listener.accept().await.map_err(ProtocolError::Io)?;
        TcpConnection::with_max_frame_size(stream, self.max_frame_size)
    }

    fn local_addr(&self) -> Option<String> {
        self.listener.local_addr().ok().map(|a| a.to_string())
    }
}

// ============================================================================
// 帧编解码
// ============================================================================

/// 将负载编码为一帧（长度前缀 + 负载）
pub fn encode_frame(payload: &[u8], max: usize) -> Result<Vec<u8>> {
    if payload.len() > max || payload.len() > u32::MAX as usize {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len(),
            max,
        });
    }

    let length = payload.len() as u32;
    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

fn map_eof(e: std::io::Error) -> ProtocolError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::ConnectionClosed
    } else {
        ProtocolError::Io(e)
    }
}

/// 帧读取器
pub struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
    max_frame_size: usize,
}

impl<R: AsyncRead + Unpin + Send> FrameReader<R> {
    /// 创建新的帧读取器
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// 设置最大帧大小
    pub fn max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// 读取一帧的原始负载
    ///
    /// 对端在一帧完整送达前关闭时返回 `ConnectionClosed`。
    pub async fn read_payload(&mut self) -> Result<&[u8]> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        self.reader.read_exact(&mut header).await.map_err(map_eof)?;

        let length = u32::from_be_bytes(header) as usize;
        if length > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: length,
                max: self.max_frame_size,
            });
        }

        // read_exact 内部循环处理短读
        if self.buffer.len() < length {
            self.buffer.resize(length, 0);
        }
        self.reader
            .read_exact(&mut self.buffer[..length])
            .await
            .map_err(map_eof)?;

        tracing::trace!(length, "frame received");
        Ok(&self.buffer[..length])
    }

    /// 读取并解码一帧消息
    pub async fn read_frame<M: DeserializeOwned>(&mut self) -> Result<M> {
        let payload = self.read_payload().await?;
        let msg = serde_json::from_slice(payload)?;
        Ok(msg)
    }
}

/// 帧写入器
pub struct FrameWriter<W> {
    writer: W,
    max_frame_size: usize,
}

impl<W: AsyncWrite + Unpin + Send> FrameWriter<W> {
    /// 创建新的帧写入器
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// 设置最大帧大小
    pub fn max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// 写入一帧原始负载（帧头与负载一次写出）
    pub async fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        let frame = encode_frame(payload, self.max_frame_size)?;
        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;
        tracing::trace!(length = payload.len(), "frame sent");
        Ok(())
    }

    /// 编码并写入一帧消息
    pub async fn write_frame<M: Serialize>(&mut self, msg: &M) -> Result<()> {
        let payload = serde_json::to_vec(msg)?;
        self.write_payload(&payload).await
    }

    /// 关闭写端
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::{Color, Move};

    #[tokio::test]
    async fn test_tcp_connection() {
        // 启动监听
        let mut listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // 加入方连接
        let client_handle = tokio::spawn(async move {
            let connector = TcpConnector::default();
            let mut conn = connector.connect(&addr).await.unwrap();

            let msg: Message = conn.recv().await.unwrap();
            assert_eq!(msg, Message::Handshake { color: Color::White });

            conn.send(&Message::Move { mv: Move::new(2, 3) })
                .await
                .unwrap();
        });

        // 主机接受连接
        let mut conn = listener.accept().await.unwrap();
        assert!(conn.peer_addr().is_some());

        conn.send(&Message::Handshake { color: Color::White })
            .await
            .unwrap();

        let msg: Message = conn.recv().await.unwrap();
        assert_eq!(msg, Message::Move { mv: Move::new(2, 3) });

        client_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_payload_round_trip() {
        let (a, b) = tokio::io::duplex(64);
        let mut writer = FrameWriter::new(a);
        let mut reader = FrameReader::new(b);

        let payloads: Vec<Vec<u8>> = vec![
            b"{}".to_vec(),
            Vec::new(),
            vec![0xff; 1000],
            "中文负载".as_bytes().to_vec(),
        ];

        let expected = payloads.clone();
        let write_task = tokio::spawn(async move {
            for p in &payloads {
                writer.write_payload(p).await.unwrap();
            }
        });

        for p in &expected {
            assert_eq!(reader.read_payload().await.unwrap(), &p[..]);
        }
        write_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_short_reads_are_assembled() {
        let (mut a, b) = tokio::io::duplex(4);
        let mut reader = FrameReader::new(b);

        let frame = encode_frame(br#"{"type":"move","move":[1,2]}"#, MAX_FRAME_SIZE).unwrap();
        let write_task = tokio::spawn(async move {
            for chunk in frame.chunks(3) {
                a.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let msg: Message = reader.read_frame().await.unwrap();
        assert_eq!(msg, Message::Move { mv: Move::new(1, 2) });
        write_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_eof_mid_frame() {
        let (mut a, b) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(b);

        // 声明 10 字节却只写 3 字节后关闭
        a.write_all(&10u32.to_be_bytes()).await.unwrap();
        a.write_all(b"abc").await.unwrap();
        drop(a);

        assert!(matches!(
            reader.read_payload().await,
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_clean_eof() {
        let (a, b) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(b);
        drop(a);

        assert!(matches!(
            reader.read_payload().await,
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut a, b) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(b).max_frame_size(16);

        a.write_all(&1000u32.to_be_bytes()).await.unwrap();

        assert!(matches!(
            reader.read_payload().await,
            Err(ProtocolError::FrameTooLarge { size: 1000, max: 16 })
        ));

        let (a, _b) = tokio::io::duplex(64);
        let mut writer = FrameWriter::new(a).max_frame_size(4);
        assert!(matches!(
            writer.write_payload(b"too long").await,
            Err(ProtocolError::FrameTooLarge { size: 8, max: 4 })
        ));
    }

    #[tokio::test]
    async fn test_frame_size_boundary() {
        let (a, b) = tokio::io::duplex(512);
        let mut writer = FrameWriter::new(a).max_frame_size(128);
        let mut reader = FrameReader::new(b).max_frame_size(128);

        // 恰好等于上限的负载可以收发
        let payload = vec![b'x'; 128];
        writer.write_payload(&payload).await.unwrap();
        assert_eq!(reader.read_payload().await.unwrap(), &payload[..]);

        // 超出一个字节时写端拒绝，且不写出任何字节
        assert!(matches!(
            writer.write_payload(&[b'x'; 129]).await,
            Err(ProtocolError::FrameTooLarge { size: 129, max: 128 })
        ));

        writer.write_payload(b"{}").await.unwrap();
        assert_eq!(reader.read_payload().await.unwrap(), b"{}");
    }

    #[test]
    fn test_encode_frame_header() {
        let frame = encode_frame(b"hello", MAX_FRAME_SIZE).unwrap();
        assert_eq!(&frame[..4], &[0, 0, 0, 5]);
        assert_eq!(&frame[4..], b"hello");
    }
}
