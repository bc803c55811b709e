//! 传输层抽象
//!
//! 提供 Connector/Connection/Listener traits 使上层逻辑与具体传输实现解耦。
//! 线上格式是裸 UTF-8 文本：首条消息为 FEN 字符串（主机 → 客户端，仅一次），
//! 之后每条消息为一个走子记号。没有帧头、没有序号，消息边界与顺序完全
//! 依赖 TCP 流按序送达且单条消息不被拆分 —— 这是有意保留的非目标。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::constants::READ_BUF_SIZE;
use crate::error::{ProtocolError, Result};

/// 本端在会话中的角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerRole {
    /// 监听方（执白，棋盘不翻转）
    Host,
    /// 连接方（执黑，棋盘翻转）
    Client,
}

/// 网络配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
}

impl NetworkConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_PORT,
        }
    }
}

/// 连接抽象 trait（核心抽象，用于业务层）
#[async_trait]
pub trait Connection: Send + Sync {
    /// 发送一条文本消息
    async fn send_text(&mut self, text: &str) -> Result<()>;

    /// 接收一条文本消息
    async fn recv_text(&mut self) -> Result<String>;

    /// 获取远端地址
    fn peer_addr(&self) -> Option<String>;
}

/// 连接器 trait（连接方使用）
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// 建立连接
    async fn connect(&self, addr: &str) -> Result<Self::Conn>;
}

/// 监听器 trait（监听方使用）
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
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Conn = TcpConnection;

    async fn connect(&self, addr: &str) -> Result<Self::Conn> {
        // 刻意不加连接超时：源程序的 connect/accept 可以无限期阻塞
        let stream = TcpStream::connect(addr).await.map_err(ProtocolError::Io)?;
        TcpConnection::from_stream(stream)
    }
}

/// TCP 连接
pub struct TcpConnection {
    reader: TokenReader<OwnedReadHalf>,
    writer: TokenWriter<OwnedWriteHalf>,
    peer_addr: Option<String>,
}

impl TcpConnection {
    /// 从 TcpStream 创建（监听方使用）
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: TokenReader::new(read_half),
            writer: TokenWriter::new(write_half),
            peer_addr,
        })
    }

    /// 分离读写端（后台接收循环持有读端，主逻辑持有写端）
    pub fn split(self) -> (TokenReader<OwnedReadHalf>, TokenWriter<OwnedWriteHalf>) {
        (self.reader, self.writer)
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn send_text(&mut self, text: &str) -> Result<()> {
        self.writer.send_text(text).await
    }

    async fn recv_text(&mut self) -> Result<String> {
        self.reader.recv_text().await
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

/// TCP 监听器
pub struct TcpListener {
    listener: tokio::net::TcpListener,
}

#[async_trait]
impl Listener for TcpListener {
    type Conn = TcpConnection;

    async fn bind(addr: &str) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ProtocolError::Io)?;
        Ok(Self { listener })
    }

    async fn accept(&mut self) -> Result<Self::Conn> {
        let (stream, _addr) = self.listener.accept().await.map_err(ProtocolError::Io)?;
        TcpConnection::from_stream(stream)
    }

    fn local_addr(&self) -> Option<String> {
        self.listener.local_addr().ok().map(|a| a.to_string())
    }
}

// ============================================================================
// 文本消息读写
// ============================================================================

/// 文本消息读取器
///
/// 一次 read 得到的字节即一条消息（源协议无帧结构）。
pub struct TokenReader<R> {
    reader: R,
    buffer: [u8; READ_BUF_SIZE],
}

impl<R: AsyncRead + Unpin + Send> TokenReader<R> {
    /// 创建新的读取器
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: [0u8; READ_BUF_SIZE],
        }
    }

    /// 阻塞接收一条文本消息
    pub async fn recv_text(&mut self) -> Result<String> {
        let n = self
            .reader
            .read(&mut self.buffer)
            .await
            .map_err(ProtocolError::Io)?;

        if n == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }
        tracing::trace!("收到 {} 字节", n);

        std::str::from_utf8(&self.buffer[..n])
            .map(|s| s.to_string())
            .map_err(|_| ProtocolError::InvalidText)
    }
}

/// 文本消息写入器
pub struct TokenWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> TokenWriter<W> {
    /// 创建新的写入器
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 发送一条文本消息
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_text_roundtrip() {
        // 启动监听
        let mut listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // 客户端连接
        let client_handle = tokio::spawn(async move {
            let connector = TcpConnector;
            let mut conn = connector.connect(&addr).await.unwrap();

            // 首条消息：FEN
            let fen = conn.recv_text().await.unwrap();
            assert!(fen.starts_with("rnbqkbnr/"));

            // 回发一个走子记号
            conn.send_text("e7e5").await.unwrap();
        });

        // 服务端接受连接
        let mut conn = listener.accept().await.unwrap();

        conn.send_text("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .await
            .unwrap();

        let token = conn.recv_text().await.unwrap();
        assert_eq!(token, "e7e5");

        client_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_peer_read() {
        let mut listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client_handle = tokio::spawn(async move {
            let connector = TcpConnector;
            let conn = connector.connect(&addr).await.unwrap();
            // 立即断开
            drop(conn);
        });

        let mut conn = listener.accept().await.unwrap();
        client_handle.await.unwrap();

        match conn.recv_text().await {
            Err(ProtocolError::ConnectionClosed) => {}
            other => panic!("Expected ConnectionClosed, got {:?}", other.map(|_| ())),
        }
    }
}
