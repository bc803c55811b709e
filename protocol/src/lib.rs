//! 双人对弈共享协议库
//!
//! 包含:
//! - 走子记号编解码 (RawMove, decode/encode)
//! - 错误类型 (MoveError, ProtocolError)
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - TCP 实现与文本消息读写 (TokenReader, TokenWriter)
//!
//! 棋规本身由外部规则引擎 (shakmaty) 提供，本库不做走法生成。

pub mod codec;
mod constants;
mod error;
mod transport;

pub use codec::{decode, encode, RawMove};
pub use constants::*;
pub use error::{MoveError, ProtocolError, Result};
pub use transport::{
    Connection, Connector, Listener,
    NetworkConfig, PeerRole,
    TcpConnection, TcpConnector, TcpListener,
    TokenReader, TokenWriter,
};
