//! 错误类型定义

use thiserror::Error;

/// 走子层错误
///
/// 这些错误都是可恢复的：状态机拒绝走子但不改变任何状态。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// 无法解析的走子记号
    #[error("Malformed move token `{token}`: {reason}")]
    MalformedToken { token: String, reason: String },

    /// 当前局面下不合法的走法（含升变补全重试之后）
    #[error("Illegal move `{token}` in current position")]
    IllegalMove { token: String },

    /// 不是你的回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 对局已结束
    #[error("Game is already over")]
    GameOver,
}

/// 协议/传输层错误
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 收到非 UTF-8 文本
    #[error("Invalid UTF-8 text on the wire")]
    InvalidText,

    /// 无效的 FEN 字符串
    #[error("Invalid FEN string: {reason}")]
    InvalidFen { reason: String },

    /// 走子层错误
    #[error("Move error: {0}")]
    Move(#[from] MoveError),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
