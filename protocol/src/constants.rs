//! 协议常量定义

/// 默认监听/连接端口
pub const DEFAULT_PORT: u16 = 5000;

/// 单次接收缓冲区大小（一条消息不会超过一个 FEN 字符串的长度）
pub const READ_BUF_SIZE: usize = 1024;

/// 走子记号最小长度（起点格 + 终点格）
pub const MIN_TOKEN_LEN: usize = 4;

/// 走子记号最大长度（含升变后缀）
pub const MAX_TOKEN_LEN: usize = 5;

/// Chess960 起始局面总数
pub const CHESS960_POSITIONS: u16 = 960;
