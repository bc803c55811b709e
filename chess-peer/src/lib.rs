//! 点对点双人对弈端
//!
//! 包含:
//! - 回合状态机 (Game)
//! - Chess960 初始局面生成
//! - 会话建立与后台同步循环 (Session)
//! - 终端棋盘渲染 (BoardRenderer)

pub mod game;
pub mod session;
pub mod start;
pub mod ui;

pub use game::{Game, GameOutcome, MoveOrigin, Phase, Snapshot, StartMode};
pub use session::{Session, SessionEvent};
pub use ui::BoardRenderer;
