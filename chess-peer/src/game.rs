//! 回合状态机
//!
//! 本进程独占持有一份棋盘；双方各自的棋盘通过消息交换保持收敛：
//! 对同一有序走子序列，两端局面必然一致。状态机是回合归属的唯一权威，
//! UI 层的"轮到我了"判断只是它的镜像，不能绕过这里的守卫。

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position, Role, Square};
use tracing::debug;

use protocol::codec::{self, RawMove};
use protocol::{MoveError, PeerRole, ProtocolError};

/// 状态机所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 等待本地走子
    AwaitingLocalMove,
    /// 等待对方走子
    AwaitingRemoteMove,
    /// 对局结束
    GameOver,
}

/// 走子来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOrigin {
    Local,
    Remote,
}

/// 终局通告
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// 将杀，胜者为刚走完这步的一方
    Checkmate { winner: Color },
}

/// 初始局面模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Standard,
    Chess960,
}

/// 渲染层使用的只读快照
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// 当前局面
    pub position: Chess,
    /// 最近一步（用于高亮）
    pub last_move: Option<RawMove>,
    /// 被将军的王所在格（无将军则为 None）
    pub check: Option<Square>,
    /// 本端视角是否翻转棋盘（连接方执黑，翻转）
    pub flipped: bool,
    /// 当前阶段
    pub phase: Phase,
    /// 终局通告
    pub outcome: Option<GameOutcome>,
}

/// 对局状态机
#[derive(Debug, Clone)]
pub struct Game {
    position: Chess,
    phase: Phase,
    local_color: Color,
    flipped: bool,
    last_move: Option<RawMove>,
    check: Option<Square>,
    outcome: Option<GameOutcome>,
}

impl Game {
    /// 从给定局面创建对局
    ///
    /// 监听方执白不翻转，连接方执黑翻转；初始阶段由局面的走子方决定。
    pub fn new(position: Chess, role: PeerRole) -> Self {
        let local_color = match role {
            PeerRole::Host => Color::White,
            PeerRole::Client => Color::Black,
        };
        let phase = if position.turn() == local_color {
            Phase::AwaitingLocalMove
        } else {
            Phase::AwaitingRemoteMove
        };
        Self {
            position,
            phase,
            local_color,
            flipped: role == PeerRole::Client,
            last_move: None,
            check: None,
            outcome: None,
        }
    }

    /// 标准初始局面
    pub fn standard(role: PeerRole) -> Self {
        Self::new(Chess::default(), role)
    }

    /// 从 FEN 字符串创建（连接方收到主机发来的初始局面时使用）
    pub fn from_fen(fen: &str, chess960: bool, role: PeerRole) -> Result<Self, ProtocolError> {
        let mode = if chess960 {
            CastlingMode::Chess960
        } else {
            CastlingMode::Standard
        };
        let position = fen
            .trim()
            .parse::<Fen>()
            .map_err(|e| ProtocolError::InvalidFen {
                reason: e.to_string(),
            })?
            .into_position::<Chess>(mode)
            .map_err(|e| ProtocolError::InvalidFen {
                reason: e.to_string(),
            })?;
        Ok(Self::new(position, role))
    }

    /// 当前局面的 FEN 串
    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 应用一步走子
    ///
    /// 全部校验通过后才改变任何状态；任何拒绝路径都不触碰棋盘。
    /// 对不带升变后缀而又不合法的走子，按补全皇后升变重试一次
    /// （UI 省略必填升变子时的恢复路径）。
    pub fn apply_move(&mut self, token: &str, origin: MoveOrigin) -> Result<Snapshot, MoveError> {
        match (self.phase, origin) {
            (Phase::GameOver, _) => return Err(MoveError::GameOver),
            (Phase::AwaitingLocalMove, MoveOrigin::Remote)
            | (Phase::AwaitingRemoteMove, MoveOrigin::Local) => {
                return Err(MoveError::NotYourTurn);
            }
            (Phase::AwaitingLocalMove, MoveOrigin::Local)
            | (Phase::AwaitingRemoteMove, MoveOrigin::Remote) => {}
        }

        let raw = codec::decode(token)?;
        let (mv, played) = self.resolve(raw, token)?;

        self.position.play_unchecked(mv);
        self.last_move = Some(played);
        self.check = if self.position.is_check() {
            self.position.board().king_of(self.position.turn())
        } else {
            None
        };

        if self.position.is_checkmate() {
            // 胜者是刚走完这步的一方，即现在不该走的一方
            let winner = !self.position.turn();
            debug!("将杀，胜者 {:?}", winner);
            self.phase = Phase::GameOver;
            self.outcome = Some(GameOutcome::Checkmate { winner });
        } else {
            self.phase = match origin {
                MoveOrigin::Local => Phase::AwaitingRemoteMove,
                MoveOrigin::Remote => Phase::AwaitingLocalMove,
            };
        }

        Ok(self.snapshot())
    }

    /// 在当前局面下解析出合法走法，带皇后升变补全
    fn resolve(
        &self,
        raw: RawMove,
        token: &str,
    ) -> Result<(shakmaty::Move, RawMove), MoveError> {
        let illegal = || MoveError::IllegalMove {
            token: token.to_string(),
        };

        match raw.to_uci().to_move(&self.position) {
            Ok(mv) => Ok((mv, raw)),
            Err(_) if raw.promotion.is_none() => {
                let retry = raw.with_promotion(Role::Queen);
                match retry.to_uci().to_move(&self.position) {
                    Ok(mv) => {
                        debug!("走子 {} 按皇后升变补全", token);
                        Ok((mv, retry))
                    }
                    Err(_) => Err(illegal()),
                }
            }
            Err(_) => Err(illegal()),
        }
    }

    /// 生成只读快照
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            position: self.position.clone(),
            last_move: self.last_move,
            check: self.check,
            flipped: self.flipped,
            phase: self.phase,
            outcome: self.outcome,
        }
    }
}
