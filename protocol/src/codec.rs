//! 走子记号编解码
//!
//! 坐标记号格式（UCI 风格）：`<起点列><起点行><终点列><终点行>[升变子]`，
//! 例如 `e2e4`、`e7e8q`。解析是纯词法的，不依赖任何棋盘状态；
//! 记号是否构成合法走法由规则引擎在局面上下文中判定。

use shakmaty::uci::UciMove;
use shakmaty::{File, Rank, Role, Square};

use crate::constants::{MAX_TOKEN_LEN, MIN_TOKEN_LEN};
use crate::error::MoveError;

/// 词法层面的走子：起点格、终点格、可选升变子
///
/// 只有相对某个具体局面时才有"合法"可言。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl RawMove {
    /// 替换升变子（用于后补皇后升变的重试路径）
    pub fn with_promotion(self, role: Role) -> Self {
        Self {
            promotion: Some(role),
            ..self
        }
    }

    /// 转为规则引擎的 UCI 走子表示
    pub fn to_uci(self) -> UciMove {
        UciMove::Normal {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

/// 解析走子记号
pub fn decode(token: &str) -> Result<RawMove, MoveError> {
    let malformed = |reason: &str| MoveError::MalformedToken {
        token: token.to_string(),
        reason: reason.to_string(),
    };

    if !token.is_ascii() {
        return Err(malformed("non-ASCII input"));
    }
    if token.len() < MIN_TOKEN_LEN || token.len() > MAX_TOKEN_LEN {
        return Err(malformed("expected 4 or 5 characters"));
    }

    let chars: Vec<char> = token.chars().collect();
    let from = parse_square(chars[0], chars[1]).ok_or_else(|| malformed("bad origin square"))?;
    let to = parse_square(chars[2], chars[3]).ok_or_else(|| malformed("bad destination square"))?;

    let promotion = match chars.get(4) {
        None => None,
        Some(&c) => match c {
            'q' => Some(Role::Queen),
            'r' => Some(Role::Rook),
            'b' => Some(Role::Bishop),
            'n' => Some(Role::Knight),
            _ => return Err(malformed("bad promotion piece")),
        },
    };

    Ok(RawMove {
        from,
        to,
        promotion,
    })
}

/// 生成走子记号，decode 的逆操作
pub fn encode(mv: &RawMove) -> String {
    match mv.promotion {
        Some(role) => format!("{}{}{}", mv.from, mv.to, role.char()),
        None => format!("{}{}", mv.from, mv.to),
    }
}

fn parse_square(file: char, rank: char) -> Option<Square> {
    let file = File::from_char(file)?;
    let rank = Rank::from_char(rank)?;
    Some(Square::from_coords(file, rank))
}
