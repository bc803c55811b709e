//! Chess960 初始局面生成
//!
//! 采用 Scharnagl 编号（0..960）解码出底线排列：
//! 先放双象（异色格）、再放皇后、再从剩余空位里取两格放马，
//! 最后三个空位依次放 车-王-车。编号 518 即标准初始排列。
//! 排列由主机随机抽取，经初始 FEN 告知对方。

use rand::Rng;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess};

use protocol::{ProtocolError, CHESS960_POSITIONS};

/// 随机抽取一个 Chess960 初始局面
pub fn random_chess960() -> Result<(u16, Chess), ProtocolError> {
    let n = rand::thread_rng().gen_range(0..CHESS960_POSITIONS);
    Ok((n, chess960_position(n)?))
}

/// 按 Scharnagl 编号构造初始局面（编号对 960 取模）
pub fn chess960_position(n: u16) -> Result<Chess, ProtocolError> {
    let rank: String = backrank(n).iter().collect();
    let fen = format!(
        "{}/pppppppp/8/8/8/8/PPPPPPPP/{} w KQkq - 0 1",
        rank,
        rank.to_uppercase()
    );

    fen.parse::<Fen>()
        .map_err(|e| ProtocolError::InvalidFen {
            reason: e.to_string(),
        })?
        .into_position::<Chess>(CastlingMode::Chess960)
        .map_err(|e| ProtocolError::InvalidFen {
            reason: e.to_string(),
        })
}

/// 解码 Scharnagl 编号为底线排列（小写棋子字母，a 线到 h 线）
fn backrank(n: u16) -> [char; 8] {
    let n = (n % CHESS960_POSITIONS) as i32;

    let (n, bw) = (n / 4, n % 4);
    let (n, bb) = (n / 4, n % 4);
    let (n, q) = (n / 6, n % 6);

    // n ∈ 0..10 编码五个空位中马的位置组合 (n1, n2)，按字典序枚举
    let mut pair = (0, 1);
    for n1 in 0..4 {
        let n2 = n + (3 - n1) * (4 - n1) / 2 - 5;
        if n1 < n2 && (1..=4).contains(&n2) {
            pair = (n1 as usize, n2 as usize);
            break;
        }
    }
    let (n1, n2) = pair;

    let mut rank = [' '; 8];
    // 双象：亮格 b/d/f/h，暗格 a/c/e/g
    rank[(bw * 2 + 1) as usize] = 'b';
    rank[(bb * 2) as usize] = 'b';

    // 皇后放在第 q 个空位
    let free = free_files(&rank);
    rank[free[q as usize]] = 'q';

    // 双马放在剩余空位的第 n1、n2 个
    let free = free_files(&rank);
    rank[free[n1]] = 'n';
    rank[free[n2]] = 'n';

    // 余下三格依次 车-王-车，保证王在双车之间
    let free = free_files(&rank);
    rank[free[0]] = 'r';
    rank[free[1]] = 'k';
    rank[free[2]] = 'r';

    rank
}

fn free_files(rank: &[char; 8]) -> Vec<usize> {
    (0..8).filter(|&i| rank[i] == ' ').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scharnagl_518_is_standard() {
        let rank: String = backrank(518).iter().collect();
        assert_eq!(rank, "rnbqkbnr");

        let pos = chess960_position(518).unwrap();
        let fen = Fen::from_position(&pos, shakmaty::EnPassantMode::Legal).to_string();
        assert!(fen.starts_with("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"));
    }

    #[test]
    fn test_all_positions_well_formed() {
        for n in 0..CHESS960_POSITIONS {
            let rank = backrank(n);

            // 每种棋子数量正确
            let count = |c| rank.iter().filter(|&&x| x == c).count();
            assert_eq!(count('b'), 2, "position {n}");
            assert_eq!(count('n'), 2, "position {n}");
            assert_eq!(count('r'), 2, "position {n}");
            assert_eq!(count('q'), 1, "position {n}");
            assert_eq!(count('k'), 1, "position {n}");

            // 双象异色格
            let bishops: Vec<usize> = (0..8).filter(|&i| rank[i] == 'b').collect();
            assert_ne!(bishops[0] % 2, bishops[1] % 2, "position {n}");

            // 王在双车之间
            let rooks: Vec<usize> = (0..8).filter(|&i| rank[i] == 'r').collect();
            let king = (0..8).find(|&i| rank[i] == 'k').unwrap();
            assert!(rooks[0] < king && king < rooks[1], "position {n}");

            // 能被规则引擎以 Chess960 城堡模式接受
            chess960_position(n).unwrap();
        }
    }

    #[test]
    fn test_positions_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for n in 0..CHESS960_POSITIONS {
            seen.insert(backrank(n));
        }
        assert_eq!(seen.len(), CHESS960_POSITIONS as usize);
    }
}
